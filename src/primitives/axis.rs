//! Coordinate axis tripod.
//!
//! Point 0 is the marker origin, points 1..=3 the tips of the X, Y and Z
//! arms. Colors follow the usual X red, Y green, Z blue convention.

use super::Edge;
use image::Rgb;
use nalgebra::Vector3;

pub const AXIS_X_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const AXIS_Y_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const AXIS_Z_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

pub const AXIS_EDGES: [Edge; 3] = [
    Edge::new(0, 1, AXIS_X_COLOR),
    Edge::new(0, 2, AXIS_Y_COLOR),
    Edge::new(0, 3, AXIS_Z_COLOR),
];

/// Origin followed by the three arm tips, each `length` from the origin.
pub fn axis_points(length: f64) -> Vec<Vector3<f64>> {
    vec![
        Vector3::zeros(),
        Vector3::new(length, 0.0, 0.0),
        Vector3::new(0.0, length, 0.0),
        Vector3::new(0.0, 0.0, length),
    ]
}
