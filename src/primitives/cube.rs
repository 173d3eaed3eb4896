//! Cube standing on the marker.
//!
//! Points 0..4 are the marker corners at `z = 0` in detector corner order
//! (top-left, top-right, bottom-right, bottom-left as printed); point
//! `i + 4` sits straight above point `i` at `z = marker_length`.

use super::Edge;
use image::Rgb;
use nalgebra::Vector3;

pub const CUBE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

pub const CUBE_EDGES: [Edge; 12] = [
    // bottom face
    Edge::new(0, 1, CUBE_COLOR),
    Edge::new(1, 2, CUBE_COLOR),
    Edge::new(2, 3, CUBE_COLOR),
    Edge::new(3, 0, CUBE_COLOR),
    // top face
    Edge::new(4, 5, CUBE_COLOR),
    Edge::new(5, 6, CUBE_COLOR),
    Edge::new(6, 7, CUBE_COLOR),
    Edge::new(7, 4, CUBE_COLOR),
    // verticals
    Edge::new(0, 4, CUBE_COLOR),
    Edge::new(1, 5, CUBE_COLOR),
    Edge::new(2, 6, CUBE_COLOR),
    Edge::new(3, 7, CUBE_COLOR),
];

pub fn cube_points(marker_length: f64) -> Vec<Vector3<f64>> {
    let m = marker_length / 2.0;
    let corners = [(-m, m), (m, m), (m, -m), (-m, -m)];

    [0.0, marker_length]
        .iter()
        .flat_map(|&z| corners.iter().map(move |&(x, y)| Vector3::new(x, y, z)))
        .collect()
}
