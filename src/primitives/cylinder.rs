//! Cylinder standing on the marker, approximated by a 12-sided prism.
//!
//! Point `k` (k < 12) lies on the base ring at angle `30° * k`, measured
//! counter-clockwise from the marker X axis; point `k + 12` is directly
//! above it on the top ring.

use super::Edge;
use image::Rgb;
use nalgebra::Vector3;

pub const CYLINDER_SEGMENTS: usize = 12;
pub const CYLINDER_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

pub const CYLINDER_EDGES: [Edge; 3 * CYLINDER_SEGMENTS] = cylinder_edges();

/// Verticals first, then the base ring, then the top ring.
const fn cylinder_edges() -> [Edge; 3 * CYLINDER_SEGMENTS] {
    let n = CYLINDER_SEGMENTS;
    let mut edges = [Edge::new(0, 0, CYLINDER_COLOR); 3 * CYLINDER_SEGMENTS];
    let mut k = 0;
    while k < n {
        let next = (k + 1) % n;
        edges[k] = Edge::new(k, k + n, CYLINDER_COLOR);
        edges[n + k] = Edge::new(k, next, CYLINDER_COLOR);
        edges[2 * n + k] = Edge::new(k + n, next + n, CYLINDER_COLOR);
        k += 1;
    }
    edges
}

pub fn cylinder_points(radius: f64, height: f64) -> Vec<Vector3<f64>> {
    let step = 360.0 / CYLINDER_SEGMENTS as f64;
    let ring: Vec<(f64, f64)> = (0..CYLINDER_SEGMENTS)
        .map(|k| {
            let angle = (k as f64 * step).to_radians();
            (radius * angle.cos(), radius * angle.sin())
        })
        .collect();

    [0.0, height]
        .iter()
        .flat_map(|&z| ring.iter().map(move |&(x, y)| Vector3::new(x, y, z)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cylinder_points() {
        let points = cylinder_points(50.0, 150.0);
        assert_eq!(points.len(), 2 * CYLINDER_SEGMENTS);

        assert_relative_eq!(points[0], Vector3::new(50.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(points[3], Vector3::new(0.0, 50.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(points[6], Vector3::new(-50.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(points[9], Vector3::new(0.0, -50.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(points[12], Vector3::new(50.0, 0.0, 150.0), epsilon = 1e-12);

        for p in &points {
            assert_relative_eq!(p.xy().norm(), 50.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_counter_clockwise_order() {
        let points = cylinder_points(1.0, 1.0);
        for k in 0..CYLINDER_SEGMENTS {
            let a = points[k];
            let b = points[(k + 1) % CYLINDER_SEGMENTS];
            // Positive z of the cross product means a CCW turn.
            assert!(a.x * b.y - a.y * b.x > 0.0);
        }
    }

    #[test]
    fn test_cylinder_edge_groups() {
        let n = CYLINDER_SEGMENTS;
        assert_eq!(CYLINDER_EDGES[0], Edge::new(0, 12, CYLINDER_COLOR));
        assert_eq!(CYLINDER_EDGES[n + n - 1], Edge::new(11, 0, CYLINDER_COLOR));
        assert_eq!(CYLINDER_EDGES[3 * n - 1], Edge::new(23, 12, CYLINDER_COLOR));
    }
}
