//! Integration tests for marker-frame projection accuracy

use approx::assert_relative_eq;
use marker_overlay::camera::{CameraModel, RadTanModel};
use marker_overlay::marker::MarkerPose;
use marker_overlay::primitives::{cube_points, Primitive, PrimitiveConfig, CUBE_EDGES};
use marker_overlay::projection::project_points;
use nalgebra::{DVector, Vector2, Vector3};
use std::f64::consts::PI;

fn pinhole() -> RadTanModel {
    let params = DVector::from_vec(vec![500.0, 500.0, 320.0, 240.0]);
    RadTanModel::new(&params).expect("Failed to create model")
}

fn facing_pose(tvec: Vector3<f64>) -> MarkerPose {
    MarkerPose::new(0, Vector2::new(320.0, 240.0), Vector3::new(PI, 0.0, 0.0), tvec)
}

#[test]
fn test_marker_origin_on_optical_axis_hits_principal_point() {
    let pinhole = pinhole();
    let calibrated = RadTanModel::load_from_yaml("samples/rad_tan.yaml")
        .expect("Failed to load model");

    let rotations = [
        Vector3::zeros(),
        Vector3::new(PI, 0.0, 0.0),
        Vector3::new(2.9, -0.3, 0.1),
    ];

    for rvec in rotations {
        let pose = MarkerPose::new(1, Vector2::zeros(), rvec, Vector3::new(0.0, 0.0, 750.0));

        let map = project_points(&[Vector3::zeros()], &pose, &pinhole).unwrap();
        let pixel = map.get(0).expect("origin should project");
        assert_relative_eq!(pixel.x, 320.0, epsilon = 1e-9);
        assert_relative_eq!(pixel.y, 240.0, epsilon = 1e-9);

        // Distortion is the identity on the optical axis.
        let map = project_points(&[Vector3::zeros()], &pose, &calibrated).unwrap();
        let pixel = map.get(0).expect("origin should project");
        let intrinsics = calibrated.get_intrinsics();
        assert_relative_eq!(pixel.x, intrinsics.cx, epsilon = 1e-9);
        assert_relative_eq!(pixel.y, intrinsics.cy, epsilon = 1e-9);
    }
}

#[test]
fn test_axis_tips_are_distinguishable() {
    let camera = pinhole();
    let pose = facing_pose(Vector3::new(30.0, 20.0, 600.0));
    let config = PrimitiveConfig::default();

    let points = Primitive::Axis.object_points(&config);
    let map = project_points(&points, &pose, &camera).unwrap();

    let origin = map.get(0).unwrap();
    let x_tip = map.get(1).unwrap();
    let y_tip = map.get(2).unwrap();
    let z_tip = map.get(3).unwrap();

    assert_relative_eq!(origin, Vector2::new(345.0, 240.0 + 50.0 / 3.0), epsilon = 1e-9);

    // X points right in the image, at the same row.
    assert!(x_tip.x > origin.x + 40.0);
    assert_relative_eq!(x_tip.y, origin.y, epsilon = 1e-9);

    // Y points up in the image, at the same column.
    assert!(y_tip.y < origin.y - 40.0);
    assert_relative_eq!(y_tip.x, origin.x, epsilon = 1e-9);

    // Z comes towards the camera, so its tip moves away from the principal point.
    let principal = Vector2::new(320.0, 240.0);
    assert!((z_tip - principal).norm() > (origin - principal).norm());
    let expected = Vector2::new(320.0 + 1500.0 / 55.0, 240.0 + 1000.0 / 55.0);
    assert_relative_eq!(z_tip, expected, epsilon = 1e-9);
}

#[test]
fn test_cube_edges_scale_with_marker_length() {
    let camera = pinhole();
    let pose = facing_pose(Vector3::new(0.0, 0.0, 900.0));

    let edge_lengths = |marker_length: f64| -> Vec<f64> {
        let map = project_points(&cube_points(marker_length), &pose, &camera).unwrap();
        CUBE_EDGES[..4]
            .iter()
            .map(|edge| {
                let (a, b) = map.segment(edge.from, edge.to).unwrap();
                (b - a).norm()
            })
            .collect()
    };

    let small = edge_lengths(40.0);
    let large = edge_lengths(80.0);

    for (s, l) in small.iter().zip(&large) {
        assert!(l > s);
        assert_relative_eq!(*l, 2.0 * s, epsilon = 1e-9);
    }
    // Fronto-parallel at depth 900: 40 units span 500 * 40 / 900 pixels.
    assert_relative_eq!(small[0], 500.0 * 40.0 / 900.0, epsilon = 1e-9);
}

#[test]
fn test_projection_matches_camera_model() {
    let camera = RadTanModel::load_from_yaml("samples/rad_tan.yaml")
        .expect("Failed to load model");
    let pose = MarkerPose::new(
        23,
        Vector2::new(471.2, 315.8),
        Vector3::new(2.9, -0.3, 0.1),
        Vector3::new(230.0, 112.0, 880.0),
    );

    let points = Primitive::Cylinder.object_points(&PrimitiveConfig::default());
    let map = project_points(&points, &pose, &camera).unwrap();
    assert_eq!(map.len(), points.len());

    for (i, point) in points.iter().enumerate() {
        let expected = camera.project(&pose.transform_point(point)).unwrap();
        assert_relative_eq!(map.get(i).unwrap(), expected, epsilon = 1e-12);
    }
}

#[test]
fn test_points_behind_camera_are_dropped_individually() {
    let camera = pinhole();
    // Cube top at 100 units towards the camera, marker only 40 away.
    let pose = facing_pose(Vector3::new(0.0, 0.0, 40.0));

    let map = project_points(&cube_points(100.0), &pose, &camera).unwrap();
    assert_eq!(map.len(), 8);
    assert_eq!(map.invalid_count(), 4);
    assert!((0..4).all(|i| map.get(i).is_some()));
    assert!((4..8).all(|i| map.get(i).is_none()));
}
