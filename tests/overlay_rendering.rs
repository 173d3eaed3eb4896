//! Integration tests for drawing primitives into images

use image::{Rgb, RgbImage};
use marker_overlay::camera::{CameraModel, RadTanModel};
use marker_overlay::marker::{load_markers_from_yaml, MarkerPose, PoseError};
use marker_overlay::primitives::{
    DrawOutcome, OverlayRenderer, Primitive, PrimitiveConfig, CUBE_EDGES,
};
use nalgebra::{DVector, Vector2, Vector3};
use std::f64::consts::PI;

const RED: Rgb<u8> = Rgb([255, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

fn pinhole() -> RadTanModel {
    let params = DVector::from_vec(vec![500.0, 500.0, 320.0, 240.0]);
    RadTanModel::new(&params).expect("Failed to create model")
}

fn facing_marker(id: i32, tvec: Vector3<f64>) -> MarkerPose {
    MarkerPose::new(id, Vector2::new(320.0, 240.0), Vector3::new(PI, 0.0, 0.0), tvec)
}

fn gray_frame() -> RgbImage {
    RgbImage::from_pixel(640, 480, Rgb([90, 90, 90]))
}

fn count(image: &RgbImage, color: Rgb<u8>) -> usize {
    image.pixels().filter(|p| **p == color).count()
}

#[test]
fn test_missing_marker_leaves_image_untouched() {
    let camera = pinhole();
    let renderer = OverlayRenderer::new(&camera, PrimitiveConfig::default()).unwrap();
    let markers = vec![facing_marker(3, Vector3::new(0.0, 0.0, 700.0))];

    let original = gray_frame();
    let mut image = original.clone();

    assert_eq!(renderer.draw_axis(&mut image, &markers, 99), DrawOutcome::MarkerNotFound);
    assert_eq!(renderer.draw_cube(&mut image, &markers, 99), DrawOutcome::MarkerNotFound);
    assert_eq!(
        renderer.draw_cylinder(&mut image, &[], 3),
        DrawOutcome::MarkerNotFound
    );
    assert_eq!(image, original);
}

#[test]
fn test_drawing_is_deterministic() {
    let camera = RadTanModel::load_from_yaml("samples/rad_tan.yaml").unwrap();
    let markers = load_markers_from_yaml("samples/markers.yaml").unwrap();
    let renderer = OverlayRenderer::new(&camera, PrimitiveConfig::default()).unwrap();

    let mut first = gray_frame();
    let mut second = gray_frame();
    let first_reports = renderer.draw_all(&mut first, &markers, &Primitive::ALL);
    let second_reports = renderer.draw_all(&mut second, &markers, &Primitive::ALL);

    assert_eq!(first, second);
    assert_eq!(first_reports, second_reports);
    assert_ne!(first, gray_frame());
}

#[test]
fn test_axis_colors_land_on_their_arms() {
    let camera = pinhole();
    let renderer = OverlayRenderer::new(&camera, PrimitiveConfig::default()).unwrap();
    let markers = vec![facing_marker(1, Vector3::new(0.0, 0.0, 600.0))];
    let mut image = gray_frame();

    assert!(renderer.draw_axis(&mut image, &markers, 1).is_drawn());

    // Arms of 50 units at depth 600 span about 41.7 pixels.
    assert_eq!(*image.get_pixel(350, 240), RED);
    assert_eq!(*image.get_pixel(320, 210), GREEN);
    // Nothing left of the origin or below it.
    assert_eq!(*image.get_pixel(290, 240), Rgb([90, 90, 90]));
    assert_eq!(*image.get_pixel(320, 270), Rgb([90, 90, 90]));
}

#[test]
fn test_degenerate_pose_only_affects_its_marker() {
    let camera = pinhole();
    let renderer = OverlayRenderer::new(&camera, PrimitiveConfig::default()).unwrap();

    let good = facing_marker(1, Vector3::new(-100.0, 0.0, 800.0));
    let mut bad = facing_marker(2, Vector3::new(100.0, 0.0, 800.0));
    bad.rvec.y = f64::NAN;
    let zero = facing_marker(3, Vector3::zeros());

    let mut expected = gray_frame();
    renderer.draw_all(&mut expected, std::slice::from_ref(&good), &Primitive::ALL);

    let mut image = gray_frame();
    let markers = vec![bad, good, zero];
    let reports = renderer.draw_all(&mut image, &markers, &Primitive::ALL);

    assert_eq!(reports.len(), 9);
    for report in &reports {
        match report.marker_id {
            1 => assert!(report.outcome.is_drawn()),
            2 => assert!(matches!(
                report.outcome,
                DrawOutcome::DegeneratePose(PoseError::NonFiniteRotation(_))
            )),
            3 => assert_eq!(
                report.outcome,
                DrawOutcome::DegeneratePose(PoseError::ZeroTranslation)
            ),
            id => panic!("unexpected marker {id}"),
        }
    }
    assert_eq!(image, expected);
}

#[test]
fn test_primitives_compose_on_one_marker() {
    let camera = pinhole();
    let renderer = OverlayRenderer::new(&camera, PrimitiveConfig::default()).unwrap();
    let markers = vec![facing_marker(5, Vector3::new(0.0, 0.0, 900.0))];
    let mut image = gray_frame();

    for primitive in Primitive::ALL {
        assert!(renderer.draw(&mut image, &markers, 5, primitive).is_drawn());
    }

    assert!(count(&image, RED) > 0);
    assert!(count(&image, GREEN) > 0);
    assert!(count(&image, BLUE) > 0);
}

#[test]
fn test_stroke_width_thickens_lines() {
    let camera = pinhole();
    let markers = vec![facing_marker(5, Vector3::new(0.0, 0.0, 900.0))];

    let red_pixels = |stroke_width: u32| {
        let config = PrimitiveConfig {
            stroke_width,
            ..Default::default()
        };
        let renderer = OverlayRenderer::new(&camera, config).unwrap();
        let mut image = gray_frame();
        renderer.draw_cube(&mut image, &markers, 5);
        count(&image, RED)
    };

    let thin = red_pixels(1);
    let thick = red_pixels(6);
    assert!(thin > 0);
    assert!(thick > 2 * thin);
}

#[test]
fn test_marker_outside_the_frame_counts_off_image_edges() {
    let camera = pinhole();
    let renderer = OverlayRenderer::new(&camera, PrimitiveConfig::default()).unwrap();
    // Far to the right: projects around u = 320 + 500 * 3000 / 900.
    let markers = vec![facing_marker(8, Vector3::new(3000.0, 0.0, 900.0))];
    let mut image = gray_frame();

    match renderer.draw_cube(&mut image, &markers, 8) {
        DrawOutcome::Drawn(stats) => {
            assert_eq!(stats.edges_off_image, CUBE_EDGES.len());
            assert_eq!(stats.edges_drawn, 0);
            assert_eq!(stats.edges_skipped, 0);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(image, gray_frame());
}
