//! Marker Overlay Tool
//!
//! Draws axes, cubes and cylinders on the markers of one image, given the
//! camera calibration and the detections produced by a marker detector.
//!
//! Usage:
//!   cargo run --bin marker_overlay -- -i frame.png -c samples/rad_tan.yaml \
//!       -d samples/markers.yaml -o output/frame_overlay.png

use clap::Parser;
use log::info;
use marker_overlay::camera::{CameraModel, RadTanModel};
use marker_overlay::marker::{find_marker, load_markers_from_yaml};
use marker_overlay::primitives::{DrawOutcome, OverlayRenderer, Primitive, PrimitiveConfig};
use marker_overlay::util::{compute_centroid_error, load_image, save_image};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Overlay 3D wireframes on detected markers")]
struct Cli {
    /// Input image path
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Camera calibration YAML file
    #[arg(short = 'c', long)]
    calib: PathBuf,

    /// Marker detections YAML file
    #[arg(short = 'd', long)]
    detections: PathBuf,

    /// Output image path
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Overlay configuration YAML (marker length, shape ratios, stroke width)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Marker side length, overrides the configuration file
    #[arg(short = 'l', long)]
    marker_length: Option<f64>,

    /// Primitives to draw, in drawing order
    #[arg(
        short = 'p',
        long,
        value_delimiter = ',',
        default_value = "axis,cube,cylinder"
    )]
    primitives: Vec<Primitive>,

    /// Only draw on this marker id
    #[arg(long)]
    id: Option<i32>,
}

fn path_str(path: &Path) -> Result<&str, Box<dyn std::error::Error>> {
    path.to_str()
        .ok_or_else(|| format!("path is not valid UTF-8: {path:?}").into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    println!("Marker Overlay Tool");
    println!("===================");
    println!("Input: {:?}", cli.input);
    println!("Calibration: {:?}", cli.calib);
    println!("Detections: {:?}", cli.detections);
    println!("Output: {:?}", cli.output);
    println!();

    let camera = RadTanModel::load_from_yaml(path_str(&cli.calib)?)?;
    let intrinsics = camera.get_intrinsics();
    println!("✓ Loaded {} camera model", camera.get_model_name());
    println!(
        "  fx={:.2}, fy={:.2}, cx={:.2}, cy={:.2}",
        intrinsics.fx, intrinsics.fy, intrinsics.cx, intrinsics.cy
    );

    let mut config = match &cli.config {
        Some(path) => PrimitiveConfig::load_from_yaml(path_str(path)?)?,
        None => PrimitiveConfig::default(),
    };
    if let Some(marker_length) = cli.marker_length {
        config.marker_length = marker_length;
    }
    let renderer = OverlayRenderer::new(&camera, config)?;

    let markers = load_markers_from_yaml(path_str(&cli.detections)?)?;
    println!("✓ Loaded {} detections", markers.len());

    let mut image = load_image(path_str(&cli.input)?)?;
    println!("✓ Loaded input image: {}x{}", image.width(), image.height());

    let resolution = camera.get_resolution();
    let image_size = (image.width(), image.height());
    if resolution.width != 0 && image_size != (resolution.width, resolution.height) {
        println!(
            "! Image size differs from calibration resolution {}x{}",
            resolution.width, resolution.height
        );
    }

    match compute_centroid_error(&camera, &markers) {
        Ok(stats) => println!(
            "  Centroid offset: mean {:.2}px, max {:.2}px over {} markers",
            stats.mean, stats.max, stats.count
        ),
        Err(e) => println!("  Centroid offset unavailable: {e}"),
    }
    println!();

    let reports = match cli.id {
        Some(id) => {
            if find_marker(&markers, id).is_none() {
                println!("! Marker {id} not among the detections");
            }
            cli.primitives
                .iter()
                .map(|&primitive| {
                    let outcome = renderer.draw(&mut image, &markers, id, primitive);
                    (id, primitive, outcome)
                })
                .collect::<Vec<_>>()
        }
        None => renderer
            .draw_all(&mut image, &markers, &cli.primitives)
            .into_iter()
            .map(|r| (r.marker_id, r.primitive, r.outcome))
            .collect(),
    };

    for (marker_id, primitive, outcome) in &reports {
        match outcome {
            DrawOutcome::Drawn(stats) => println!(
                "  marker {marker_id:>4} {primitive:<8} drawn ({} edges, {} skipped, {} off image)",
                stats.edges_drawn, stats.edges_skipped, stats.edges_off_image
            ),
            DrawOutcome::MarkerNotFound => {
                println!("  marker {marker_id:>4} {primitive:<8} not detected")
            }
            DrawOutcome::DegeneratePose(e) => {
                println!("  marker {marker_id:>4} {primitive:<8} skipped: {e}")
            }
        }
    }

    save_image(&image, path_str(&cli.output)?)?;
    info!("{} draw calls", reports.len());
    println!();
    println!("✓ Saved overlay to: {:?}", cli.output);

    Ok(())
}
