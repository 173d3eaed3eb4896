//! Wireframe primitives drawn on top of detected markers.
//!
//! Every primitive is a fixed set of model points in the marker frame plus a
//! declarative edge table (`&'static [Edge]`) that says which points are
//! joined and in which color. Drawing one primitive on one marker is always
//! the same pipeline:
//!
//! 1. look the marker up by id in the frame's detections,
//! 2. build the point set scaled by the configured marker length,
//! 3. project the whole set once,
//! 4. draw every edge by point index.
//!
//! [`OverlayRenderer`] bundles the calibrated camera and the
//! [`PrimitiveConfig`] so both are set up (and validated) once and then
//! shared by every call.

use crate::camera::CameraModel;
use crate::marker::{find_marker, MarkerPose, PoseError};
use crate::projection::project_points;
use crate::util::raster::draw_line_segment;
use image::{Rgb, RgbImage};
use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod axis;
pub mod cube;
pub mod cylinder;

pub use axis::{axis_points, AXIS_EDGES};
pub use cube::{cube_points, CUBE_EDGES};
pub use cylinder::{cylinder_points, CYLINDER_EDGES, CYLINDER_SEGMENTS};

/// A line segment between two model points, referenced by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub color: Rgb<u8>,
}

impl Edge {
    pub const fn new(from: usize, to: usize, color: Rgb<u8>) -> Self {
        Edge { from, to, color }
    }
}

/// The shapes that can be overlaid on a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Axis,
    Cube,
    Cylinder,
}

impl Primitive {
    /// All primitives in their usual composition order.
    pub const ALL: [Primitive; 3] = [Primitive::Axis, Primitive::Cube, Primitive::Cylinder];

    /// Model points in the marker frame, scaled by `config`.
    pub fn object_points(&self, config: &PrimitiveConfig) -> Vec<Vector3<f64>> {
        match self {
            Primitive::Axis => axis_points(config.marker_length * config.axis_length_ratio),
            Primitive::Cube => cube_points(config.marker_length),
            Primitive::Cylinder => cylinder_points(
                config.marker_length * config.cylinder_radius_ratio,
                config.marker_length * config.cylinder_height_ratio,
            ),
        }
    }

    /// The primitive's edge table.
    pub fn edges(&self) -> &'static [Edge] {
        match self {
            Primitive::Axis => &AXIS_EDGES,
            Primitive::Cube => &CUBE_EDGES,
            Primitive::Cylinder => &CYLINDER_EDGES,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Axis => "axis",
            Primitive::Cube => "cube",
            Primitive::Cylinder => "cylinder",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Primitive {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "axis" | "axes" => Ok(Primitive::Axis),
            "cube" => Ok(Primitive::Cube),
            "cylinder" => Ok(Primitive::Cylinder),
            other => Err(ConfigError::UnknownPrimitive(other.to_string())),
        }
    }
}

/// Widest stroke accepted by [`PrimitiveConfig::validate`], in pixels.
pub const MAX_STROKE_WIDTH: u32 = 256;

/// Errors in the overlay configuration. Raised before anything is drawn.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error(
        "stroke width must be between 1 and {max} pixels, got {0}",
        max = MAX_STROKE_WIDTH
    )]
    InvalidStrokeWidth(u32),
    #[error("unknown primitive '{0}' (expected axis, cube or cylinder)")]
    UnknownPrimitive(String),
    #[error("Failed to load YAML: {0}")]
    YamlError(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IOError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::YamlError(err.to_string())
    }
}

/// Dimensions of the overlaid primitives.
///
/// All sizes are derived from `marker_length`, expressed in the same unit as
/// the translation vectors reported by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimitiveConfig {
    /// Side length of the printed marker.
    pub marker_length: f64,
    /// Axis arm length as a fraction of the marker length.
    pub axis_length_ratio: f64,
    /// Cylinder radius as a fraction of the marker length.
    pub cylinder_radius_ratio: f64,
    /// Cylinder height as a fraction of the marker length.
    pub cylinder_height_ratio: f64,
    /// Line width in pixels.
    pub stroke_width: u32,
}

impl Default for PrimitiveConfig {
    fn default() -> Self {
        PrimitiveConfig {
            marker_length: 100.0,
            axis_length_ratio: 0.5,
            cylinder_radius_ratio: 0.5,
            cylinder_height_ratio: 1.5,
            stroke_width: 4,
        }
    }
}

impl PrimitiveConfig {
    /// Default proportions for a marker of the given side length.
    pub fn with_marker_length(marker_length: f64) -> Self {
        PrimitiveConfig {
            marker_length,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let lengths = [
            ("marker_length", self.marker_length),
            ("axis_length_ratio", self.axis_length_ratio),
            ("cylinder_radius_ratio", self.cylinder_radius_ratio),
            ("cylinder_height_ratio", self.cylinder_height_ratio),
        ];
        for (name, value) in lengths {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }
        if !(1..=MAX_STROKE_WIDTH).contains(&self.stroke_width) {
            return Err(ConfigError::InvalidStrokeWidth(self.stroke_width));
        }
        Ok(())
    }

    /// Loads and validates a configuration file. Missing keys take defaults.
    pub fn load_from_yaml(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: PrimitiveConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}

/// Result of one primitive draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    /// The primitive was rendered.
    Drawn(DrawStats),
    /// The id is not in this frame's detections; the image is untouched.
    MarkerNotFound,
    /// The marker's pose cannot be projected; the image is untouched.
    DegeneratePose(PoseError),
}

impl DrawOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, DrawOutcome::Drawn(_))
    }
}

/// Per-call edge counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Edges rasterized with at least one pixel inside the image.
    pub edges_drawn: usize,
    /// Edges with an endpoint that could not be projected.
    pub edges_skipped: usize,
    /// Edges that projected fine but fall entirely outside the image.
    pub edges_off_image: usize,
}

/// One entry of a whole-frame overlay pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawReport {
    pub marker_id: i32,
    pub primitive: Primitive,
    pub outcome: DrawOutcome,
}

/// Draws primitives for one calibrated camera.
///
/// The renderer only borrows the camera model; construct it once per
/// calibration and reuse it for every frame.
pub struct OverlayRenderer<'a, C: ?Sized + CameraModel> {
    camera: &'a C,
    config: PrimitiveConfig,
}

impl<'a, C: ?Sized + CameraModel> OverlayRenderer<'a, C> {
    /// # Errors
    ///
    /// * [`ConfigError`] if `config` fails [`PrimitiveConfig::validate`].
    pub fn new(camera: &'a C, config: PrimitiveConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "overlay renderer for {} camera, marker length {}",
            camera.get_model_name(),
            config.marker_length
        );
        Ok(OverlayRenderer { camera, config })
    }

    /// Draws the three coordinate axes of marker `marker_id`.
    pub fn draw_axis(
        &self,
        image: &mut RgbImage,
        markers: &[MarkerPose],
        marker_id: i32,
    ) -> DrawOutcome {
        self.draw(image, markers, marker_id, Primitive::Axis)
    }

    /// Draws a cube standing on marker `marker_id`.
    pub fn draw_cube(
        &self,
        image: &mut RgbImage,
        markers: &[MarkerPose],
        marker_id: i32,
    ) -> DrawOutcome {
        self.draw(image, markers, marker_id, Primitive::Cube)
    }

    /// Draws a cylinder standing on marker `marker_id`.
    pub fn draw_cylinder(
        &self,
        image: &mut RgbImage,
        markers: &[MarkerPose],
        marker_id: i32,
    ) -> DrawOutcome {
        self.draw(image, markers, marker_id, Primitive::Cylinder)
    }

    /// Draws `primitive` on marker `marker_id` if it was detected this frame.
    pub fn draw(
        &self,
        image: &mut RgbImage,
        markers: &[MarkerPose],
        marker_id: i32,
        primitive: Primitive,
    ) -> DrawOutcome {
        match find_marker(markers, marker_id) {
            Some(pose) => self.draw_on_pose(image, pose, primitive),
            None => {
                debug!("marker {marker_id} not detected, {primitive} skipped");
                DrawOutcome::MarkerNotFound
            }
        }
    }

    /// Draws `primitive` for an already resolved pose.
    pub fn draw_on_pose(
        &self,
        image: &mut RgbImage,
        pose: &MarkerPose,
        primitive: Primitive,
    ) -> DrawOutcome {
        let object_points = primitive.object_points(&self.config);
        let projections = match project_points(&object_points, pose, self.camera) {
            Ok(projections) => projections,
            Err(e) => {
                warn!("marker {}: {primitive} skipped, degenerate pose: {e}", pose.id);
                return DrawOutcome::DegeneratePose(e);
            }
        };

        let mut stats = DrawStats::default();
        for edge in primitive.edges() {
            let Some((start, end)) = projections.segment(edge.from, edge.to) else {
                stats.edges_skipped += 1;
                continue;
            };
            if draw_line_segment(image, &start, &end, edge.color, self.config.stroke_width) {
                stats.edges_drawn += 1;
            } else {
                stats.edges_off_image += 1;
            }
        }

        if stats.edges_skipped > 0 {
            debug!(
                "marker {}: {} of {} {primitive} edges skipped, {} points not projectable",
                pose.id,
                stats.edges_skipped,
                primitive.edges().len(),
                projections.invalid_count()
            );
        }
        DrawOutcome::Drawn(stats)
    }

    /// Draws `primitives`, in order, on every marker of the frame.
    ///
    /// Markers are visited in detection order; a repeated id is drawn once.
    /// A degenerate pose only affects its own marker.
    pub fn draw_all(
        &self,
        image: &mut RgbImage,
        markers: &[MarkerPose],
        primitives: &[Primitive],
    ) -> Vec<DrawReport> {
        let mut seen = Vec::with_capacity(markers.len());
        let mut reports = Vec::with_capacity(markers.len() * primitives.len());

        for marker in markers {
            if seen.contains(&marker.id) {
                continue;
            }
            seen.push(marker.id);

            for &primitive in primitives {
                reports.push(DrawReport {
                    marker_id: marker.id,
                    primitive,
                    outcome: self.draw(image, markers, marker.id, primitive),
                });
            }
        }

        let drawn = reports.iter().filter(|r| r.outcome.is_drawn()).count();
        info!(
            "overlay pass: {} markers, {drawn}/{} primitives drawn",
            seen.len(),
            reports.len()
        );
        reports
    }
}
