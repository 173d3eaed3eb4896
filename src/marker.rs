//! Marker detections handed over by an external fiducial detector.
//!
//! A detector (ArUco or similar) reports, per frame, one [`MarkerPose`] per
//! decoded marker: its dictionary id, the pixel centroid of its four corners,
//! and the rotation/translation that place the marker frame in the camera
//! frame. The overlay consumes these read-only and never keeps them across
//! frames.
//!
//! The marker frame follows the OpenCV ArUco convention: X to the right and
//! Y up on the printed marker, Z out of the marker plane towards the viewer.

use nalgebra::{Rotation3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::fs;

/// Errors describing a pose that cannot be used for projection.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    /// The rotation vector has a NaN or infinite component.
    #[error("rotation vector has non-finite components: {0:?}")]
    NonFiniteRotation([f64; 3]),
    /// The translation vector has a NaN or infinite component.
    #[error("translation vector has non-finite components: {0:?}")]
    NonFiniteTranslation([f64; 3]),
    /// The translation vector is zero, the marker sits on the optical center.
    #[error("translation vector is zero, marker origin is at the camera center")]
    ZeroTranslation,
}

/// Errors raised while reading or writing a detection list.
#[derive(thiserror::Error, Debug)]
pub enum MarkerIoError {
    #[error("IO Error: {0}")]
    IOError(String),
    #[error("Failed to parse markers YAML: {0}")]
    YamlError(String),
}

impl From<std::io::Error> for MarkerIoError {
    fn from(err: std::io::Error) -> Self {
        MarkerIoError::IOError(err.to_string())
    }
}

impl From<serde_yaml::Error> for MarkerIoError {
    fn from(err: serde_yaml::Error) -> Self {
        MarkerIoError::YamlError(err.to_string())
    }
}

/// One detected marker instance in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPose {
    /// Dictionary id decoded from the marker pattern.
    pub id: i32,
    /// Pixel centroid of the detected corners. Diagnostic only.
    pub center: Vector2<f64>,
    /// Axis-angle rotation (Rodrigues vector) from marker to camera frame.
    pub rvec: Vector3<f64>,
    /// Translation from marker to camera frame, in marker length units.
    pub tvec: Vector3<f64>,
}

impl MarkerPose {
    pub fn new(id: i32, center: Vector2<f64>, rvec: Vector3<f64>, tvec: Vector3<f64>) -> Self {
        MarkerPose {
            id,
            center,
            rvec,
            tvec,
        }
    }

    /// Checks that the pose can be used to project points.
    ///
    /// Any finite rotation vector is a valid axis-angle rotation, including
    /// the zero vector. The translation must be finite and non-zero.
    pub fn validate(&self) -> Result<(), PoseError> {
        if self.rvec.iter().any(|v| !v.is_finite()) {
            let [x, y, z] = [self.rvec.x, self.rvec.y, self.rvec.z];
            return Err(PoseError::NonFiniteRotation([x, y, z]));
        }
        if self.tvec.iter().any(|v| !v.is_finite()) {
            let [x, y, z] = [self.tvec.x, self.tvec.y, self.tvec.z];
            return Err(PoseError::NonFiniteTranslation([x, y, z]));
        }
        if self.tvec.iter().all(|&v| v == 0.0) {
            return Err(PoseError::ZeroTranslation);
        }
        Ok(())
    }

    /// Rotation matrix for `rvec` (Rodrigues' formula).
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_scaled_axis(self.rvec)
    }

    /// Transforms a marker-frame point into the camera frame.
    pub fn transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation() * point + self.tvec
    }
}

/// Mean of the four detected corners, the centroid reported with a detection.
pub fn centroid_from_corners(corners: &[Vector2<f64>; 4]) -> Vector2<f64> {
    corners.iter().sum::<Vector2<f64>>() / 4.0
}

/// Finds the detection for `id` in the current frame.
///
/// If the detector reported the same id more than once, the last report wins.
pub fn find_marker(markers: &[MarkerPose], id: i32) -> Option<&MarkerPose> {
    markers.iter().rev().find(|marker| marker.id == id)
}

#[derive(Serialize, Deserialize)]
struct MarkerFile {
    markers: Vec<MarkerPose>,
}

/// Loads a detection list from YAML.
///
/// ```yaml
/// markers:
///   - id: 7
///     center: [318.5, 236.0]
///     rvec: [3.1, 0.05, -0.02]
///     tvec: [-2.0, -8.0, 620.0]
/// ```
pub fn load_markers_from_yaml(path: &str) -> Result<Vec<MarkerPose>, MarkerIoError> {
    let contents = fs::read_to_string(path)?;
    let file: MarkerFile = serde_yaml::from_str(&contents)?;
    Ok(file.markers)
}

/// Writes a detection list in the layout read by [`load_markers_from_yaml`].
pub fn save_markers_to_yaml(path: &str, markers: &[MarkerPose]) -> Result<(), MarkerIoError> {
    let file = MarkerFile {
        markers: markers.to_vec(),
    };
    let yaml_string = serde_yaml::to_string(&file)?;

    if let Some(parent) = std::path::Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, yaml_string)?;
    Ok(())
}
