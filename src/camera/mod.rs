//! Camera model used by the overlay projector.
//!
//! The overlay assumes a single calibrated pinhole camera with Brown–Conrady
//! (radial-tangential) lens distortion, the model produced by OpenCV style
//! calibration. This module holds the shared pieces: intrinsic parameters,
//! resolution, error handling, the [`CameraModel`] trait and the YAML helpers
//! used to load a persisted calibration.
//!
//! The concrete model lives in the `rad_tan` submodule.

use nalgebra::{DMatrix, Vector2, Vector3};
use serde::{Deserialize, Serialize};

pub mod rad_tan;

pub use rad_tan::RadTanModel;

/// Represents the intrinsic parameters of a camera.
///
/// These parameters define the internal geometry of the camera,
/// including focal length and principal point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    /// The focal length along the x-axis, in pixels.
    pub fx: f64,
    /// The focal length along the y-axis, in pixels.
    pub fy: f64,
    /// The x-coordinate of the principal point (optical center), in pixels.
    pub cx: f64,
    /// The y-coordinate of the principal point (optical center), in pixels.
    pub cy: f64,
}

impl Intrinsics {
    /// Extracts the intrinsics from a 3×3 OpenCV style camera matrix.
    ///
    /// The matrix must have the layout
    ///
    /// ```text
    /// [fx  0 cx]
    /// [ 0 fy cy]
    /// [ 0  0  1]
    /// ```
    ///
    /// A dynamically sized matrix is accepted so that shape errors coming
    /// from a persisted calibration are reported instead of panicking.
    ///
    /// # Errors
    ///
    /// * [`CameraModelError::InvalidParams`] if the matrix is not 3×3, has a
    ///   non-zero skew term, or a bottom row other than `[0, 0, 1]`.
    pub fn from_camera_matrix(camera_matrix: &DMatrix<f64>) -> Result<Self, CameraModelError> {
        if camera_matrix.nrows() != 3 || camera_matrix.ncols() != 3 {
            return Err(CameraModelError::InvalidParams(format!(
                "Camera matrix must be 3x3, got {}x{}",
                camera_matrix.nrows(),
                camera_matrix.ncols()
            )));
        }

        let bottom = [
            camera_matrix[(2, 0)],
            camera_matrix[(2, 1)],
            camera_matrix[(2, 2)],
        ];
        if bottom != [0.0, 0.0, 1.0] {
            return Err(CameraModelError::InvalidParams(format!(
                "Camera matrix bottom row must be [0, 0, 1], got {bottom:?}"
            )));
        }

        if camera_matrix[(0, 1)] != 0.0 || camera_matrix[(1, 0)] != 0.0 {
            return Err(CameraModelError::InvalidParams(
                "Camera matrix with skew is not supported".to_string(),
            ));
        }

        Ok(Intrinsics {
            fx: camera_matrix[(0, 0)],
            fy: camera_matrix[(1, 1)],
            cx: camera_matrix[(0, 2)],
            cy: camera_matrix[(1, 2)],
        })
    }

    /// Maps a point on the normalized image plane to pixel coordinates.
    pub fn to_pixel(&self, normalized: &Vector2<f64>) -> Vector2<f64> {
        Vector2::new(
            self.fx * normalized.x + self.cx,
            self.fy * normalized.y + self.cy,
        )
    }
}

/// Represents the resolution of a camera image.
///
/// This struct holds the width and height of the image sensor in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resolution {
    /// The width of the image in pixels.
    pub width: u32,
    /// The height of the image in pixels.
    pub height: u32,
}

/// Defines the possible errors that can occur during camera model operations.
///
/// All of these except [`CameraModelError::PointAtCameraCenter`] are setup
/// defects: they are raised while a calibration is built or loaded, before
/// any projection happens.
#[derive(thiserror::Error, Debug)]
pub enum CameraModelError {
    /// Error indicating that a 3D point is too close to the camera center (z-coordinate is near zero)
    /// or lies behind the camera, making projection undefined.
    #[error("z is close to zero, point is at camera center")]
    PointAtCameraCenter,
    /// Error indicating that a focal length parameter (fx or fy) is not positive.
    #[error("Focal length must be positive")]
    FocalLengthMustBePositive,
    /// Error indicating that a principal point coordinate (cx or cy) is not a finite number.
    #[error("Principal point must be finite")]
    PrincipalPointMustBeFinite,
    /// Error indicating that one or more camera parameters are invalid.
    #[error("Invalid camera parameters: {0}")]
    InvalidParams(String),
    /// Error indicating a failure during YAML (de)serialization of camera parameters.
    #[error("Failed to load YAML: {0}")]
    YamlError(String),
    /// Error indicating a failure during file input/output operations.
    #[error("IO Error: {0}")]
    IOError(String),
    /// Error indicating a numerical instability during projection.
    #[error("NumericalError: {0}")]
    NumericalError(String),
}

impl From<std::io::Error> for CameraModelError {
    fn from(err: std::io::Error) -> Self {
        CameraModelError::IOError(err.to_string())
    }
}

impl From<yaml_rust::ScanError> for CameraModelError {
    fn from(err: yaml_rust::ScanError) -> Self {
        CameraModelError::YamlError(err.to_string())
    }
}

/// Validates that a 3D point's z-coordinate is positive (in front of camera).
///
/// # Examples
///
/// ```rust
/// use marker_overlay::camera::validate_point_in_front;
///
/// assert!(validate_point_in_front(1.0).is_ok());
/// assert!(validate_point_in_front(0.001).is_ok());
/// assert!(validate_point_in_front(0.0).is_err());
/// assert!(validate_point_in_front(-1.0).is_err());
/// assert!(validate_point_in_front(f64::NAN).is_err());
/// ```
pub fn validate_point_in_front(z: f64) -> Result<(), CameraModelError> {
    // Written so that NaN fails the check as well.
    if !(z >= f64::EPSILON.sqrt()) {
        return Err(CameraModelError::PointAtCameraCenter);
    }
    Ok(())
}

/// Defines the interface the projector needs from a calibrated camera.
///
/// Implementations are immutable once constructed; every constructor is
/// expected to run [`CameraModel::validate_params`] so that an invalid
/// calibration is rejected before the first projection.
pub trait CameraModel {
    /// Projects a 3D point from the camera's coordinate system to pixel coordinates.
    ///
    /// # Errors
    ///
    /// * [`CameraModelError::PointAtCameraCenter`] if the point lies on or behind
    ///   the image plane.
    /// * [`CameraModelError::NumericalError`] if the distortion model cannot be
    ///   evaluated at this point or the result is not finite.
    fn project(&self, point_3d: &Vector3<f64>) -> Result<Vector2<f64>, CameraModelError>;

    /// Loads camera parameters from a YAML file.
    fn load_from_yaml(path: &str) -> Result<Self, CameraModelError>
    where
        Self: Sized;

    /// Saves the camera model's parameters to a YAML file.
    fn save_to_yaml(&self, path: &str) -> Result<(), CameraModelError>;

    /// Validates the current camera parameters.
    fn validate_params(&self) -> Result<(), CameraModelError>;

    /// Returns the resolution of the camera.
    fn get_resolution(&self) -> Resolution;

    /// Returns the intrinsic parameters of the camera.
    fn get_intrinsics(&self) -> Intrinsics;

    /// Returns the distortion coefficients, in the model's canonical order.
    fn get_distortion(&self) -> Vec<f64>;

    /// Returns the name of the camera model.
    fn get_model_name(&self) -> &'static str;
}

/// Provides common validation functions for camera parameters.
pub mod validation {
    use super::*;

    /// Validates the intrinsic camera parameters.
    ///
    /// Checks if the focal lengths (fx, fy) are positive and if the principal
    /// point coordinates (cx, cy) are finite numbers.
    pub fn validate_intrinsics(intrinsics: &Intrinsics) -> Result<(), CameraModelError> {
        if !(intrinsics.fx > 0.0 && intrinsics.fy > 0.0)
            || !intrinsics.fx.is_finite()
            || !intrinsics.fy.is_finite()
        {
            return Err(CameraModelError::FocalLengthMustBePositive);
        }
        if !intrinsics.cx.is_finite() || !intrinsics.cy.is_finite() {
            return Err(CameraModelError::PrincipalPointMustBeFinite);
        }
        Ok(())
    }

    /// Validates that every distortion coefficient is finite.
    pub fn validate_distortion(coefficients: &[f64]) -> Result<(), CameraModelError> {
        if let Some((i, value)) = coefficients
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(CameraModelError::InvalidParams(format!(
                "Distortion coefficient {i} must be finite, got {value}"
            )));
        }
        Ok(())
    }
}

/// YAML I/O helpers for the `cam0` calibration format.
///
/// Two layouts are understood under the `cam0` node:
///
/// ```yaml
/// cam0:
///   camera_model: rad_tan
///   intrinsics: [fx, fy, cx, cy, k1, k2, p1, p2, k3]
///   resolution: [width, height]
/// ```
///
/// and the OpenCV flavoured
///
/// ```yaml
/// cam0:
///   camera_matrix: [[fx, 0, cx], [0, fy, cy], [0, 0, 1]]
///   distortion_coeffs: [k1, k2, p1, p2, k3]
///   resolution: [width, height]
/// ```
pub mod yaml_io {
    use super::*;
    use std::fs;
    use std::io::Write;
    use yaml_rust::{Yaml, YamlLoader};

    fn as_float(value: &Yaml, what: &str) -> Result<f64, CameraModelError> {
        match value {
            Yaml::Real(_) => value.as_f64(),
            Yaml::Integer(i) => Some(*i as f64),
            _ => None,
        }
        .ok_or_else(|| CameraModelError::InvalidParams(format!("Invalid {what}: not a float")))
    }

    fn parse_camera_matrix(node: &Yaml) -> Result<DMatrix<f64>, CameraModelError> {
        let rows = node.as_vec().ok_or_else(|| {
            CameraModelError::InvalidParams("'camera_matrix' must be a list of rows".to_string())
        })?;

        let row_lengths: Vec<usize> = rows
            .iter()
            .map(|row| row.as_vec().map_or(0, |r| r.len()))
            .collect();
        if rows.len() != 3 || row_lengths.iter().any(|&len| len != 3) {
            return Err(CameraModelError::InvalidParams(format!(
                "Camera matrix must be 3x3, got {} rows with lengths {:?}",
                rows.len(),
                row_lengths
            )));
        }

        let mut values = Vec::with_capacity(9);
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.as_vec().into_iter().flatten().enumerate() {
                values.push(as_float(value, &format!("camera_matrix[{r}][{c}]"))?);
            }
        }
        Ok(DMatrix::from_row_slice(3, 3, &values))
    }

    fn parse_resolution(cam_node: &Yaml) -> Result<Resolution, CameraModelError> {
        let resolution_yaml = cam_node["resolution"].as_vec().ok_or_else(|| {
            CameraModelError::InvalidParams(
                "YAML missing 'resolution' array under 'cam0'".to_string(),
            )
        })?;

        if resolution_yaml.len() < 2 {
            return Err(CameraModelError::InvalidParams(
                "Resolution array must have at least 2 elements (width, height)".to_string(),
            ));
        }

        let dimension = |value: &Yaml, what: &str| {
            value
                .as_i64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| {
                    CameraModelError::InvalidParams(format!(
                        "Invalid {what}: not a non-negative integer"
                    ))
                })
        };

        Ok(Resolution {
            width: dimension(&resolution_yaml[0], "width")?,
            height: dimension(&resolution_yaml[1], "height")?,
        })
    }

    /// Parses intrinsics, resolution and distortion coefficients from a YAML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML file
    /// * `min_intrinsics_len` - Minimum length of the flat `intrinsics` array
    ///
    /// # Returns
    ///
    /// The intrinsic parameters, the resolution and every coefficient that
    /// follows `fx, fy, cx, cy` (or the `distortion_coeffs` list in the
    /// matrix layout).
    ///
    /// # Errors
    ///
    /// Returns `CameraModelError` if the file cannot be read, the YAML does
    /// not parse, a node is missing, or a value has the wrong type or shape.
    pub fn parse_yaml_camera(
        path: &str,
        min_intrinsics_len: usize,
    ) -> Result<(Intrinsics, Resolution, Vec<f64>), CameraModelError> {
        let contents = fs::read_to_string(path)?;
        let docs = YamlLoader::load_from_str(&contents)?;

        let doc = docs.first().ok_or_else(|| {
            CameraModelError::InvalidParams("Empty YAML document".to_string())
        })?;
        let cam_node = &doc["cam0"];

        if cam_node.is_badvalue() {
            return Err(CameraModelError::InvalidParams(
                "Missing 'cam0' node in YAML".to_string(),
            ));
        }

        let resolution = parse_resolution(cam_node)?;

        if !cam_node["camera_matrix"].is_badvalue() {
            let camera_matrix = parse_camera_matrix(&cam_node["camera_matrix"])?;
            let intrinsics = Intrinsics::from_camera_matrix(&camera_matrix)?;

            let distortion = match cam_node["distortion_coeffs"].as_vec() {
                Some(values) => values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| as_float(v, &format!("distortion_coeffs[{i}]")))
                    .collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };

            return Ok((intrinsics, resolution, distortion));
        }

        let intrinsics_yaml = cam_node["intrinsics"].as_vec().ok_or_else(|| {
            CameraModelError::InvalidParams(
                "YAML missing 'intrinsics' array (or 'camera_matrix') under 'cam0'".to_string(),
            )
        })?;

        if intrinsics_yaml.len() < min_intrinsics_len {
            return Err(CameraModelError::InvalidParams(format!(
                "Intrinsics array must have at least {} elements, got {}",
                min_intrinsics_len,
                intrinsics_yaml.len()
            )));
        }

        let intrinsics = Intrinsics {
            fx: as_float(&intrinsics_yaml[0], "fx")?,
            fy: as_float(&intrinsics_yaml[1], "fy")?,
            cx: as_float(&intrinsics_yaml[2], "cx")?,
            cy: as_float(&intrinsics_yaml[3], "cy")?,
        };

        let distortion = intrinsics_yaml
            .iter()
            .enumerate()
            .skip(4)
            .map(|(i, v)| as_float(v, &format!("parameter at index {i}")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((intrinsics, resolution, distortion))
    }

    /// Saves camera model parameters to a YAML file in the flat `cam0` layout.
    ///
    /// Parent directories are created when missing.
    pub fn save_yaml_camera(
        path: &str,
        model_name: &str,
        intrinsics: &Intrinsics,
        resolution: &Resolution,
        extra_params: &[f64],
    ) -> Result<(), CameraModelError> {
        let mut intrinsics_vec = vec![intrinsics.fx, intrinsics.fy, intrinsics.cx, intrinsics.cy];
        intrinsics_vec.extend_from_slice(extra_params);

        let to_yaml = |value: serde_yaml::Result<serde_yaml::Value>| {
            value.map_err(|e| CameraModelError::YamlError(e.to_string()))
        };

        let cam0 = serde_yaml::Mapping::from_iter([
            (
                serde_yaml::Value::String("camera_model".to_string()),
                serde_yaml::Value::String(model_name.to_string()),
            ),
            (
                serde_yaml::Value::String("intrinsics".to_string()),
                to_yaml(serde_yaml::to_value(intrinsics_vec))?,
            ),
            (
                serde_yaml::Value::String("resolution".to_string()),
                to_yaml(serde_yaml::to_value(vec![resolution.width, resolution.height]))?,
            ),
        ]);
        let yaml = serde_yaml::Mapping::from_iter([(
            serde_yaml::Value::String("cam0".to_string()),
            serde_yaml::Value::Mapping(cam0),
        )]);

        let yaml_string =
            serde_yaml::to_string(&yaml).map_err(|e| CameraModelError::YamlError(e.to_string()))?;

        if let Some(parent) = std::path::Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(yaml_string.as_bytes())?;

        Ok(())
    }
}
