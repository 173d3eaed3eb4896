//! Radial-Tangential (Brown–Conrady) Camera Model Implementation
//!
//! Pinhole projection followed by the radial-tangential lens distortion used by
//! OpenCV's `calibrateCamera`/`projectPoints`. Coefficients are kept in OpenCV
//! order `[k1, k2, p1, p2, k3, k4, k5, k6]`; `k4..k6` form the denominator of
//! the rational radial term and are zero for the common 5-coefficient model.
//!
//! The projection must match the convention of the calibration that produced
//! the coefficients exactly, otherwise overlays drift silently.

use crate::camera::{
    validate_point_in_front, validation, CameraModel, CameraModelError, Intrinsics, Resolution,
};
use log::info;
use nalgebra::{DMatrix, DVector, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of distortion coefficients stored by [`RadTanModel`].
pub const DISTORTION_LEN: usize = 8;

/// Rational radial denominators below this are rejected, negative ones included.
const RATIONAL_DENOMINATOR_EPS: f64 = 1e-12;

/// Pinhole camera with radial-tangential distortion.
///
/// # Examples
///
/// ```rust
/// use nalgebra::{DVector, Vector3};
/// use marker_overlay::camera::{CameraModel, RadTanModel};
///
/// // fx, fy, cx, cy, k1, k2, p1, p2, k3
/// let params = DVector::from_vec(vec![500.0, 500.0, 320.0, 240.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
/// let model = RadTanModel::new(&params).unwrap();
///
/// let pixel = model.project(&Vector3::new(0.0, 0.0, 2.0)).unwrap();
/// assert_eq!(pixel.x, 320.0);
/// assert_eq!(pixel.y, 240.0);
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RadTanModel {
    /// Camera intrinsic parameters: `fx`, `fy`, `cx`, `cy`.
    pub intrinsics: Intrinsics,
    /// Image resolution as width and height in pixels.
    pub resolution: Resolution,
    /// Distortion coefficients `[k1, k2, p1, p2, k3, k4, k5, k6]`.
    pub distortions: [f64; DISTORTION_LEN],
}

/// Expands an OpenCV distortion vector to the full 8-coefficient layout.
///
/// Accepted lengths are 0 (no distortion), 4 (`k1 k2 p1 p2`), 5 (`+ k3`) and
/// 8 (`+ k4 k5 k6`).
fn expand_distortion(coefficients: &[f64]) -> Result<[f64; DISTORTION_LEN], CameraModelError> {
    match coefficients.len() {
        0 | 4 | 5 | 8 => {
            let mut distortions = [0.0; DISTORTION_LEN];
            distortions[..coefficients.len()].copy_from_slice(coefficients);
            Ok(distortions)
        }
        n => Err(CameraModelError::InvalidParams(format!(
            "Distortion vector must have 0, 4, 5 or 8 coefficients, got {n}"
        ))),
    }
}

impl RadTanModel {
    /// Creates a new [`RadTanModel`] from a flat parameter vector.
    ///
    /// The vector holds `fx, fy, cx, cy` followed by 0, 4, 5 or 8 distortion
    /// coefficients in OpenCV order. The resolution is left at 0x0.
    ///
    /// # Errors
    ///
    /// * [`CameraModelError::InvalidParams`] for an unsupported parameter count
    ///   or non-finite coefficients.
    /// * Errors from [`validation::validate_intrinsics`].
    pub fn new(parameters: &DVector<f64>) -> Result<Self, CameraModelError> {
        if parameters.len() < 4 {
            return Err(CameraModelError::InvalidParams(format!(
                "Expected at least 4 parameters (fx, fy, cx, cy), got {}",
                parameters.len()
            )));
        }

        let model = RadTanModel {
            intrinsics: Intrinsics {
                fx: parameters[0],
                fy: parameters[1],
                cx: parameters[2],
                cy: parameters[3],
            },
            resolution: Resolution::default(),
            distortions: expand_distortion(&parameters.as_slice()[4..])?,
        };

        model.validate_params()?;
        info!("new RadTan model is: {model:?}");
        Ok(model)
    }

    /// Builds a model from an OpenCV camera matrix and distortion vector.
    ///
    /// # Errors
    ///
    /// * [`CameraModelError::InvalidParams`] if `camera_matrix` is not a
    ///   skew-free 3×3 intrinsic matrix or the distortion vector has an
    ///   unsupported length.
    /// * Any validation error from [`CameraModel::validate_params`].
    pub fn from_camera_matrix(
        camera_matrix: &DMatrix<f64>,
        dist_coeffs: &DVector<f64>,
        resolution: Resolution,
    ) -> Result<Self, CameraModelError> {
        let model = RadTanModel {
            intrinsics: Intrinsics::from_camera_matrix(camera_matrix)?,
            resolution,
            distortions: expand_distortion(dist_coeffs.as_slice())?,
        };

        model.validate_params()?;
        info!("new RadTan model is: {model:?}");
        Ok(model)
    }

    /// Applies the distortion polynomial to a point on the normalized image plane.
    ///
    /// Returns `None` when the rational denominator is not safely positive or
    /// the result is not finite. A negative denominator would mirror the
    /// point through the principal point.
    pub fn distort(&self, normalized: &Vector2<f64>) -> Option<Vector2<f64>> {
        let [k1, k2, p1, p2, k3, k4, k5, k6] = self.distortions;
        let (x, y) = (normalized.x, normalized.y);

        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        let numerator = 1.0 + k1 * r2 + k2 * r4 + k3 * r6;
        let denominator = 1.0 + k4 * r2 + k5 * r4 + k6 * r6;
        if denominator < RATIONAL_DENOMINATOR_EPS {
            return None;
        }
        let radial = numerator / denominator;

        let x_distorted = x * radial + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
        let y_distorted = y * radial + p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;

        let distorted = Vector2::new(x_distorted, y_distorted);
        (distorted.x.is_finite() && distorted.y.is_finite()).then_some(distorted)
    }
}

impl fmt::Debug for RadTanModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [k1, k2, p1, p2, k3, k4, k5, k6] = self.distortions;
        write!(
            f,
            "RadTan [fx: {} fy: {} cx: {} cy: {} k1: {} k2: {} p1: {} p2: {} k3: {} k4: {} k5: {} k6: {}]",
            self.intrinsics.fx,
            self.intrinsics.fy,
            self.intrinsics.cx,
            self.intrinsics.cy,
            k1,
            k2,
            p1,
            p2,
            k3,
            k4,
            k5,
            k6
        )
    }
}

impl CameraModel for RadTanModel {
    /// Projects a camera-frame point: divide by depth, distort, apply `K`.
    ///
    /// # Errors
    ///
    /// * [`CameraModelError::PointAtCameraCenter`] if `z` is not safely positive.
    /// * [`CameraModelError::NumericalError`] if the distortion cannot be evaluated.
    fn project(&self, point_3d: &Vector3<f64>) -> Result<Vector2<f64>, CameraModelError> {
        validate_point_in_front(point_3d.z)?;

        let normalized = Vector2::new(point_3d.x / point_3d.z, point_3d.y / point_3d.z);
        let distorted = self.distort(&normalized).ok_or_else(|| {
            CameraModelError::NumericalError(format!(
                "distortion undefined at normalized point ({}, {})",
                normalized.x, normalized.y
            ))
        })?;

        let pixel = self.intrinsics.to_pixel(&distorted);
        if !pixel.x.is_finite() || !pixel.y.is_finite() {
            return Err(CameraModelError::NumericalError(
                "projected pixel is not finite".to_string(),
            ));
        }
        Ok(pixel)
    }

    /// Loads [`RadTanModel`] parameters from a `cam0` YAML file.
    ///
    /// Both the flat `intrinsics: [fx, fy, cx, cy, k1, k2, p1, p2, k3]` layout
    /// and the `camera_matrix` + `distortion_coeffs` layout are accepted.
    fn load_from_yaml(path: &str) -> Result<Self, CameraModelError> {
        use crate::camera::yaml_io;

        let (intrinsics, resolution, distortion) = yaml_io::parse_yaml_camera(path, 4)?;

        let model = RadTanModel {
            intrinsics,
            resolution,
            distortions: expand_distortion(&distortion)?,
        };

        model.validate_params()?;
        info!("loaded RadTan model from {path}: {model:?}");
        Ok(model)
    }

    /// Saves the parameters in the flat `cam0` layout.
    ///
    /// The rational terms are only written when one of them is non-zero, so a
    /// 5-coefficient calibration stays a 5-coefficient file.
    fn save_to_yaml(&self, path: &str) -> Result<(), CameraModelError> {
        use crate::camera::yaml_io;

        let rational = self.distortions[5..].iter().any(|&k| k != 0.0);
        let coefficients = if rational {
            &self.distortions[..]
        } else {
            &self.distortions[..5]
        };

        yaml_io::save_yaml_camera(
            path,
            self.get_model_name(),
            &self.intrinsics,
            &self.resolution,
            coefficients,
        )
    }

    fn validate_params(&self) -> Result<(), CameraModelError> {
        validation::validate_intrinsics(&self.intrinsics)?;
        validation::validate_distortion(&self.distortions)
    }

    fn get_resolution(&self) -> Resolution {
        self.resolution
    }

    fn get_intrinsics(&self) -> Intrinsics {
        self.intrinsics.clone()
    }

    /// Returns all eight coefficients `[k1, k2, p1, p2, k3, k4, k5, k6]`.
    fn get_distortion(&self) -> Vec<f64> {
        self.distortions.to_vec()
    }

    fn get_model_name(&self) -> &'static str {
        "rad_tan"
    }
}
