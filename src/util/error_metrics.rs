//! Agreement between detected marker centroids and projected marker origins.
//!
//! The detector reports a pixel centroid alongside every pose. Projecting the
//! marker origin with that pose should land on the centroid; a large offset
//! points at a calibration that does not match the one the detector used.

use crate::camera::CameraModel;
use crate::marker::MarkerPose;
use crate::projection::project_points;
use log::warn;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::UtilError;

/// Pixel error statistics.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProjectionError {
    /// Root Mean Square Error
    pub rmse: f64,
    /// Minimum error
    pub min: f64,
    /// Maximum error
    pub max: f64,
    /// Mean error
    pub mean: f64,
    /// Standard deviation of the errors
    pub stddev: f64,
    /// Median error
    pub median: f64,
    /// Number of markers that contributed
    pub count: usize,
}

impl fmt::Debug for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Projection Error [ n: {}, rmse: {}, min: {}, max: {}, mean: {}, stddev: {}, median: {} ]",
            self.count, self.rmse, self.min, self.max, self.mean, self.stddev, self.median
        )
    }
}

impl ProjectionError {
    fn from_errors(mut errors: Vec<f64>) -> Result<Self, UtilError> {
        if errors.is_empty() {
            return Err(UtilError::ZeroProjectionPoints);
        }

        let n = errors.len() as f64;
        let mean = errors.iter().sum::<f64>() / n;

        let variance: f64 = errors.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let stddev = variance.sqrt();

        let sum_squared: f64 = errors.iter().map(|x| x.powi(2)).sum::<f64>();
        let rmse = (sum_squared / n).sqrt();

        errors.sort_by(f64::total_cmp);
        let min = errors[0];
        let max = errors[errors.len() - 1];
        let median = if errors.len() % 2 == 0 {
            let mid = errors.len() / 2;
            (errors[mid - 1] + errors[mid]) / 2.0
        } else {
            errors[errors.len() / 2]
        };

        Ok(ProjectionError {
            rmse,
            min,
            max,
            mean,
            stddev,
            median,
            count: errors.len(),
        })
    }
}

/// Compute centroid offset statistics for a frame's detections.
///
/// Markers with a degenerate pose, or whose origin does not project, are
/// left out.
///
/// # Errors
///
/// * `UtilError::ZeroProjectionPoints` - If no marker could be projected
pub fn compute_centroid_error<T>(
    camera_model: &T,
    markers: &[MarkerPose],
) -> Result<ProjectionError, UtilError>
where
    T: ?Sized + CameraModel,
{
    let origin = [Vector3::zeros()];
    let mut errors = Vec::with_capacity(markers.len());

    for marker in markers {
        match project_points(&origin, marker, camera_model) {
            Ok(projections) => {
                if let Some(pixel) = projections.get(0) {
                    errors.push((pixel - marker.center).norm());
                }
            }
            Err(e) => warn!("marker {} left out of centroid error: {e}", marker.id),
        }
    }

    ProjectionError::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::RadTanModel;
    use approx::assert_relative_eq;
    use nalgebra::{DVector, Vector2};

    fn camera() -> RadTanModel {
        RadTanModel::new(&DVector::from_vec(vec![500.0, 500.0, 320.0, 240.0])).unwrap()
    }

    fn marker(id: i32, center: Vector2<f64>, tvec: Vector3<f64>) -> MarkerPose {
        MarkerPose::new(id, center, Vector3::zeros(), tvec)
    }

    #[test]
    fn test_centroid_error_statistics() {
        let markers = [
            // Projects to (320, 240): offset 3.
            marker(1, Vector2::new(323.0, 240.0), Vector3::new(0.0, 0.0, 500.0)),
            // Projects to (370, 240): offset 5.
            marker(2, Vector2::new(370.0, 245.0), Vector3::new(50.0, 0.0, 500.0)),
        ];

        let stats = compute_centroid_error(&camera(), &markers).unwrap();
        assert_eq!(stats.count, 2);
        assert_relative_eq!(stats.min, 3.0, epsilon = 1e-9);
        assert_relative_eq!(stats.max, 5.0, epsilon = 1e-9);
        assert_relative_eq!(stats.mean, 4.0, epsilon = 1e-9);
        assert_relative_eq!(stats.median, 4.0, epsilon = 1e-9);
        assert_relative_eq!(stats.stddev, 1.0, epsilon = 1e-9);
        assert_relative_eq!(stats.rmse, 17.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_markers_are_left_out() {
        let markers = [
            marker(1, Vector2::new(320.0, 240.0), Vector3::new(0.0, 0.0, 500.0)),
            marker(2, Vector2::new(320.0, 240.0), Vector3::zeros()),
            marker(3, Vector2::new(320.0, 240.0), Vector3::new(0.0, 0.0, -500.0)),
        ];

        let stats = compute_centroid_error(&camera(), &markers).unwrap();
        assert_eq!(stats.count, 1);
        assert_relative_eq!(stats.max, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_projectable_marker() {
        let markers = [marker(2, Vector2::new(320.0, 240.0), Vector3::zeros())];
        assert!(matches!(
            compute_centroid_error(&camera(), &markers),
            Err(UtilError::ZeroProjectionPoints)
        ));
        assert!(matches!(
            compute_centroid_error(&camera(), &[]),
            Err(UtilError::ZeroProjectionPoints)
        ));
    }
}
