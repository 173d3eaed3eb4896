//! Projection of marker-local model points into the image.
//!
//! [`project_points`] is the single entry point: it applies the marker pose
//! (rotate by the Rodrigues vector, then translate) and hands every
//! camera-frame point to the camera model, which divides by depth, applies
//! lens distortion and the intrinsic matrix. The result is a [`ProjectionMap`]
//! that keeps the input order, so model points are always looked up by index
//! and never by coordinate value. Two model points may coincide (e.g. a
//! shared origin) without their projections colliding.

use crate::camera::{CameraModel, CameraModelError};
use crate::marker::{MarkerPose, PoseError};
use log::debug;
use nalgebra::{Vector2, Vector3};

/// Index-keyed projections of one primitive's model points.
///
/// Entry `i` is the pixel of input point `i`, or `None` if that point could
/// not be projected (behind the camera, on the optical center, or outside
/// the domain of the distortion model).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionMap {
    pixels: Vec<Option<Vector2<f64>>>,
}

impl ProjectionMap {
    /// Number of model points, projectable or not.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Pixel of the model point at `index`, if it projected.
    pub fn get(&self, index: usize) -> Option<Vector2<f64>> {
        self.pixels.get(index).copied().flatten()
    }

    /// Both endpoints of an edge, if both projected.
    pub fn segment(&self, from: usize, to: usize) -> Option<(Vector2<f64>, Vector2<f64>)> {
        Some((self.get(from)?, self.get(to)?))
    }

    /// Number of points that could not be projected.
    pub fn invalid_count(&self) -> usize {
        self.pixels.iter().filter(|p| p.is_none()).count()
    }
}

/// Projects marker-local points into pixel coordinates.
///
/// # Arguments
///
/// * `object_points` - Points in the marker frame, in marker length units
/// * `pose` - Pose of the marker relative to the camera
/// * `camera` - Calibrated camera model
///
/// # Returns
///
/// A [`ProjectionMap`] with exactly one entry per input point, in input order.
///
/// # Errors
///
/// * [`PoseError`] if the pose has non-finite components or a zero
///   translation. No point is projected in that case.
pub fn project_points<C>(
    object_points: &[Vector3<f64>],
    pose: &MarkerPose,
    camera: &C,
) -> Result<ProjectionMap, PoseError>
where
    C: ?Sized + CameraModel,
{
    pose.validate()?;

    let rotation = pose.rotation();
    let pixels = object_points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let point_camera = rotation * point + pose.tvec;
            match camera.project(&point_camera) {
                Ok(pixel) => Some(pixel),
                Err(CameraModelError::PointAtCameraCenter) => {
                    debug!(
                        "marker {}: model point {i} at depth {} is not in front of the camera",
                        pose.id, point_camera.z
                    );
                    None
                }
                Err(e) => {
                    debug!("marker {}: model point {i} not projectable: {e}", pose.id);
                    None
                }
            }
        })
        .collect();

    Ok(ProjectionMap { pixels })
}
