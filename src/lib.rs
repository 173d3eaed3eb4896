//! Marker Overlay Library
//!
//! Draws calibration-accurate 3D wireframes (coordinate axes, a cube, a
//! cylinder) onto images at the pose of detected fiducial markers.
//!
//! - [`camera`]: pinhole camera with radial-tangential distortion, loaded once
//!   from a persisted calibration
//! - [`marker`]: per-frame marker detections handed over by a detector
//! - [`projection`]: marker-frame points to pixels, keyed by point index
//! - [`primitives`]: point sets, edge tables and the [`OverlayRenderer`]
//! - [`util`]: line rasterization, image I/O and centroid diagnostics
//!
//! Marker detection, pose estimation and calibration are done elsewhere;
//! this crate only consumes their results.

pub mod camera;
pub mod marker;
pub mod primitives;
pub mod projection;
pub mod util;

// Re-export commonly used types
pub use camera::{CameraModel, CameraModelError, Intrinsics, RadTanModel, Resolution};
pub use marker::{find_marker, MarkerPose, PoseError};
pub use primitives::{
    ConfigError, DrawOutcome, DrawReport, DrawStats, Edge, OverlayRenderer, Primitive,
    PrimitiveConfig,
};
pub use projection::{project_points, ProjectionMap};
