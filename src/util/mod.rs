//! Glue around the overlay core: rasterization, image I/O and diagnostics.

mod error_metrics;
mod image_io;
pub mod raster;

pub use error_metrics::{compute_centroid_error, ProjectionError};
pub use image_io::{load_image, save_image};
pub use raster::draw_line_segment;

#[derive(thiserror::Error, Debug)]
pub enum UtilError {
    #[error("Zero projection points")]
    ZeroProjectionPoints,
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

impl From<std::io::Error> for UtilError {
    fn from(err: std::io::Error) -> Self {
        UtilError::InvalidParams(err.to_string())
    }
}
