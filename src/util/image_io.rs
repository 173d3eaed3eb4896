//! Loading and saving of the image buffers the overlay draws into.

use image::RgbImage;
use log::info;
use std::fs;
use std::path::Path;

use super::UtilError;

/// Load an image from file path as 8-bit RGB.
///
/// # Errors
///
/// * `UtilError::InvalidParams` - If the image cannot be opened or decoded
pub fn load_image(image_path: &str) -> Result<RgbImage, UtilError> {
    let img = image::open(image_path)
        .map_err(|e| UtilError::InvalidParams(format!("Failed to load image: {e}")))?;

    Ok(img.to_rgb8())
}

/// Save an image, creating the parent directory when needed.
///
/// The format is chosen from the file extension.
///
/// # Errors
///
/// * `UtilError::InvalidParams` - If the directory cannot be created or encoding fails
pub fn save_image(image: &RgbImage, image_path: &str) -> Result<(), UtilError> {
    if let Some(parent) = Path::new(image_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    image
        .save(image_path)
        .map_err(|e| UtilError::InvalidParams(format!("Failed to save image: {e}")))?;

    info!("saved overlay image {image_path}");
    Ok(())
}
