//! Image decoding.
//!
//! The format is sniffed from file content, so a misnamed or truncated file
//! fails here instead of being grouped.

use crate::error::HashError;
use image::{DynamicImage, ImageReader};
use std::path::Path;

/// Decode an image file into pixels
pub fn decode_image(path: &Path) -> Result<DynamicImage, HashError> {
    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| HashError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;

    let image = reader.decode().map_err(|e| HashError::DecodeError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if image.width() == 0 || image.height() == 0 {
        return Err(HashError::EmptyImage {
            path: path.to_path_buf(),
        });
    }

    Ok(image)
}
