//! Image decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the RGBA
//! pixel buffer every other stage operates on.

use crate::types::{MeasureError, RgbaImage};

/// Decode raw image bytes into an 8-bit RGBA buffer.
///
/// Supports whatever formats the `image` crate was built with. Images
/// with other channel layouts (grayscale, 16-bit) are converted.
///
/// # Errors
///
/// Returns [`MeasureError::EmptyInput`] if `bytes` is empty.
/// Returns [`MeasureError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, MeasureError> {
    if bytes.is_empty() {
        return Err(MeasureError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}
