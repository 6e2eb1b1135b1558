//! Pixel-level transform operations.
//!
//! Pure functions over encoded image bytes. Callers are expected to run
//! these on the blocking pool; a large decode can take tens of
//! milliseconds.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::gateway::{GatewayError, ImageInfo};

fn decode(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), GatewayError> {
    let format = image::guess_format(bytes).map_err(|e| GatewayError::Decode(e.to_string()))?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| GatewayError::Decode(e.to_string()))?;
    Ok((img, format))
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, GatewayError> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)
        .map_err(|e| GatewayError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

/// A zero target dimension means "keep the source dimension", matching
/// ImageMagick geometry where an unspecified axis is auto.
fn effective_dims(img: &DynamicImage, width: u32, height: u32) -> (u32, u32) {
    (
        if width == 0 { img.width() } else { width },
        if height == 0 { img.height() } else { height },
    )
}

/// Scale to exactly `width`×`height`, ignoring aspect ratio.
pub fn resize(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, GatewayError> {
    let (img, format) = decode(bytes)?;
    let (w, h) = effective_dims(&img, width, height);
    let resized = img.resize_exact(w, h, FilterType::Lanczos3);
    encode(&resized, format)
}

/// Scale preserving aspect ratio so the result fits within
/// `width`×`height`.
pub fn fit(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, GatewayError> {
    let (img, format) = decode(bytes)?;
    let (w, h) = effective_dims(&img, width, height);
    let fitted = img.resize(w, h, FilterType::Lanczos3);
    encode(&fitted, format)
}

/// Report format, dimensions, and payload size without transforming.
pub fn identify(bytes: &[u8]) -> Result<ImageInfo, GatewayError> {
    let (img, format) = decode(bytes)?;
    Ok(ImageInfo {
        format: format.to_mime_type().to_string(),
        width: img.width(),
        height: img.height(),
        bytes: bytes.len(),
    })
}
