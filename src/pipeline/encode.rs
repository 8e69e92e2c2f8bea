//! Image embedding: [`EncodedImage`] → PNG bytes ready for the packer.
//!
//! Photos arrive in whatever format the user picked. The packer stores every
//! picture as a PNG part, so each photo is decoded and re-encoded here.
//! Decoding also doubles as the integrity check: a truncated or corrupt file
//! fails at this point and only that card's image is dropped.

use crate::card::EncodedImage;
use crate::error::ImageError;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// A photo ready to be placed in the document.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub png: Vec<u8>,
    /// Pixel size of the embedded data (not the display size).
    pub width: u32,
    pub height: u32,
}

/// Decode a card's photo, downscale it to `max_pixels` on the longest edge
/// and encode it as PNG.
///
/// `position` is the 1-indexed card position, used in error messages.
pub fn embed_image(
    image: &EncodedImage,
    position: usize,
    max_pixels: u32,
) -> Result<EmbeddedImage, ImageError> {
    let raw = image.decode().map_err(|e| ImageError::Malformed {
        card: position,
        detail: e.to_string(),
    })?;

    let decoded = image::load_from_memory(&raw).map_err(|e| ImageError::EmbedFailed {
        card: position,
        detail: e.to_string(),
    })?;

    let fitted = fit_within(decoded, max_pixels);
    let (width, height) = (fitted.width(), fitted.height());

    let mut png = Vec::new();
    fitted
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| ImageError::EmbedFailed {
            card: position,
            detail: e.to_string(),
        })?;

    debug!(
        "Card {}: {} → PNG {}x{} ({} bytes)",
        position,
        image.mime_type,
        width,
        height,
        png.len()
    );

    Ok(EmbeddedImage { png, width, height })
}

/// Shrink `img` so neither side exceeds `max_pixels`. Never enlarges.
fn fit_within(img: DynamicImage, max_pixels: u32) -> DynamicImage {
    if img.width() <= max_pixels && img.height() <= max_pixels {
        return img;
    }
    img.resize(max_pixels, max_pixels, image::imageops::FilterType::Triangle)
}
