//! Image ingestion: a user-selected local file → [`EncodedImage`].
//!
//! The file is read asynchronously and kept as-is: no decoding or resizing
//! happens here, only a sniff of the leading bytes to make sure it really
//! is an image and to learn its MIME type. Anything heavier is deferred to
//! assembly so that selecting a photo stays instant.

use crate::card::EncodedImage;
use crate::error::ImageError;
use image::ImageFormat;
use std::path::Path;
use tracing::debug;

/// What happened to a single upload.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// No file was selected; nothing changed.
    NoFile,
    /// The image was read and attached to the card.
    Attached,
    /// The file could not be used; the card keeps whatever it had before.
    Rejected(ImageError),
    /// The target card no longer exists (removed while the read was pending).
    UnknownCard,
}

impl IngestOutcome {
    pub fn is_attached(&self) -> bool {
        matches!(self, IngestOutcome::Attached)
    }
}

/// MIME types we accept, keyed by the format sniffed from the bytes.
fn mime_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}

/// Identify the image type of `bytes`. Returns `None` for non-images.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().and_then(mime_for)
}

/// Read an image file into its encoded, self-describing form.
pub async fn read_image(path: &Path) -> Result<EncodedImage, ImageError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ImageError::Unreadable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let mime = sniff_mime(&bytes).ok_or_else(|| ImageError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    debug!(
        "Read image {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        mime
    );
    Ok(EncodedImage::from_bytes(mime, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    fn jpeg_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .expect("jpeg encode");
        buf
    }

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(sniff_mime(&jpeg_bytes()), Some("image/jpeg"));
        assert_eq!(sniff_mime(b"\x89PNG\r\n\x1a\n0000"), Some("image/png"));
        assert_eq!(sniff_mime(b"GIF89a......"), Some("image/gif"));
        assert_eq!(sniff_mime(b"%PDF-1.7"), None);
        assert_eq!(sniff_mime(b""), None);
    }

    #[test]
    fn reads_jpeg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        let bytes = jpeg_bytes();
        std::fs::write(&path, &bytes).unwrap();

        let img = tokio_test::block_on(read_image(&path)).expect("reads");
        assert_eq!(img.mime_type, "image/jpeg");
        assert_eq!(img.decode().unwrap(), bytes);
    }

    #[test]
    fn rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"not a photo").unwrap();

        let err = tokio_test::block_on(read_image(&path)).unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = tokio_test::block_on(read_image(Path::new("/definitely/not/here.jpg")))
            .unwrap_err();
        assert!(matches!(err, ImageError::Unreadable { .. }));
    }
}
