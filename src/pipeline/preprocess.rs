//! Document preprocessing — turn an uploaded file into one base64 JPEG the
//! vision model can consume.

use std::path::Path;

use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use super::ValidationError;

/// Longest edge sent to the model; larger uploads are downscaled.
const MAX_DIMENSION: u32 = 2048;
const JPEG_QUALITY: u8 = 85;

/// A document rendered as a single model-ready image.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub base64: String,
    pub width: u32,
    pub height: u32,
}

/// Converts an uploaded document file into a [`PreparedImage`].
///
/// Failure here is a hard gate: without an image there is nothing to assess.
pub trait Preprocessor: Send + Sync {
    fn prepare(&self, file_path: &Path) -> Result<PreparedImage, ValidationError>;
}

/// Raster-image preprocessor for JPEG, PNG and TIFF uploads.
pub struct ImagePreprocessor;

impl Preprocessor for ImagePreprocessor {
    fn prepare(&self, file_path: &Path) -> Result<PreparedImage, ValidationError> {
        let img = image::open(file_path)
            .map_err(|e| ValidationError::Preprocess(format!("{}: {e}", file_path.display())))?;

        let img = if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
            img.thumbnail(MAX_DIMENSION, MAX_DIMENSION)
        } else {
            img
        };
        let (width, height) = (img.width(), img.height());

        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
        img.into_rgb8()
            .write_with_encoder(encoder)
            .map_err(|e| ValidationError::Preprocess(e.to_string()))?;

        debug!(width, height, jpeg_bytes = jpeg.len(), "prepared document image");

        Ok(PreparedImage {
            base64: base64::engine::general_purpose::STANDARD.encode(&jpeg),
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn write_png(dir: &tempfile::TempDir, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn small_image_keeps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir, "doc.png", 640, 480);

        let prepared = ImagePreprocessor.prepare(&path).unwrap();
        assert_eq!((prepared.width, prepared.height), (640, 480));
        assert!(!prepared.base64.is_empty());
    }

    #[test]
    fn oversized_image_is_downscaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir, "big.png", 4096, 2048);

        let prepared = ImagePreprocessor.prepare(&path).unwrap();
        assert!(prepared.width <= MAX_DIMENSION && prepared.height <= MAX_DIMENSION);
        // Aspect ratio preserved.
        assert_eq!(prepared.width, 2048);
        assert_eq!(prepared.height, 1024);
    }

    #[test]
    fn missing_file_is_a_preprocess_error() {
        let err = ImagePreprocessor
            .prepare(Path::new("/nonexistent/cert.png"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Preprocess(_)));
    }

    #[test]
    fn base64_decodes_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir, "doc.png", 100, 100);

        let prepared = ImagePreprocessor.prepare(&path).unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(prepared.base64)
            .unwrap();
        // JPEG magic bytes.
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
