//! Image preparation for vision requests and report embedding
//!
//! Decodes uploaded photos, bounds their size and re-encodes them as JPEG.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum image dimension (width or height)
const MAX_DIMENSION: u32 = 1600;

/// JPEG magic bytes
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// An image handed in by the caller, either on disk or in memory
#[derive(Debug, Clone)]
pub enum ImageInput {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageInput {
    /// Short label for logs and error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to read image {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to decode image {source_name}: {reason}")]
    Decode { source_name: String, reason: String },

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Decoded, size-bounded JPEG
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    pub fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Prepare an image for the vision API
///
/// - Resizes if too large
/// - Converts to RGB JPEG for optimal size
pub fn prepare_image(image_data: &[u8]) -> Result<PreparedImage, ImageError> {
    let img = image::load_from_memory(image_data).map_err(|e| ImageError::Decode {
        source_name: format!("<{} bytes>", image_data.len()),
        reason: e.to_string(),
    })?;

    let img = resize_if_needed(img);
    // JPEG has no alpha channel
    let img = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .map_err(|e| ImageError::Encode(e.to_string()))?;

    Ok(PreparedImage {
        jpeg: buffer,
        width: img.width(),
        height: img.height(),
    })
}

/// Resize image if it exceeds maximum dimensions
fn resize_if_needed(img: DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());

    if width <= MAX_DIMENSION && height <= MAX_DIMENSION {
        return img;
    }

    let scale = (MAX_DIMENSION as f32 / width.max(height) as f32).min(1.0);
    let new_width = ((width as f32 * scale) as u32).max(1);
    let new_height = ((height as f32 * scale) as u32).max(1);

    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

/// Load and prepare an image for the vision API.
/// Decoding and resizing run on the blocking pool.
pub async fn load_image(input: &ImageInput) -> Result<PreparedImage, ImageError> {
    let (data, path) = match input {
        ImageInput::Path(path) => {
            let data = tokio::fs::read(path).await.map_err(|e| ImageError::Read {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            (data, Some(path.clone()))
        }
        ImageInput::Bytes(data) => (data.clone(), None),
    };

    let prepared = tokio::task::spawn_blocking(move || prepare_image(&data))
        .await
        .map_err(|e| ImageError::Encode(format!("Task failed: {}", e)))?;

    match path {
        Some(path) => prepared.map_err(|e| rename_source(e, &path)),
        None => prepared,
    }
}

/// Blocking variant for the report renderer
pub fn load_image_blocking(input: &ImageInput) -> Result<PreparedImage, ImageError> {
    match input {
        ImageInput::Path(path) => {
            let data = std::fs::read(path).map_err(|e| ImageError::Read {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            prepare_image(&data).map_err(|e| rename_source(e, path))
        }
        ImageInput::Bytes(data) => prepare_image(data),
    }
}

fn rename_source(err: ImageError, path: &Path) -> ImageError {
    match err {
        ImageError::Decode { reason, .. } => ImageError::Decode {
            source_name: path.display().to_string(),
            reason,
        },
        other => other,
    }
}

/// Whether bytes already look like a JPEG stream
pub fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&JPEG_MAGIC)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    /// Small PNG with a gradient, enough for the decoder
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_converts_to_jpeg() {
        let prepared = prepare_image(&fixtures::png_bytes(40, 20)).unwrap();
        assert!(is_jpeg(&prepared.jpeg));
        assert_eq!((prepared.width, prepared.height), (40, 20));
        assert_eq!(prepared.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_large_images_are_bounded() {
        let prepared = prepare_image(&fixtures::png_bytes(3200, 800)).unwrap();
        assert_eq!(prepared.width, MAX_DIMENSION);
        assert_eq!(prepared.height, 400);
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let err = prepare_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ImageError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_a_read_error() {
        let input = ImageInput::Path(PathBuf::from("/nonexistent/photo.jpg"));
        let err = load_image(&input).await.unwrap_err();
        assert!(matches!(err, ImageError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/photo.jpg"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_load_image_off_the_runtime_thread() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tank.png");
        std::fs::write(&path, fixtures::png_bytes(2400, 1200)).unwrap();

        let path_input = ImageInput::Path(path.clone());
        let bytes_input = ImageInput::Bytes(fixtures::png_bytes(20, 10));
        let (from_path, from_bytes) = tokio::join!(
            load_image(&path_input),
            load_image(&bytes_input),
        );
        let from_path = from_path.unwrap();
        assert_eq!((from_path.width, from_path.height), (MAX_DIMENSION, 800));
        assert!(is_jpeg(&from_bytes.unwrap().jpeg));

        std::fs::write(&path, b"corrupt").unwrap();
        let err = load_image(&ImageInput::Path(path.clone())).await.unwrap_err();
        assert!(matches!(err, ImageError::Decode { ref source_name, .. } if source_name.contains("tank.png")));
    }
}
