//! Image decoding from memory and disk.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::debug;

use super::error::ImageError;

/// Decodes a complete in-memory byte buffer into an image.
///
/// Returns `None` (never errors) for malformed, truncated, or non-image
/// payloads; callers treat `None` as a decode failure, not a transport one.
#[must_use]
pub fn decode_bytes(bytes: &[u8]) -> Option<DynamicImage> {
    match image::load_from_memory(bytes) {
        Ok(image) => Some(image),
        Err(error) => {
            debug!(error = %error, len = bytes.len(), "payload could not be decoded as an image");
            None
        }
    }
}

/// Reads and decodes an image file from disk.
///
/// Runs the blocking read on the blocking thread pool so the caller's
/// async context is never blocked on disk I/O.
///
/// # Errors
///
/// Returns [`ImageError::IsDirectory`] when the path is a directory,
/// [`ImageError::DecodeFailed`] when the file is not a decodable image,
/// and [`ImageError::General`] for other I/O failures (including a
/// missing file).
pub async fn read_image_from_disk(path: impl Into<PathBuf>) -> Result<DynamicImage, ImageError> {
    let path = path.into();
    tokio::task::spawn_blocking(move || read_image_blocking(&path))
        .await
        .map_err(|e| ImageError::general_with_source("image read task failed", e))?
}

/// Blocking counterpart of [`read_image_from_disk`].
///
/// # Errors
///
/// Same as [`read_image_from_disk`].
pub fn read_image_blocking(path: &Path) -> Result<DynamicImage, ImageError> {
    let metadata = std::fs::metadata(path).map_err(|e| ImageError::classify_io(path, e))?;
    if metadata.is_dir() {
        return Err(ImageError::is_directory(path));
    }
    image::open(path).map_err(|error| {
        debug!(path = %path.display(), error = %error, "file could not be decoded as an image");
        ImageError::decode_failed(path.display().to_string())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            2,
            2,
            image::Rgb([12, 120, 200]),
        ));
        let mut cursor = std::io::Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_decode_bytes_valid_png() {
        let decoded = decode_bytes(&png_bytes()).unwrap();
        assert_eq!(decoded.width(), 2);
        assert_eq!(decoded.height(), 2);
    }

    #[test]
    fn test_decode_bytes_garbage_returns_none() {
        assert!(decode_bytes(b"definitely not an image").is_none());
        assert!(decode_bytes(&[]).is_none());
    }

    #[test]
    fn test_decode_bytes_truncated_returns_none() {
        let bytes = png_bytes();
        assert!(decode_bytes(&bytes[..bytes.len() / 2]).is_none());
    }

    #[test]
    fn test_read_image_blocking_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = read_image_blocking(dir.path());
        assert!(matches!(result, Err(ImageError::IsDirectory { .. })));
    }

    #[test]
    fn test_read_image_blocking_non_image_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain text").unwrap();
        let result = read_image_blocking(&path);
        assert!(matches!(result, Err(ImageError::DecodeFailed { .. })));
    }

    #[test]
    fn test_read_image_blocking_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = read_image_blocking(&dir.path().join("absent.png"));
        assert!(matches!(result, Err(ImageError::General { .. })));
    }

    #[tokio::test]
    async fn test_read_image_from_disk_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tiny.png");
        std::fs::write(&path, png_bytes()).unwrap();
        let image = read_image_from_disk(&path).await.unwrap();
        assert_eq!(image.width(), 2);
    }
}
