//! Persistence: streaming response bodies to disk and encoding images.

use std::io::Write;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use super::constants::JPEG_QUALITY;
use super::error::ImageError;

/// Streams a response body directly to `path` without full buffering.
///
/// Parent directories are created if absent. On failure the partial file is
/// removed so no incomplete data is left behind.
///
/// # Errors
///
/// Storage failures surface distinctly: [`ImageError::PermissionDenied`],
/// [`ImageError::IsDirectory`], [`ImageError::FileExists`], with
/// [`ImageError::General`] covering network errors mid-stream and any
/// unclassified I/O failure.
pub(crate) async fn copy_response_to_path(
    response: reqwest::Response,
    path: &Path,
) -> Result<u64, ImageError> {
    create_parent_dirs(path).await?;

    let url = response.url().as_str().to_string();
    let file = File::create(path)
        .await
        .map_err(|e| ImageError::classify_io(path, e))?;

    let result = stream_to_file(file, response, &url, path).await;

    if result.is_err() {
        debug!(path = %path.display(), "cleaning up partial file after error");
        let _ = tokio::fs::remove_file(path).await;
    }

    result
}

/// Streams the response body into an open file, returning bytes written.
///
/// Extracted so the caller can clean up the partial file on error.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, ImageError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            ImageError::general_with_source(format!("network error downloading {url}"), e)
        })?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| ImageError::classify_io(path, e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| ImageError::classify_io(path, e))?;

    Ok(bytes_written)
}

/// Encodes a decoded image to `path`.
///
/// Lossless PNG when the destination filename contains `.png`
/// (case-insensitive), otherwise JPEG at maximum quality. Parent
/// directories are created if absent.
///
/// Encoding is CPU-bound and synchronous; callers on the async runtime
/// should wrap this in `tokio::task::spawn_blocking`.
///
/// # Errors
///
/// Returns [`ImageError::IsDirectory`] when the destination is a directory,
/// [`ImageError::PermissionDenied`] when the OS denies the write, and
/// [`ImageError::General`] for encoder failures and other I/O errors.
#[instrument(skip(image), fields(path = %path.display()))]
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<PathBuf, ImageError> {
    if path.is_dir() {
        return Err(ImageError::is_directory(path));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| ImageError::classify_io(parent, e))?;
    }

    let file = std::fs::File::create(path).map_err(|e| ImageError::classify_io(path, e))?;
    let mut writer = std::io::BufWriter::new(file);

    if is_png_destination(path) {
        image.write_to(&mut writer, ImageFormat::Png).map_err(|e| {
            ImageError::general_with_source(format!("failed to encode PNG to {}", path.display()), e)
        })?;
    } else {
        // JPEG has no alpha channel; flatten before encoding.
        let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
        image.to_rgb8().write_with_encoder(encoder).map_err(|e| {
            ImageError::general_with_source(
                format!("failed to encode JPEG to {}", path.display()),
                e,
            )
        })?;
    }

    writer
        .flush()
        .map_err(|e| ImageError::classify_io(path, e))?;

    info!(path = %path.display(), "image saved");
    Ok(path.to_path_buf())
}

/// Lossless encoding is chosen when the filename indicates PNG.
fn is_png_destination(path: &Path) -> bool {
    path.file_name()
        .and_then(std::ffi::OsStr::to_str)
        .is_some_and(|name| name.to_ascii_lowercase().contains(".png"))
}

/// Creates the destination's parent directories if absent.
async fn create_parent_dirs(path: &Path) -> Result<(), ImageError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ImageError::classify_io(parent, e))?;
    }
    Ok(())
}
