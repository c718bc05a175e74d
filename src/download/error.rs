//! Error types for the download module.
//!
//! This module defines structured errors for every download outcome,
//! covering transport, decoding, and storage failures uniformly.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while downloading, decoding, or persisting an image.
///
/// The variant is the error kind; the human-readable message comes from
/// `Display` and the wrapped underlying cause, where present, from
/// `std::error::Error::source`.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Any unclassified transport or I/O failure, wrapping the original cause.
    #[error("{message}")]
    General {
        /// Description of the failed operation.
        message: String,
        /// The underlying cause, if one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server response does not describe a downloadable file
    /// (unknown or zero content length).
    #[error("invalid content length for {url}: the URL is probably not pointing to a file")]
    InvalidFile {
        /// The URL whose response had no usable content length.
        url: String,
    },

    /// Bytes were received but could not be interpreted as an image.
    #[error("downloaded data from {resource} could not be decoded as an image")]
    DecodeFailed {
        /// The URL or path the undecodable bytes came from.
        resource: String,
    },

    /// The destination file already exists and may not be overwritten.
    #[error("file already exists: {path}")]
    FileExists {
        /// The conflicting destination path.
        path: PathBuf,
    },

    /// A file operation was denied by the operating system.
    #[error("permission denied for {path}: {source}")]
    PermissionDenied {
        /// The path the operation was denied on.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The destination path is a directory, not a file.
    #[error("target path is a directory: {path}")]
    IsDirectory {
        /// The offending path.
        path: PathBuf,
    },
}

impl ImageError {
    /// Creates a general error with no underlying cause.
    pub fn general(message: impl Into<String>) -> Self {
        Self::General {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a general error wrapping the original cause.
    pub fn general_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::General {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an invalid-file error for a URL with no usable content length.
    pub fn invalid_file(url: impl Into<String>) -> Self {
        Self::InvalidFile { url: url.into() }
    }

    /// Creates a decode-failed error for a URL or path.
    pub fn decode_failed(resource: impl Into<String>) -> Self {
        Self::DecodeFailed {
            resource: resource.into(),
        }
    }

    /// Creates an is-directory error.
    pub fn is_directory(path: impl Into<PathBuf>) -> Self {
        Self::IsDirectory { path: path.into() }
    }

    /// Classifies an IO error against the storage-path taxonomy.
    ///
    /// Permission denials, existing files, and directory targets surface as
    /// their distinct kinds; everything else falls back to [`Self::General`]
    /// with the original cause attached.
    pub(crate) fn classify_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source },
            std::io::ErrorKind::AlreadyExists => Self::FileExists { path },
            std::io::ErrorKind::IsADirectory => Self::IsDirectory { path },
            _ => Self::General {
                message: format!("IO error at {}", path.display()),
                source: Some(Box::new(source)),
            },
        }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` or
// `From<std::io::Error>` because the variants require context (url, path)
// that the source errors don't carry. The helper constructors are the
// correct pattern here as they force callers to provide that context.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_general_display_and_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let error = ImageError::general_with_source("network error downloading http://x/y", cause);
        assert_eq!(error.to_string(), "network error downloading http://x/y");
        assert!(error.source().is_some(), "cause should be wrapped");
    }

    #[test]
    fn test_general_without_source() {
        let error = ImageError::general("timeout downloading http://x/y");
        assert!(error.source().is_none());
    }

    #[test]
    fn test_invalid_file_display() {
        let error = ImageError::invalid_file("http://example.com/nothing");
        let msg = error.to_string();
        assert!(msg.contains("invalid content length"), "got: {msg}");
        assert!(msg.contains("http://example.com/nothing"), "got: {msg}");
    }

    #[test]
    fn test_decode_failed_display() {
        let error = ImageError::decode_failed("http://example.com/page.html");
        let msg = error.to_string();
        assert!(msg.contains("could not be decoded"), "got: {msg}");
    }

    #[test]
    fn test_classify_io_permission_denied() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = ImageError::classify_io("/protected/out.png", io);
        assert!(matches!(error, ImageError::PermissionDenied { .. }));
        assert!(error.to_string().contains("/protected/out.png"));
    }

    #[test]
    fn test_classify_io_already_exists() {
        let io = std::io::Error::new(std::io::ErrorKind::AlreadyExists, "exists");
        let error = ImageError::classify_io("/tmp/out.png", io);
        assert!(matches!(error, ImageError::FileExists { .. }));
    }

    #[test]
    fn test_classify_io_is_directory() {
        let io = std::io::Error::new(std::io::ErrorKind::IsADirectory, "is a directory");
        let error = ImageError::classify_io("/tmp/somedir", io);
        assert!(matches!(error, ImageError::IsDirectory { .. }));
    }

    #[test]
    fn test_classify_io_fallback_is_general_with_cause() {
        let io = std::io::Error::other("disk on fire");
        let error = ImageError::classify_io("/tmp/out.png", io);
        assert!(matches!(error, ImageError::General { .. }));
        assert!(error.source().is_some());
        assert!(error.to_string().contains("/tmp/out.png"));
    }
}
