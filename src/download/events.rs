//! Download lifecycle events delivered to the caller.
//!
//! A single tagged event stream replaces a multi-method listener interface:
//! each accepted request produces zero or more `Progress` events followed by
//! exactly one `Finished` event carrying the terminal outcome.

use std::path::PathBuf;

use image::DynamicImage;

use super::error::ImageError;

/// An event emitted by the download coordinator.
#[derive(Debug)]
pub enum DownloadEvent {
    /// Download progress changed. Percentages are non-decreasing within a
    /// single download and bounded in 0..=100.
    Progress {
        /// The URL being downloaded.
        url: String,
        /// Percentage complete.
        percent: u8,
    },
    /// The download reached its terminal state. Sent exactly once per
    /// accepted request, after any progress events.
    Finished {
        /// The URL the request was issued for.
        url: String,
        /// The terminal outcome.
        outcome: DownloadOutcome,
    },
}

/// The terminal outcome of a single download request.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The payload was decoded into an in-memory image.
    Image {
        /// The decoded image.
        image: DynamicImage,
        /// Filename derived from the URL's last path segment.
        filename: String,
        /// The caller-supplied position, echoed back for correlation.
        position: usize,
    },
    /// The payload was streamed to disk without decoding.
    Saved {
        /// Destination path the bytes were written to.
        path: PathBuf,
        /// Filename derived from the URL's last path segment.
        filename: String,
    },
    /// The download failed.
    Failed {
        /// The classified error.
        error: ImageError,
    },
}

impl DownloadOutcome {
    /// Returns `true` for the `Failed` variant.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns the error for failed outcomes.
    #[must_use]
    pub fn error(&self) -> Option<&ImageError> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_failure_accessors() {
        let outcome = DownloadOutcome::Failed {
            error: ImageError::decode_failed("http://x/y.png"),
        };
        assert!(outcome.is_failure());
        assert!(outcome.error().is_some());

        let outcome = DownloadOutcome::Saved {
            path: PathBuf::from("/tmp/y.png"),
            filename: "y.png".to_string(),
        };
        assert!(!outcome.is_failure());
        assert!(outcome.error().is_none());
    }
}
