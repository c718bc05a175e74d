//! HTTP transport for image downloads.
//!
//! This module provides the `HttpClient` struct which performs a single GET
//! per call, classifies transport failures, and hands the streaming response
//! body to the caller.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::ImageError;

/// HTTP client for downloading images with streaming support.
///
/// This client is designed to be created once and reused for multiple
/// downloads, taking advantage of connection pooling. Each [`get`](Self::get)
/// call opens exactly one logical transfer; the underlying connection is
/// released when the returned response is dropped, on every exit path.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Sends a GET request and returns the response once headers arrive.
    ///
    /// The body has not been read yet; callers consume it via
    /// `bytes_stream()` or `bytes()`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::General`] if:
    /// - the URL is malformed
    /// - the request fails (network error, timeout)
    /// - the server returns a non-success status (4xx, 5xx)
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, ImageError> {
        let parsed = Url::parse(url)
            .map_err(|e| ImageError::general_with_source(format!("invalid URL: {url}"), e))?;

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                ImageError::general(format!("timeout downloading {url}"))
            } else {
                ImageError::general_with_source(format!("network error downloading {url}"), e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::general(format!(
                "HTTP {status} downloading {url}"
            )));
        }

        debug!(
            status = status.as_u16(),
            content_length = declared_content_length(&response),
            "response headers received"
        );

        Ok(response)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Declared Content-Length header value, when present and parseable.
///
/// When reqwest transparently decompresses a gzip body it strips the
/// Content-Length header, so such responses report no length here and a
/// progress-mode download rejects them as an invalid file. Only responses
/// that declare a plain, positive length are downloadable with progress.
pub(crate) fn declared_content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}
