//! Download coordinator: per-URL dedup, task spawning, and event delivery.
//!
//! The coordinator owns the in-flight URL set, launches one task per unique
//! URL on a bounded worker pool, wires transport, progress accounting, and
//! decode/persist together, and delivers exactly one terminal event per
//! accepted request.
//!
//! # Example
//!
//! ```no_run
//! use image_downloader::download::{DownloadEvent, ImageDownloader};
//! use tokio::sync::mpsc;
//!
//! # async fn example() {
//! let (events, mut receiver) = mpsc::unbounded_channel();
//! let downloader = ImageDownloader::new(events);
//! downloader.download("https://example.com/photos/cat.png", 0, true);
//! while let Some(event) = receiver.recv().await {
//!     if let DownloadEvent::Finished { url, outcome } = event {
//!         println!("{url}: {outcome:?}");
//!         break;
//!     }
//! }
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashSet;
use futures_util::StreamExt;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::{HttpClient, declared_content_length};
use super::constants::MAX_BUFFER_PREALLOC_BYTES;
use super::decode::decode_bytes;
use super::error::ImageError;
use super::events::{DownloadEvent, DownloadOutcome};
use super::filename::filename_from_url;
use super::persist::copy_response_to_path;
use super::progress::ProgressTracker;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Error type for coordinator construction.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// Retrieval mode for a download request.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Buffer the full response, emit progress, decode to memory.
    DecodeWithProgress,
    /// Decode to memory without content-length validation or progress.
    DecodeSilent,
    /// Stream the response body to the given path without decoding.
    StreamToPath(PathBuf),
}

/// An immutable download request.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Source URL.
    pub url: String,
    /// Opaque caller-supplied index, echoed back in decode-mode outcomes.
    pub position: usize,
    /// Retrieval mode.
    pub mode: Mode,
}

/// Coordinates concurrent image downloads with per-URL deduplication.
///
/// # Concurrency Model
///
/// - Each accepted request runs in its own Tokio task
/// - A semaphore bounds the number of tasks downloading at once; dispatch
///   itself never blocks, the permit is acquired inside the task
/// - The in-flight set is checked-and-inserted atomically before any I/O,
///   so two dispatches for the same URL can never both proceed
/// - The URL leaves the in-flight set on every exit path (RAII guard),
///   strictly before the terminal event is sent
///
/// # Event Contract
///
/// Per accepted request: zero or more `Progress` events with non-decreasing
/// percentages, then exactly one `Finished` event. A dispatch deduplicated
/// against an in-flight URL emits nothing.
#[derive(Debug)]
pub struct ImageDownloader {
    client: HttpClient,
    in_flight: Arc<DashSet<String>>,
    semaphore: Arc<Semaphore>,
    events: UnboundedSender<DownloadEvent>,
}

impl ImageDownloader {
    /// Creates a coordinator with the default concurrency limit.
    ///
    /// Events for all requests flow through `events`, correlated by URL and
    /// the caller-supplied position.
    #[must_use]
    pub fn new(events: UnboundedSender<DownloadEvent>) -> Self {
        Self {
            client: HttpClient::new(),
            in_flight: Arc::new(DashSet::new()),
            semaphore: Arc::new(Semaphore::new(DEFAULT_CONCURRENCY)),
            events,
        }
    }

    /// Creates a coordinator with an explicit concurrency limit (1-100).
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::InvalidConcurrency`] if the value is
    /// outside the valid range.
    pub fn with_concurrency(
        events: UnboundedSender<DownloadEvent>,
        concurrency: usize,
    ) -> Result<Self, CoordinatorError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(CoordinatorError::InvalidConcurrency { value: concurrency });
        }
        debug!(concurrency, "creating download coordinator");
        Ok(Self {
            client: HttpClient::new(),
            in_flight: Arc::new(DashSet::new()),
            semaphore: Arc::new(Semaphore::new(concurrency)),
            events,
        })
    }

    /// Downloads the image at `url` and decodes it in memory.
    ///
    /// If a download for `url` is already in flight this is a silent no-op:
    /// no task starts and no event fires. Otherwise the request is accepted,
    /// a task is scheduled, and this method returns immediately.
    ///
    /// With `report_progress` set, the declared content length is validated
    /// and progress events are emitted while the body streams in.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime context.
    #[instrument(skip(self), fields(url = %url))]
    pub fn download(&self, url: &str, position: usize, report_progress: bool) {
        let mode = if report_progress {
            Mode::DecodeWithProgress
        } else {
            Mode::DecodeSilent
        };
        self.dispatch(DownloadRequest {
            url: url.to_string(),
            position,
            mode,
        });
    }

    /// Streams the resource at `url` to `save_path` without decoding.
    ///
    /// Deduplication semantics match [`download`](Self::download).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime context.
    #[instrument(skip(self, save_path), fields(url = %url))]
    pub fn download_to_path(&self, url: &str, save_path: impl Into<PathBuf>) {
        self.dispatch(DownloadRequest {
            url: url.to_string(),
            position: 0,
            mode: Mode::StreamToPath(save_path.into()),
        });
    }

    /// Dispatches a request, deduplicating against in-flight URLs.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime context.
    pub fn dispatch(&self, request: DownloadRequest) {
        // Atomic check-and-insert: `insert` returns false when the URL is
        // already present, so two racing dispatches cannot both proceed.
        if !self.in_flight.insert(request.url.clone()) {
            warn!(
                url = %request.url,
                "a download for this url is already running, no further download will be started"
            );
            return;
        }

        let guard = InFlightGuard {
            set: Arc::clone(&self.in_flight),
            url: request.url.clone(),
        };
        let client = self.client.clone();
        let semaphore = Arc::clone(&self.semaphore);
        let events = self.events.clone();

        tokio::spawn(async move {
            let url = request.url.clone();

            let _permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    // The semaphore is never closed; keep the one-terminal-event
                    // invariant anyway.
                    drop(guard);
                    let _ = events.send(DownloadEvent::Finished {
                        url,
                        outcome: DownloadOutcome::Failed {
                            error: ImageError::general("worker pool closed"),
                        },
                    });
                    return;
                }
            };

            debug!(url = %url, "starting download");
            let outcome = run_request(&client, request, &events).await;

            // The URL must leave the in-flight set before the terminal event
            // fires, so a caller reacting to it can immediately re-dispatch.
            drop(guard);

            if events
                .send(DownloadEvent::Finished { url, outcome })
                .is_err()
            {
                debug!("event receiver dropped before completion");
            }
        });
    }
}

/// Removes the URL from the in-flight set exactly once, on every exit path.
struct InFlightGuard {
    set: Arc<DashSet<String>>,
    url: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.remove(&self.url);
    }
}

/// Runs one request to its terminal outcome. Never panics on I/O.
async fn run_request(
    client: &HttpClient,
    request: DownloadRequest,
    events: &UnboundedSender<DownloadEvent>,
) -> DownloadOutcome {
    let result = match request.mode.clone() {
        Mode::DecodeWithProgress => decode_with_progress(client, &request, events).await,
        Mode::DecodeSilent => decode_silent(client, &request).await,
        Mode::StreamToPath(path) => stream_to_path(client, &request, path).await,
    };

    match result {
        Ok(outcome) => outcome,
        Err(error) => {
            warn!(url = %request.url, error = %error, "download failed");
            DownloadOutcome::Failed { error }
        }
    }
}

/// Decode mode with content-length validation and progress reporting.
async fn decode_with_progress(
    client: &HttpClient,
    request: &DownloadRequest,
    events: &UnboundedSender<DownloadEvent>,
) -> Result<DownloadOutcome, ImageError> {
    let response = client.get(&request.url).await?;

    // A missing or zero content length means the URL is not pointing at a
    // retrievable file of known size; fail before reading the body.
    let Some(total) = declared_content_length(&response).filter(|len| *len > 0) else {
        return Err(ImageError::invalid_file(&request.url));
    };

    let mut tracker = ProgressTracker::new(total);
    // Cap the upfront allocation: a hostile Content-Length large enough to
    // exhaust the allocator would otherwise abort the whole process.
    let prealloc = usize::try_from(total.min(MAX_BUFFER_PREALLOC_BYTES)).unwrap_or(0);
    let mut buffer: Vec<u8> = Vec::with_capacity(prealloc);
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            ImageError::general_with_source(
                format!("network error downloading {}", request.url),
                e,
            )
        })?;
        buffer.extend_from_slice(&chunk);
        if let Some(pct) = tracker.advance(chunk.len() as u64) {
            let _ = events.send(DownloadEvent::Progress {
                url: request.url.clone(),
                percent: pct,
            });
        }
    }

    let Some(image) = decode_on_blocking_pool(buffer).await? else {
        return Err(ImageError::decode_failed(&request.url));
    };

    info!(
        url = %request.url,
        bytes = tracker.bytes_read(),
        "download complete"
    );

    Ok(DownloadOutcome::Image {
        image,
        filename: filename_for(&request.url),
        position: request.position,
    })
}

/// Decode mode without length validation or progress emission.
async fn decode_silent(
    client: &HttpClient,
    request: &DownloadRequest,
) -> Result<DownloadOutcome, ImageError> {
    let response = client.get(&request.url).await?;

    let bytes = response.bytes().await.map_err(|e| {
        ImageError::general_with_source(format!("network error downloading {}", request.url), e)
    })?;

    let byte_count = bytes.len();
    let Some(image) = decode_on_blocking_pool(bytes).await? else {
        return Err(ImageError::decode_failed(&request.url));
    };

    info!(url = %request.url, bytes = byte_count, "download complete");

    Ok(DownloadOutcome::Image {
        image,
        filename: filename_for(&request.url),
        position: request.position,
    })
}

/// Stream-to-path mode: chunked copy to disk, no decoding.
async fn stream_to_path(
    client: &HttpClient,
    request: &DownloadRequest,
    path: PathBuf,
) -> Result<DownloadOutcome, ImageError> {
    let response = client.get(&request.url).await?;
    let bytes_written = copy_response_to_path(response, &path).await?;

    info!(
        url = %request.url,
        path = %path.display(),
        bytes = bytes_written,
        "download complete"
    );

    Ok(DownloadOutcome::Saved {
        path,
        filename: filename_for(&request.url),
    })
}

/// Runs the CPU-bound decode on the blocking thread pool so the async
/// worker is not stalled on large payloads.
async fn decode_on_blocking_pool<B>(bytes: B) -> Result<Option<image::DynamicImage>, ImageError>
where
    B: AsRef<[u8]> + Send + 'static,
{
    tokio::task::spawn_blocking(move || decode_bytes(bytes.as_ref()))
        .await
        .map_err(|e| ImageError::general_with_source("image decode task failed", e))
}

/// Filename derived from the URL's last path segment.
fn filename_for(url: &str) -> String {
    // The URL already passed validation in the transport; the fallback is
    // unreachable in practice.
    Url::parse(url).map_or_else(|_| "download.img".to_string(), |u| filename_from_url(&u))
}
