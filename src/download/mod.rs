//! Asynchronous image download engine.
//!
//! This module provides the coordinator, transport, and persistence pieces
//! for downloading images over HTTP with progress reporting.
//!
//! # Features
//!
//! - Per-URL deduplication (at most one concurrent download per URL)
//! - Streaming transfers with non-decreasing progress percentages
//! - Decode-to-memory and stream-to-path retrieval modes
//! - Typed error taxonomy covering transport, decode, and storage failures
//! - Exactly one terminal event per accepted request
//!
//! # Example
//!
//! ```no_run
//! use image_downloader::download::ImageDownloader;
//! use tokio::sync::mpsc;
//!
//! # async fn example() {
//! let (events, mut receiver) = mpsc::unbounded_channel();
//! let downloader = ImageDownloader::new(events);
//! downloader.download("https://example.com/photos/cat.png", 0, true);
//! let terminal = receiver.recv().await;
//! # }
//! ```

mod client;
mod constants;
mod coordinator;
mod decode;
mod error;
mod events;
mod filename;
mod persist;
mod progress;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, JPEG_QUALITY, READ_TIMEOUT_SECS};
pub use coordinator::{
    CoordinatorError, DEFAULT_CONCURRENCY, DownloadRequest, ImageDownloader, Mode,
};
pub use decode::{decode_bytes, read_image_from_disk};
pub use error::ImageError;
pub use events::{DownloadEvent, DownloadOutcome};
pub use persist::save_image;
pub use progress::{ProgressTracker, percent};

// Note: no module-local Result aliases. Use `Result<T, ImageError>`
// explicitly in function signatures.
