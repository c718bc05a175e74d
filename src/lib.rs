//! Image Downloader Library
//!
//! This library provides an asynchronous image download engine: it fetches
//! remote resources over HTTP, reports download progress, decodes payloads
//! into in-memory images or streams them to disk, and notifies the caller
//! through a single tagged event channel.
//!
//! # Architecture
//!
//! All functionality lives in the [`download`] module:
//! - `ImageDownloader` - the coordinator (per-URL dedup, task spawning)
//! - `HttpClient` - HTTP transport with streaming support
//! - `ProgressTracker` - percentage-complete accounting
//! - decode/persist helpers - image decoding and disk persistence
//!
//! # Example
//!
//! ```no_run
//! use image_downloader::{DownloadEvent, ImageDownloader};
//! use tokio::sync::mpsc;
//!
//! # async fn example() {
//! let (events, mut receiver) = mpsc::unbounded_channel();
//! let downloader = ImageDownloader::new(events);
//! downloader.download("https://example.com/photos/cat.png", 0, true);
//!
//! while let Some(event) = receiver.recv().await {
//!     match event {
//!         DownloadEvent::Progress { percent, .. } => println!("{percent}%"),
//!         DownloadEvent::Finished { outcome, .. } => {
//!             println!("done: {outcome:?}");
//!             break;
//!         }
//!     }
//! }
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;

// Re-export commonly used types
pub use download::{
    CoordinatorError, DEFAULT_CONCURRENCY, DownloadEvent, DownloadOutcome, DownloadRequest,
    HttpClient, ImageDownloader, ImageError, Mode, ProgressTracker, decode_bytes, percent,
    read_image_from_disk, save_image,
};
