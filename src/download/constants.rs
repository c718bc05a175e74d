//! Constants for the download module (timeouts, encoding quality).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large images).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// JPEG encoding quality used when persisting decoded images (maximum).
pub const JPEG_QUALITY: u8 = 100;

/// Upper bound on upfront buffer preallocation from a declared content
/// length (8 MiB). The declared value is remote input and must not be
/// trusted with an allocation; the buffer still grows past this as real
/// bytes arrive.
pub(crate) const MAX_BUFFER_PREALLOC_BYTES: u64 = 8 * 1024 * 1024;
