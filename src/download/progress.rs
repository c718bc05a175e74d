//! Progress accounting for streamed downloads.

/// Computes the completion percentage for a transfer.
///
/// `floor(bytes_read * 100 / total)`, clamped to 0..=100. A zero total
/// yields 0 (callers reject zero-length transfers before streaming).
#[must_use]
pub fn percent(bytes_read: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = bytes_read.saturating_mul(100) / total;
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Tracks cumulative bytes read against a known total and reports
/// percentage changes.
///
/// Samples are non-decreasing within a tracker's lifetime; duplicate
/// consecutive values are suppressed so the listener is not flooded with
/// identical percentages.
#[derive(Debug)]
pub struct ProgressTracker {
    total: u64,
    bytes_read: u64,
    last_emitted: Option<u8>,
}

impl ProgressTracker {
    /// Creates a tracker for a transfer of `total` bytes.
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            total,
            bytes_read: 0,
            last_emitted: None,
        }
    }

    /// Records `chunk_len` more bytes read and returns the new percentage
    /// if it changed since the last emitted sample.
    pub fn advance(&mut self, chunk_len: u64) -> Option<u8> {
        self.bytes_read = self.bytes_read.saturating_add(chunk_len);
        let pct = percent(self.bytes_read, self.total);
        if self.last_emitted == Some(pct) {
            None
        } else {
            self.last_emitted = Some(pct);
            Some(pct)
        }
    }

    /// Total bytes recorded so far.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}
