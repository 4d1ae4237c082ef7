//! Sentinel-delimited framing of the byte stream.
//!
//! Frames are terminated by U+2404 (`E2 90 84` in UTF-8). Bytes are buffered
//! across reads so both frames and sentinels may straddle chunk boundaries.
//! Candidates of two bytes or fewer are padding and are dropped silently.

use tracing::{debug, warn};

/// Frame terminator.
pub const SENTINEL: char = '\u{2404}';

/// UTF-8 encoding of [`SENTINEL`].
pub const SENTINEL_BYTES: &[u8] = "\u{2404}".as_bytes();

/// Candidates at or below this length are discarded as noise.
pub const NOISE_BYTES: usize = 2;

pub(crate) const FRAMER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::framer");

/// Output of the framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// A complete frame, without its terminator.
    Frame(Vec<u8>),
    /// Buffered bytes exceeded the frame limit and were dropped.
    Oversized {
        /// Number of bytes buffered when the limit was hit.
        size: usize,
        /// Configured limit.
        limit: usize,
    },
}

/// Incremental splitter for sentinel-terminated frames.
#[derive(Debug)]
pub struct Framer {
    buffer: Vec<u8>,
    scanned: usize,
    limit: usize,
    discarding: bool,
}

impl Framer {
    /// Creates a framer that refuses to buffer more than `limit` bytes.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            limit,
            discarding: false,
        }
    }

    /// Feeds a chunk and returns the events it completes, in stream order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<FrameEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(frame) = self.next_candidate() {
            if self.discarding {
                // Tail of an oversized frame.
                self.discarding = false;
                continue;
            }
            if let Some(event) = self.classify(frame) {
                events.push(event);
            }
        }

        if self.discarding {
            self.retain_sentinel_prefix();
        } else if self.buffer.len() > self.limit {
            warn!(
                target: FRAMER_TARGET,
                size = self.buffer.len(),
                limit = self.limit,
                "frame exceeds limit; discarding until next sentinel"
            );
            events.push(FrameEvent::Oversized {
                size: self.buffer.len(),
                limit: self.limit,
            });
            self.discarding = true;
            self.retain_sentinel_prefix();
        }
        events
    }

    /// Flushes an unterminated remainder at end of input.
    pub fn finish(&mut self) -> Option<FrameEvent> {
        let remainder = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        self.classify(remainder)
    }

    /// Number of bytes waiting for a terminator.
    #[must_use]
    pub const fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn classify(&self, frame: Vec<u8>) -> Option<FrameEvent> {
        if frame.len() <= NOISE_BYTES {
            debug!(target: FRAMER_TARGET, len = frame.len(), "dropping noise frame");
            return None;
        }
        if frame.len() > self.limit {
            return Some(FrameEvent::Oversized {
                size: frame.len(),
                limit: self.limit,
            });
        }
        Some(FrameEvent::Frame(frame))
    }

    fn next_candidate(&mut self) -> Option<Vec<u8>> {
        let start = self.scanned;
        let offset = self
            .buffer
            .get(start..)?
            .windows(SENTINEL_BYTES.len())
            .position(|window| window == SENTINEL_BYTES);
        if let Some(offset) = offset {
            let end = start + offset;
            let frame = self
                .buffer
                .drain(..end + SENTINEL_BYTES.len())
                .take(end)
                .collect();
            self.scanned = 0;
            Some(frame)
        } else {
            self.scanned = self.buffer.len().saturating_sub(SENTINEL_BYTES.len() - 1);
            None
        }
    }

    /// Keeps only the bytes that could begin a split sentinel.
    fn retain_sentinel_prefix(&mut self) {
        let keep = SENTINEL_BYTES.len() - 1;
        let cut = self.buffer.len().saturating_sub(keep);
        self.buffer.drain(..cut);
        self.scanned = 0;
    }
}
