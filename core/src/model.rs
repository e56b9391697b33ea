//! Core data model: [`Stream`], [`StreamTask`], [`AlertEntry`], [`TriggerKey`].

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// One record per broadcaster, keyed by lowercase channel login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stream {
    /// Stable, lowercase channel login.
    pub id: String,
    /// Timestamp of the last roster observation, as milliseconds since
    /// the Unix epoch (monotonically non-decreasing per stream).
    pub updated: i64,
    /// True iff the last roster cycle observed this broadcast.
    pub online: bool,
    /// Cached media-playlist URL. May be stale; re-resolved on fast-path
    /// failure.
    pub url: Option<String>,
    /// Last successful OCR result, at most 4 entries, in index order.
    /// Empty if never analyzed or the most recent frame yielded none.
    pub player_names: Vec<String>,
}

impl Stream {
    /// Creates a freshly-seen stream record (as produced by the roster
    /// fetcher on first observation).
    pub fn new(id: impl Into<String>, updated: i64) -> Self {
        Self {
            id: id.into(),
            updated,
            online: true,
            url: None,
            player_names: Vec::new(),
        }
    }
}

/// A decoded video frame, represented as the encoded bytes a subprocess
/// collaborator (frame grabber, image tool, OCR service) produces or
/// consumes. The core never decodes pixels itself.
#[derive(Debug, Clone)]
pub struct Frame {
    pub bytes: bytes::Bytes,
}

impl Frame {
    pub fn new(bytes: impl Into<bytes::Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

/// Per-cycle in-memory value handed from a fetch worker to a process worker.
///
/// Ownership transfers through the channel: the fetch worker builds the
/// post-fetch value once (frame/error included) and sends it by value, so
/// the process worker reads an immutable struct with no shared mutable
/// state.
#[derive(Debug, Clone)]
pub struct StreamTask {
    pub index: usize,
    pub stream: Stream,
    pub frame: Option<Frame>,
    pub error: bool,
}

impl StreamTask {
    pub fn pending(index: usize, stream: Stream) -> Self {
        Self {
            index,
            stream,
            frame: None,
            error: false,
        }
    }

    pub fn with_result(self, frame: Option<Frame>, error: bool) -> Self {
        Self {
            frame,
            error,
            ..self
        }
    }
}

/// Configured alert: the streamer to warn, and the nickname queries
/// considered "enemies".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEntry {
    pub streamer: String,
    pub queries: Vec<String>,
}

/// Dedupe key for the alert loop's TTL cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriggerKey {
    pub alerted_streamer: String,
    pub matched_streamer: String,
}

/// Returns the current time as milliseconds since the Unix epoch.
///
/// Centralizes the one non-deterministic clock read so tests can avoid it
/// by constructing `Stream`/cycle timestamps directly.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Monotonic instant, re-exported so callers needn't depend on `std::time`
/// directly for TTL bookkeeping.
pub type MonoInstant = Instant;
