use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Statistics about a running session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Producers currently in the source set
    pub producers: usize,

    /// Composition changes that requested a capture restart
    pub restarts_requested: u64,

    /// Capture sessions actually launched (coalescing collapses
    /// rapid restarts, so this can be far lower than the above)
    pub captures_started: u64,

    /// Segments closed by capture
    pub segments_produced: u64,

    /// Segments that reached the wire
    pub segments_sent: u64,

    /// Segments dropped while the transport was not open
    pub segments_dropped: u64,

    /// Transcript fragments folded into the buffer
    pub fragments_received: u64,
}

/// Counter backing shared between the session loop and its handle.
#[derive(Debug, Default)]
pub(crate) struct StatsInner {
    pub(crate) producers: AtomicUsize,
    pub(crate) restarts_requested: AtomicU64,
    pub(crate) captures_started: AtomicU64,
    pub(crate) segments_produced: AtomicU64,
    pub(crate) segments_sent: AtomicU64,
    pub(crate) segments_dropped: AtomicU64,
    pub(crate) fragments_received: AtomicU64,
}

impl StatsInner {
    pub(crate) fn snapshot(&self, started_at: DateTime<Utc>) -> SessionStats {
        let duration = Utc::now().signed_duration_since(started_at);
        SessionStats {
            started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            producers: self.producers.load(Ordering::SeqCst),
            restarts_requested: self.restarts_requested.load(Ordering::SeqCst),
            captures_started: self.captures_started.load(Ordering::SeqCst),
            segments_produced: self.segments_produced.load(Ordering::SeqCst),
            segments_sent: self.segments_sent.load(Ordering::SeqCst),
            segments_dropped: self.segments_dropped.load(Ordering::SeqCst),
            fragments_received: self.fragments_received.load(Ordering::SeqCst),
        }
    }
}
