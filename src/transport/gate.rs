use anyhow::Result;
use tracing::{debug, info, warn};

use crate::capture::Segment;

/// Connection readiness of the duplex transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Open,
    Closed,
}

/// Outbound half of the duplex transport: one opaque binary message
/// per segment.
#[async_trait::async_trait]
pub trait SegmentSink: Send {
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Close the outbound half. Called at most once.
    async fn close(&mut self) -> Result<()>;
}

/// Gates outbound segments on transport readiness.
///
/// Segments submitted while the transport is `connecting` or `closed`
/// are dropped, not queued: buffering would grow without bound during
/// a long pre-connection window, and stale audio has little value once
/// the live session has moved on. `closed` is terminal.
pub struct TransportGate {
    state: TransportState,
    sink: Option<Box<dyn SegmentSink>>,
    sent: u64,
    dropped: u64,
}

impl TransportGate {
    pub fn new() -> Self {
        Self {
            state: TransportState::Connecting,
            sink: None,
            sent: 0,
            dropped: 0,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn segments_sent(&self) -> u64 {
        self.sent
    }

    pub fn segments_dropped(&self) -> u64 {
        self.dropped
    }

    /// Handshake completion: `connecting → open`. An open that lost a
    /// race against `close` is discarded.
    pub fn open(&mut self, sink: Box<dyn SegmentSink>) {
        match self.state {
            TransportState::Connecting => {
                self.sink = Some(sink);
                self.state = TransportState::Open;
                info!("transport open");
            }
            TransportState::Open => warn!("duplicate transport open ignored"),
            TransportState::Closed => debug!("transport open raced with close; discarded"),
        }
    }

    /// Transmit while `open`, in submission order; drop silently
    /// otherwise. A write failure closes the gate and is logged, never
    /// propagated.
    pub async fn send(&mut self, segment: Segment) {
        if self.state != TransportState::Open {
            self.dropped += 1;
            debug!(
                sequence = segment.sequence,
                state = ?self.state,
                "segment dropped: transport not open"
            );
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            self.dropped += 1;
            return;
        };

        match sink.send(&segment.data).await {
            Ok(()) => self.sent += 1,
            Err(e) => {
                self.dropped += 1;
                warn!("transport write failed: {e:#}; closing");
                self.close().await;
            }
        }
    }

    /// Idempotent; terminal. Sends submitted afterwards drop silently,
    /// since teardown racing an in-flight capture is expected.
    pub async fn close(&mut self) {
        if self.state == TransportState::Closed {
            return;
        }
        self.state = TransportState::Closed;
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.close().await {
                debug!("transport close error ignored: {e:#}");
            }
        }
        info!(sent = self.sent, dropped = self.dropped, "transport closed");
    }
}

impl Default for TransportGate {
    fn default() -> Self {
        Self::new()
    }
}
