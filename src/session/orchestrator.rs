use chrono::{DateTime, Utc};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::audio::{
    AudioProducer, AudioSourceSet, CompositeStreamBuilder, ProducerId, SourceChange,
};
use crate::capture::{CaptureConfig, CapturePhase, CaptureStopped, Segment, SegmentCapture};
use crate::transcript::{DisplaySink, TranscriptAccumulator};
use crate::transport::{FragmentDecoder, TransportGate, TransportState};

use super::config::SessionConfig;
use super::events::SessionEvent;
use super::stats::{SessionStats, StatsInner};

/// Handle to a running session loop: event injection plus a stats
/// snapshot. Cloneable; the loop exits when a `Shutdown` event arrives
/// or every handle is gone.
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    stats: Arc<StatsInner>,
    started_at: DateTime<Utc>,
}

impl SessionHandle {
    /// Inject an event; returns false once the loop is gone.
    pub fn emit(&self, event: SessionEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Sender half of the event channel, for collaborator pumps.
    pub fn events(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.events.clone()
    }

    pub fn shutdown(&self) {
        let _ = self.events.send(SessionEvent::Shutdown);
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.snapshot(self.started_at)
    }
}

/// Drives the session lifecycle: membership events mutate the source
/// set, source-set changes rebuild the composite and restart capture,
/// closed segments flow through the transport gate, and inbound text
/// folds into the transcript.
///
/// All component state is owned here and mutated only inside `run`,
/// so event arrival order is the only ordering that matters.
pub struct SessionOrchestrator {
    config: SessionConfig,
    sources: AudioSourceSet,
    changed_rx: mpsc::UnboundedReceiver<SourceChange>,
    capture: SegmentCapture,
    segments_rx: mpsc::UnboundedReceiver<Segment>,
    stopped_rx: mpsc::UnboundedReceiver<CaptureStopped>,
    gate: TransportGate,
    transcript: TranscriptAccumulator,
    decoder: Box<dyn FragmentDecoder>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    stats: Arc<StatsInner>,
}

impl SessionOrchestrator {
    pub fn new(
        config: SessionConfig,
        decoder: Box<dyn FragmentDecoder>,
        display: Box<dyn DisplaySink>,
    ) -> (Self, SessionHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (sources, changed_rx) = AudioSourceSet::new();
        let (segments_tx, segments_rx) = mpsc::unbounded_channel();
        let (stopped_tx, stopped_rx) = mpsc::unbounded_channel();

        let capture = SegmentCapture::new(
            CaptureConfig {
                segment_interval: config.segment_interval,
                sample_rate: config.sample_rate,
                channels: config.channels,
            },
            segments_tx,
            stopped_tx,
        );

        let stats = Arc::new(StatsInner::default());
        let handle = SessionHandle {
            events: events_tx,
            stats: Arc::clone(&stats),
            started_at: Utc::now(),
        };

        let orchestrator = Self {
            config,
            sources,
            changed_rx,
            capture,
            segments_rx,
            stopped_rx,
            gate: TransportGate::new(),
            transcript: TranscriptAccumulator::new(display),
            decoder,
            events_rx,
            stats,
        };

        (orchestrator, handle)
    }

    /// Drive the session until shutdown, then tear down in order:
    /// capture first, transport second, producer handles last.
    pub async fn run(mut self) {
        info!(session = %self.config.session_id, "session loop started");

        loop {
            tokio::select! {
                event = self.events_rx.recv() => match event {
                    Some(SessionEvent::Shutdown) | None => break,
                    Some(event) => self.handle_event(event).await,
                },
                Some(change) = self.changed_rx.recv() => self.handle_source_change(change),
                Some(segment) = self.segments_rx.recv() => self.handle_segment(segment).await,
                Some(stopped) = self.stopped_rx.recv() => self.handle_capture_stopped(stopped),
            }
        }

        self.teardown().await;
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ParticipantConnected { identity } => {
                // The producer joins only once the audio-subscription
                // handshake completes.
                info!(%identity, "participant connected");
            }
            SessionEvent::ParticipantDisconnected { identity } => {
                info!(%identity, "participant disconnected");
                self.remove_producer(ProducerId::participant(identity));
            }
            SessionEvent::TrackSubscribed { identity, track } => {
                self.add_producer(AudioProducer::new(ProducerId::participant(identity), track));
            }
            SessionEvent::TrackUnsubscribed { identity } => {
                self.remove_producer(ProducerId::participant(identity));
            }
            SessionEvent::LocalAudioReady(track) => {
                self.add_producer(AudioProducer::new(ProducerId::Local, track));
            }
            SessionEvent::TransportOpened(sink) => {
                self.gate.open(sink);
                self.start_if_ready();
            }
            SessionEvent::TransportClosed => self.gate.close().await,
            SessionEvent::InboundText(text) => self.handle_inbound(text),
            // Handled in run()
            SessionEvent::Shutdown => {}
        }
    }

    fn add_producer(&mut self, producer: AudioProducer) {
        let id = producer.id.clone();
        match self.sources.add(producer) {
            Ok(()) => {
                info!(producer = %id, total = self.sources.len(), "producer added");
                self.stats
                    .producers
                    .store(self.sources.len(), Ordering::SeqCst);
            }
            // Misuse class: logged, never session-terminating.
            Err(e) => warn!("{e}"),
        }
    }

    fn remove_producer(&mut self, id: ProducerId) {
        if self.sources.remove(&id).is_some() {
            info!(producer = %id, total = self.sources.len(), "producer removed");
            self.stats
                .producers
                .store(self.sources.len(), Ordering::SeqCst);
        }
    }

    /// The sole rebuild path: every successful source-set mutation
    /// lands here and re-derives the composite.
    fn handle_source_change(&mut self, change: SourceChange) {
        debug!(?change, "source set changed; rebuilding composite");
        self.stats
            .restarts_requested
            .fetch_add(1, Ordering::SeqCst);

        let composite = CompositeStreamBuilder::build(&self.sources.snapshot());
        if let Err(e) = self.capture.restart(composite) {
            warn!("capture restart failed: {e}");
        }
        self.sync_capture_stats();
    }

    /// Transport-open first start: capture may already be running (it
    /// does not wait for the transport), so this only fires when idle.
    fn start_if_ready(&mut self) {
        if self.capture.phase() == CapturePhase::Idle && !self.sources.is_empty() {
            let composite = CompositeStreamBuilder::build(&self.sources.snapshot());
            if let Err(e) = self.capture.start(composite) {
                warn!("capture start failed: {e}");
            }
            self.sync_capture_stats();
        }
    }

    async fn handle_segment(&mut self, segment: Segment) {
        self.stats.segments_produced.fetch_add(1, Ordering::SeqCst);
        debug!(
            sequence = segment.sequence,
            bytes = segment.data.len(),
            "segment ready"
        );
        self.gate.send(segment).await;
        self.stats
            .segments_sent
            .store(self.gate.segments_sent(), Ordering::SeqCst);
        self.stats
            .segments_dropped
            .store(self.gate.segments_dropped(), Ordering::SeqCst);
    }

    fn handle_capture_stopped(&mut self, stopped: CaptureStopped) {
        self.capture.on_session_stopped(stopped);
        self.sync_capture_stats();
    }

    fn handle_inbound(&mut self, text: String) {
        // Fragments count only while the transport is open; one racing
        // a teardown is dropped, not an error.
        if self.gate.state() != TransportState::Open {
            debug!("inbound fragment while transport not open; dropped");
            return;
        }
        if let Some(fragment) = self.decoder.decode(&text) {
            self.transcript.on_fragment(fragment);
            self.stats.fragments_received.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sync_capture_stats(&self) {
        self.stats
            .captures_started
            .store(self.capture.sessions_started(), Ordering::SeqCst);
    }

    /// Ordered teardown: no segment is captured after the transport
    /// that would carry it has closed, and producer handles are never
    /// released while an in-flight capture still references them.
    async fn teardown(&mut self) {
        info!(session = %self.config.session_id, "session teardown");

        let capture_was_live = self.capture.phase() != CapturePhase::Idle;
        self.capture.clear_pending();
        self.capture.stop();

        if capture_was_live {
            // Drain until the stop notice so the final partial window
            // still reaches the transport ahead of close.
            loop {
                tokio::select! {
                    biased;
                    Some(segment) = self.segments_rx.recv() => self.handle_segment(segment).await,
                    stopped = self.stopped_rx.recv() => {
                        if let Some(stopped) = stopped {
                            self.handle_capture_stopped(stopped);
                        }
                        break;
                    }
                }
            }
            // The partial was queued before the notice; forward
            // whatever is left without blocking.
            while let Ok(segment) = self.segments_rx.try_recv() {
                self.handle_segment(segment).await;
            }
        }

        self.gate.close().await;
        self.sources.clear();
        self.stats.producers.store(0, Ordering::SeqCst);

        info!(
            segments_sent = self.gate.segments_sent(),
            segments_dropped = self.gate.segments_dropped(),
            transcript_chars = self.transcript.transcript().len(),
            "session torn down"
        );
    }
}
