use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::audio::{AudioFrame, CompositeSource, ProducerId};

use super::mixdown;
use super::segment::Segment;

/// Per-feed fan-in capacity inside one capture session.
const FRAME_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("composite source has no producers")]
    NoSource,
    #[error("a capture session is already running")]
    AlreadyRunning,
}

/// Completion notice emitted by a capture task as it exits. The
/// generation ties it to the session it belongs to, so a stale notice
/// can never be confused with the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureStopped {
    pub generation: u64,
}

/// Capture cadence and the audio format frames are expected in.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Wall-clock length of one segment window
    pub segment_interval: Duration,
    /// Expected sample rate; mismatching frames are dropped
    pub sample_rate: u32,
    /// Expected channel count; mismatching frames are dropped
    pub channels: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            segment_interval: Duration::from_millis(1000),
            sample_rate: 16000,
            channels: 1,
        }
    }
}

/// Observable lifecycle phase of the capture owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Active,
    Stopping,
}

enum CaptureState {
    Idle,
    Active {
        generation: u64,
        members: Vec<ProducerId>,
        cancel: watch::Sender<bool>,
    },
    Stopping {
        generation: u64,
        // Keeps the cancel channel alive until the task confirms exit.
        _cancel: watch::Sender<bool>,
    },
}

/// Owner of the single capture session.
///
/// At most one session is active at a time; composition changes route
/// through `restart`, which serializes teardown and relaunch through
/// the `stopping` phase. Rapid restarts coalesce: the pending slot
/// holds at most one composite and the latest one wins.
pub struct SegmentCapture {
    config: CaptureConfig,
    state: CaptureState,
    /// Latest composite parked while a stop is in flight.
    pending: Option<CompositeSource>,
    segments_tx: mpsc::UnboundedSender<Segment>,
    stopped_tx: mpsc::UnboundedSender<CaptureStopped>,
    next_generation: u64,
}

impl SegmentCapture {
    /// Closed segments go to `segments_tx`; task-exit notices go to
    /// `stopped_tx` and must be routed back via `on_session_stopped`.
    pub fn new(
        config: CaptureConfig,
        segments_tx: mpsc::UnboundedSender<Segment>,
        stopped_tx: mpsc::UnboundedSender<CaptureStopped>,
    ) -> Self {
        Self {
            config,
            state: CaptureState::Idle,
            pending: None,
            segments_tx,
            stopped_tx,
            next_generation: 0,
        }
    }

    pub fn phase(&self) -> CapturePhase {
        match self.state {
            CaptureState::Idle => CapturePhase::Idle,
            CaptureState::Active { .. } => CapturePhase::Active,
            CaptureState::Stopping { .. } => CapturePhase::Stopping,
        }
    }

    /// Members of the active session, if one is running.
    pub fn active_members(&self) -> Option<Vec<ProducerId>> {
        match &self.state {
            CaptureState::Active { members, .. } => Some(members.clone()),
            _ => None,
        }
    }

    /// Number of capture sessions launched so far.
    pub fn sessions_started(&self) -> u64 {
        self.next_generation
    }

    /// Launch a session over `composite`. Callers must never use this
    /// to replace a running session; that is `restart`'s job.
    pub fn start(&mut self, composite: CompositeSource) -> Result<(), CaptureError> {
        if !matches!(self.state, CaptureState::Idle) {
            return Err(CaptureError::AlreadyRunning);
        }
        if composite.is_empty() {
            return Err(CaptureError::NoSource);
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        let members = composite.member_ids();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        tokio::spawn(run_capture(
            generation,
            composite,
            self.config.clone(),
            cancel_rx,
            self.segments_tx.clone(),
            self.stopped_tx.clone(),
        ));

        info!(
            generation,
            members = members.len(),
            interval_ms = self.config.segment_interval.as_millis() as u64,
            "capture session started"
        );

        self.state = CaptureState::Active {
            generation,
            members,
            cancel: cancel_tx,
        };
        Ok(())
    }

    /// Signal the active session to wind down. No segment whose window
    /// opens after this call will be delivered; the partial window in
    /// flight is still flushed if it holds audio. No-op when idle or
    /// already stopping.
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.state, CaptureState::Idle) {
            CaptureState::Active {
                generation, cancel, ..
            } => {
                let _ = cancel.send(true);
                debug!(generation, "capture session stopping");
                self.state = CaptureState::Stopping {
                    generation,
                    _cancel: cancel,
                };
            }
            other => self.state = other,
        }
    }

    /// Stop-then-start against a rebuilt composite. While a stop is in
    /// flight the composite is parked instead, and repeated calls
    /// overwrite the parked slot: intermediate composites are
    /// coalesced, only the latest is captured. An empty composite
    /// stops capture without relaunching.
    pub fn restart(&mut self, composite: CompositeSource) -> Result<(), CaptureError> {
        match self.phase() {
            CapturePhase::Idle => {
                if composite.is_empty() {
                    debug!("restart with no producers; capture stays idle");
                    return Ok(());
                }
                self.start(composite)
            }
            CapturePhase::Active => {
                self.stop();
                self.pending = (!composite.is_empty()).then_some(composite);
                Ok(())
            }
            CapturePhase::Stopping => {
                debug!("restart while stopping; latest composite wins");
                self.pending = (!composite.is_empty()).then_some(composite);
                Ok(())
            }
        }
    }

    /// Route a task-exit notice back in. Stale generations are
    /// ignored; a current one completes the stop and launches the
    /// parked composite if there is one.
    pub fn on_session_stopped(&mut self, stopped: CaptureStopped) {
        let current = match &self.state {
            CaptureState::Active { generation, .. }
            | CaptureState::Stopping { generation, .. } => Some(*generation),
            CaptureState::Idle => None,
        };
        if current != Some(stopped.generation) {
            debug!(generation = stopped.generation, "stale capture stop ignored");
            return;
        }

        self.state = CaptureState::Idle;
        debug!(generation = stopped.generation, "capture session stopped");

        if let Some(composite) = self.pending.take() {
            if let Err(e) = self.start(composite) {
                warn!("pending capture failed to start: {e}");
            }
        }
    }

    /// Drop the parked composite. Used on teardown so a completing
    /// stop does not relaunch capture.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }
}

/// One capture session: fans every member feed into a frame channel,
/// buffers frames per member, and closes a segment window on every
/// tick. On cancellation the partial window is flushed before the
/// stop notice is emitted, so the partial always precedes the notice
/// (and therefore any successor session's output) in channel order.
async fn run_capture(
    generation: u64,
    composite: CompositeSource,
    config: CaptureConfig,
    cancel: watch::Receiver<bool>,
    segments: mpsc::UnboundedSender<Segment>,
    stopped: mpsc::UnboundedSender<CaptureStopped>,
) {
    let started = Instant::now();
    let member_count = composite.len();

    let (frames_tx, mut frames_rx) = mpsc::channel::<(usize, AudioFrame)>(FRAME_CHANNEL_CAPACITY);
    for (slot, feed) in composite.into_feeds().into_iter().enumerate() {
        let tx = frames_tx.clone();
        let mut cancel = cancel.clone();
        let id = feed.id;
        let mut frames = feed.frames;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    changed = cancel.changed() => {
                        if changed.is_err() || *cancel.borrow() {
                            break;
                        }
                    }
                    frame = frames.recv() => match frame {
                        Ok(frame) => {
                            if tx.send((slot, frame)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(missed)) => {
                            warn!(producer = %id, missed, "capture fell behind producer; frames skipped");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        });
    }
    drop(frames_tx);

    let mut windows: Vec<Vec<i16>> = vec![Vec::new(); member_count];
    let mut sequence: u64 = 0;
    let mut window_start = started;
    let mut ticker =
        tokio::time::interval_at(started + config.segment_interval, config.segment_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut cancel = cancel;

    loop {
        tokio::select! {
            biased;
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                flush_window(&mut windows, &mut sequence, &mut window_start, started, &segments);
            }
            frame = frames_rx.recv() => match frame {
                Some((slot, frame)) => buffer_frame(&mut windows[slot], frame, &config),
                // Every member feed has ended; wind the session down.
                None => break,
            },
        }
    }

    // Partial audio up to the stop point may contain real speech; it
    // is delivered, not discarded.
    flush_window(&mut windows, &mut sequence, &mut window_start, started, &segments);

    let _ = stopped.send(CaptureStopped { generation });
    debug!(generation, segments = sequence, "capture task exited");
}

fn buffer_frame(window: &mut Vec<i16>, frame: AudioFrame, config: &CaptureConfig) {
    if frame.sample_rate != config.sample_rate {
        warn!(
            "frame sample rate mismatch: expected {}, got {}; frame dropped",
            config.sample_rate, frame.sample_rate
        );
        return;
    }
    if frame.channels != config.channels {
        warn!(
            "frame channel count mismatch: expected {}, got {}; frame dropped",
            config.channels, frame.channels
        );
        return;
    }
    window.extend_from_slice(&frame.samples);
}

/// Close the current window: mix, encode, deliver. Windows with no
/// audio are skipped and do not consume a sequence number.
fn flush_window(
    windows: &mut [Vec<i16>],
    sequence: &mut u64,
    window_start: &mut Instant,
    session_start: Instant,
    segments: &mpsc::UnboundedSender<Segment>,
) {
    let now = Instant::now();

    if windows.iter().any(|w| !w.is_empty()) {
        let mixed = mixdown::mix_windows(windows);
        let segment = Segment {
            sequence: *sequence,
            data: mixdown::encode_pcm(&mixed),
            start_ms: window_start.duration_since(session_start).as_millis() as u64,
            end_ms: now.duration_since(session_start).as_millis() as u64,
        };
        *sequence += 1;

        debug!(
            sequence = segment.sequence,
            bytes = segment.data.len(),
            "segment closed"
        );
        if segments.send(segment).is_err() {
            debug!("segment sink gone; closed window dropped");
        }
        for window in windows.iter_mut() {
            window.clear();
        }
    } else {
        debug!("empty capture window skipped");
    }

    *window_start = now;
}
