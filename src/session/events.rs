use crate::audio::TrackHandle;
use crate::transport::SegmentSink;

/// Everything the session loop reacts to, multiplexed onto one
/// channel so handling order is the arrival order.
pub enum SessionEvent {
    /// Membership: a participant entered the room.
    ParticipantConnected { identity: String },
    /// Membership: a participant left the room. May arrive before the
    /// participant's audio-subscription handshake completes.
    ParticipantDisconnected { identity: String },
    /// Membership: a participant's audio track became subscribable.
    TrackSubscribed { identity: String, track: TrackHandle },
    /// Membership: a participant's audio track went away.
    TrackUnsubscribed { identity: String },
    /// The local microphone handshake completed.
    LocalAudioReady(TrackHandle),
    /// The transport handshake completed.
    TransportOpened(Box<dyn SegmentSink>),
    /// The transport closed or failed.
    TransportClosed,
    /// Raw inbound text from the transcription service.
    InboundText(String),
    /// Ordered teardown request.
    Shutdown,
}
