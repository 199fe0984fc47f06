pub mod audio;
pub mod capture;
pub mod config;
pub mod session;
pub mod transcript;
pub mod transport;

pub use audio::{
    AudioFrame, AudioProducer, AudioSourceSet, CompositeSource, CompositeStreamBuilder,
    LocalAudioBackend, ProducerId, SourceChange, SourceSetError, SyntheticBackend,
    SyntheticConfig, TrackHandle,
};
pub use capture::{CaptureConfig, CaptureError, CapturePhase, CaptureStopped, Segment, SegmentCapture};
pub use config::Config;
pub use session::{
    HttpJoinService, JoinService, Session, SessionConfig, SessionCredential, SessionEvent,
    SessionHandle, SessionOrchestrator, SessionStats,
};
pub use transcript::{ConsoleDisplay, DisplaySink, TranscriptAccumulator};
pub use transport::{
    EnvelopeDecoder, FragmentDecoder, PlainTextDecoder, SegmentSink, TranscriptFragment,
    TransportGate, TransportState,
};
