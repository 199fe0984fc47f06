//! Duplex transport to the transcription service
//!
//! Outbound: opaque binary audio segments, gated on readiness with a
//! deliberate drop-when-not-open policy. Inbound: transcript text
//! fragments, decoded through a pluggable step.

pub mod gate;
pub mod messages;
pub mod ws;

pub use gate::{SegmentSink, TransportGate, TransportState};
pub use messages::{
    EnvelopeDecoder, FragmentDecoder, PlainTextDecoder, TranscriptFragment, TranscriptionEnvelope,
};
