use serde::{Deserialize, Serialize};
use tracing::debug;

/// One piece of incremental transcript text, with optional speaker
/// attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFragment {
    pub participant: Option<String>,
    pub text: String,
}

/// Wire form used by the richer transcription service variant.
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptionEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub participant: String,
    pub text: String,
}

/// Decode step between raw inbound text and the accumulator. `None`
/// means the message carries no transcript fragment and is skipped.
pub trait FragmentDecoder: Send {
    fn decode(&self, raw: &str) -> Option<TranscriptFragment>;
}

/// Minimal-display variant: every text message is a fragment.
pub struct PlainTextDecoder;

impl FragmentDecoder for PlainTextDecoder {
    fn decode(&self, raw: &str) -> Option<TranscriptFragment> {
        Some(TranscriptFragment {
            participant: None,
            text: raw.to_owned(),
        })
    }
}

/// Richer variant: JSON envelopes tagged `"transcription"`. Unknown
/// message types and undecodable payloads are skipped, never errors.
pub struct EnvelopeDecoder;

impl FragmentDecoder for EnvelopeDecoder {
    fn decode(&self, raw: &str) -> Option<TranscriptFragment> {
        match serde_json::from_str::<TranscriptionEnvelope>(raw) {
            Ok(envelope) if envelope.kind == "transcription" => Some(TranscriptFragment {
                participant: Some(envelope.participant),
                text: envelope.text,
            }),
            Ok(envelope) => {
                debug!(kind = %envelope.kind, "unknown inbound message type skipped");
                None
            }
            Err(e) => {
                debug!("undecodable inbound message skipped: {e}");
                None
            }
        }
    }
}
