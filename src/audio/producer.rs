use std::fmt;

use super::frame::TrackHandle;

/// Identity of an audio producer.
///
/// The local microphone holds a reserved identity that can never
/// collide with a participant identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProducerId {
    /// The local microphone.
    Local,
    /// A remote participant, keyed by their room identity.
    Participant(String),
}

impl ProducerId {
    pub fn participant(identity: impl Into<String>) -> Self {
        ProducerId::Participant(identity.into())
    }
}

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProducerId::Local => write!(f, "local"),
            ProducerId::Participant(identity) => write!(f, "{identity}"),
        }
    }
}

/// One audio source in the session: identity plus the track to
/// subscribe to. Owned by the source set for the duration of its
/// membership; the handle is released back to its origin on removal.
#[derive(Debug, Clone)]
pub struct AudioProducer {
    pub id: ProducerId,
    pub track: TrackHandle,
}

impl AudioProducer {
    pub fn new(id: ProducerId, track: TrackHandle) -> Self {
        Self { id, track }
    }
}
