pub mod composite;
pub mod frame;
pub mod producer;
pub mod sources;
pub mod synthetic;

pub use composite::{CompositeSource, CompositeStreamBuilder, ProducerFeed};
pub use frame::{AudioFrame, TrackHandle, DEFAULT_TRACK_CAPACITY};
pub use producer::{AudioProducer, ProducerId};
pub use sources::{AudioSourceSet, SourceChange, SourceSetError};
pub use synthetic::{LocalAudioBackend, SyntheticBackend, SyntheticConfig};
