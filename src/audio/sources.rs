use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use super::producer::{AudioProducer, ProducerId};

#[derive(Debug, Error)]
pub enum SourceSetError {
    #[error("producer {0} is already present")]
    DuplicateProducer(ProducerId),
}

/// Notification raised on every successful mutation. This is the sole
/// propagation path for composition changes, so the rebuild logic can
/// never be bypassed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceChange {
    Added(ProducerId),
    Removed(ProducerId),
}

/// The set of currently active audio producers, in insertion order.
pub struct AudioSourceSet {
    producers: Vec<AudioProducer>,
    changed_tx: mpsc::UnboundedSender<SourceChange>,
}

impl AudioSourceSet {
    /// Returns the set and the change channel its mutations report on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SourceChange>) {
        let (changed_tx, changed_rx) = mpsc::unbounded_channel();
        (
            Self {
                producers: Vec::new(),
                changed_tx,
            },
            changed_rx,
        )
    }

    pub fn add(&mut self, producer: AudioProducer) -> Result<(), SourceSetError> {
        if self.producers.iter().any(|p| p.id == producer.id) {
            return Err(SourceSetError::DuplicateProducer(producer.id));
        }
        let id = producer.id.clone();
        self.producers.push(producer);
        let _ = self.changed_tx.send(SourceChange::Added(id));
        Ok(())
    }

    /// Removing an absent identity is a no-op.
    pub fn remove(&mut self, id: &ProducerId) -> Option<AudioProducer> {
        let pos = self.producers.iter().position(|p| &p.id == id)?;
        let producer = self.producers.remove(pos);
        let _ = self.changed_tx.send(SourceChange::Removed(id.clone()));
        Some(producer)
    }

    /// Insertion-ordered view for composite derivation.
    pub fn snapshot(&self) -> Vec<AudioProducer> {
        self.producers.clone()
    }

    pub fn contains(&self, id: &ProducerId) -> bool {
        self.producers.iter().any(|p| &p.id == id)
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }

    /// Teardown path: drop every producer handle at once. Capture is
    /// already down by the time this runs, so no change notifications
    /// are raised.
    pub fn clear(&mut self) {
        debug!(count = self.producers.len(), "releasing all producers");
        self.producers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::frame::TrackHandle;

    fn producer(id: ProducerId) -> AudioProducer {
        AudioProducer::new(id, TrackHandle::default())
    }

    #[test]
    fn snapshot_is_adds_minus_removes_in_insertion_order() {
        let (mut set, mut changed_rx) = AudioSourceSet::new();

        set.add(producer(ProducerId::Local)).unwrap();
        set.add(producer(ProducerId::participant("alice"))).unwrap();
        set.add(producer(ProducerId::participant("bob"))).unwrap();
        set.remove(&ProducerId::participant("alice"));

        let ids: Vec<ProducerId> = set.snapshot().into_iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![ProducerId::Local, ProducerId::participant("bob")]
        );

        // One notification per successful mutation, in order.
        assert_eq!(
            changed_rx.try_recv().unwrap(),
            SourceChange::Added(ProducerId::Local)
        );
        assert_eq!(
            changed_rx.try_recv().unwrap(),
            SourceChange::Added(ProducerId::participant("alice"))
        );
        assert_eq!(
            changed_rx.try_recv().unwrap(),
            SourceChange::Added(ProducerId::participant("bob"))
        );
        assert_eq!(
            changed_rx.try_recv().unwrap(),
            SourceChange::Removed(ProducerId::participant("alice"))
        );
        assert!(changed_rx.try_recv().is_err());
    }

    #[test]
    fn duplicate_add_fails_and_raises_no_notification() {
        let (mut set, mut changed_rx) = AudioSourceSet::new();

        set.add(producer(ProducerId::participant("alice"))).unwrap();
        let _ = changed_rx.try_recv();

        let err = set
            .add(producer(ProducerId::participant("alice")))
            .unwrap_err();
        assert!(matches!(
            err,
            SourceSetError::DuplicateProducer(ProducerId::Participant(_))
        ));
        assert_eq!(set.len(), 1);
        assert!(changed_rx.try_recv().is_err());
    }

    #[test]
    fn remove_absent_is_noop_without_notification() {
        let (mut set, mut changed_rx) = AudioSourceSet::new();

        assert!(set.remove(&ProducerId::participant("ghost")).is_none());
        assert!(set.is_empty());
        assert!(changed_rx.try_recv().is_err());
    }

    #[test]
    fn local_never_collides_with_a_participant_named_local() {
        let (mut set, _changed_rx) = AudioSourceSet::new();

        set.add(producer(ProducerId::Local)).unwrap();
        set.add(producer(ProducerId::participant("local"))).unwrap();
        assert_eq!(set.len(), 2);
    }
}
