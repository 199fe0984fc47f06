use tokio::sync::broadcast;

use super::frame::AudioFrame;
use super::producer::{AudioProducer, ProducerId};

/// One member's live subscription inside a composite.
pub struct ProducerFeed {
    pub id: ProducerId,
    pub frames: broadcast::Receiver<AudioFrame>,
}

/// The logical sum of all producers in one source-set snapshot.
///
/// A composite is a derived value: it is valid only as long as the
/// snapshot it came from, and any source-set mutation mandates a
/// rebuild. It is never mutated in place.
pub struct CompositeSource {
    feeds: Vec<ProducerFeed>,
}

impl CompositeSource {
    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn member_ids(&self) -> Vec<ProducerId> {
        self.feeds.iter().map(|f| f.id.clone()).collect()
    }

    /// Membership equality, the idempotence check for rebuilds. Media
    /// identity is not deep-compared.
    pub fn same_members(&self, other: &CompositeSource) -> bool {
        self.member_ids() == other.member_ids()
    }

    pub(crate) fn into_feeds(self) -> Vec<ProducerFeed> {
        self.feeds
    }
}

pub struct CompositeStreamBuilder;

impl CompositeStreamBuilder {
    /// Pure derivation: one fresh subscription per producer, in
    /// snapshot order. An empty snapshot yields a composite with zero
    /// sub-sources, which capture treats as "no capture possible".
    pub fn build(snapshot: &[AudioProducer]) -> CompositeSource {
        CompositeSource {
            feeds: snapshot
                .iter()
                .map(|p| ProducerFeed {
                    id: p.id.clone(),
                    frames: p.track.subscribe(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::frame::TrackHandle;

    fn snapshot(ids: &[ProducerId]) -> Vec<AudioProducer> {
        ids.iter()
            .map(|id| AudioProducer::new(id.clone(), TrackHandle::default()))
            .collect()
    }

    #[test]
    fn empty_snapshot_yields_empty_composite() {
        let composite = CompositeStreamBuilder::build(&[]);
        assert!(composite.is_empty());
        assert_eq!(composite.len(), 0);
    }

    #[test]
    fn identical_snapshots_yield_equal_membership() {
        let producers = snapshot(&[ProducerId::Local, ProducerId::participant("alice")]);

        let first = CompositeStreamBuilder::build(&producers);
        let second = CompositeStreamBuilder::build(&producers);
        assert!(first.same_members(&second));
        assert_eq!(
            first.member_ids(),
            vec![ProducerId::Local, ProducerId::participant("alice")]
        );
    }

    #[test]
    fn differing_snapshots_differ_in_membership() {
        let first = CompositeStreamBuilder::build(&snapshot(&[ProducerId::Local]));
        let second = CompositeStreamBuilder::build(&snapshot(&[
            ProducerId::Local,
            ProducerId::participant("bob"),
        ]));
        assert!(!first.same_members(&second));
    }
}
