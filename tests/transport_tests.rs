// Integration tests for the transport gate: the deliberate lossy
// policy while not open, ordered delivery while open, and idempotent
// terminal close.

use std::sync::{Arc, Mutex};

use room_scribe::capture::Segment;
use room_scribe::transport::{SegmentSink, TransportGate, TransportState};

#[derive(Clone, Default)]
struct MockSink {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    closed: Arc<Mutex<bool>>,
    failing: Arc<Mutex<bool>>,
}

#[async_trait::async_trait]
impl SegmentSink for MockSink {
    async fn send(&mut self, data: &[u8]) -> anyhow::Result<()> {
        if *self.failing.lock().unwrap() {
            anyhow::bail!("wire failure");
        }
        self.sent.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

fn segment(sequence: u64) -> Segment {
    Segment {
        sequence,
        data: vec![sequence as u8; 4],
        start_ms: sequence * 1000,
        end_ms: (sequence + 1) * 1000,
    }
}

#[tokio::test]
async fn sends_while_connecting_never_reach_the_wire() {
    let mut gate = TransportGate::new();
    assert_eq!(gate.state(), TransportState::Connecting);

    gate.send(segment(0)).await;
    gate.send(segment(1)).await;

    assert_eq!(gate.segments_sent(), 0);
    assert_eq!(gate.segments_dropped(), 2);
}

#[tokio::test]
async fn sends_while_open_arrive_exactly_once_in_order() {
    let mut gate = TransportGate::new();
    let sink = MockSink::default();
    gate.open(Box::new(sink.clone()));
    assert_eq!(gate.state(), TransportState::Open);

    for sequence in 0..3 {
        gate.send(segment(sequence)).await;
    }

    let sent = sink.sent.lock().unwrap().clone();
    assert_eq!(sent, vec![vec![0u8; 4], vec![1u8; 4], vec![2u8; 4]]);
    assert_eq!(gate.segments_sent(), 3);
    assert_eq!(gate.segments_dropped(), 0);
}

#[tokio::test]
async fn close_is_idempotent_and_terminal() {
    let mut gate = TransportGate::new();
    let sink = MockSink::default();
    gate.open(Box::new(sink.clone()));

    gate.close().await;
    gate.close().await;
    assert_eq!(gate.state(), TransportState::Closed);
    assert!(*sink.closed.lock().unwrap());

    // Sends after close drop silently; teardown races are expected.
    gate.send(segment(0)).await;
    assert_eq!(gate.segments_sent(), 0);
    assert_eq!(gate.segments_dropped(), 1);
    assert!(sink.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn open_racing_a_close_is_discarded() {
    let mut gate = TransportGate::new();
    gate.close().await;

    let sink = MockSink::default();
    gate.open(Box::new(sink.clone()));
    assert_eq!(gate.state(), TransportState::Closed);

    gate.send(segment(0)).await;
    assert!(sink.sent.lock().unwrap().is_empty());
    assert_eq!(gate.segments_dropped(), 1);
}

#[tokio::test]
async fn a_write_failure_closes_the_gate() {
    let mut gate = TransportGate::new();
    let sink = MockSink::default();
    *sink.failing.lock().unwrap() = true;
    gate.open(Box::new(sink.clone()));

    gate.send(segment(0)).await;
    assert_eq!(gate.state(), TransportState::Closed);
    assert!(*sink.closed.lock().unwrap());
    assert_eq!(gate.segments_sent(), 0);
    assert_eq!(gate.segments_dropped(), 1);

    // Later sends follow the closed-drop path without erroring.
    gate.send(segment(1)).await;
    assert_eq!(gate.segments_dropped(), 2);
}
