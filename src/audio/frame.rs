use tokio::sync::broadcast;

/// Default fan-out capacity of a track. A capture session that falls
/// this many frames behind a producer starts skipping frames.
pub const DEFAULT_TRACK_CAPACITY: usize = 64;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since the producer started
    pub timestamp_ms: u64,
}

/// The audio-capable handle behind a producer.
///
/// The frame pump (microphone driver or remote-track bridge) pushes
/// frames in; each capture session takes its own subscription, so a
/// composite rebuild always starts from a fresh read position.
#[derive(Debug, Clone)]
pub struct TrackHandle {
    tx: broadcast::Sender<AudioFrame>,
}

impl TrackHandle {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Push a frame to every live subscriber. Frames pushed while no
    /// capture session is subscribed are discarded by the channel.
    pub fn push(&self, frame: AudioFrame) {
        let _ = self.tx.send(frame);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AudioFrame> {
        self.tx.subscribe()
    }
}

impl Default for TrackHandle {
    fn default() -> Self {
        Self::new(DEFAULT_TRACK_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_without_subscribers_is_discarded() {
        let track = TrackHandle::default();
        track.push(AudioFrame {
            samples: vec![1, 2, 3],
            sample_rate: 16000,
            channels: 1,
            timestamp_ms: 0,
        });
        // A subscription taken afterwards starts empty.
        let mut rx = track.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn each_subscription_sees_frames_pushed_after_it() {
        let track = TrackHandle::default();
        let mut first = track.subscribe();
        let mut second = track.subscribe();

        track.push(AudioFrame {
            samples: vec![100; 160],
            sample_rate: 16000,
            channels: 1,
            timestamp_ms: 0,
        });

        assert_eq!(first.recv().await.unwrap().samples.len(), 160);
        assert_eq!(second.recv().await.unwrap().samples.len(), 160);
    }
}
