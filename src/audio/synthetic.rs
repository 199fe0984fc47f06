use anyhow::Result;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use super::frame::{AudioFrame, TrackHandle};

/// Local audio capture seam.
///
/// Acquiring the device is an asynchronous handshake; the local
/// producer only joins the session once it completes. Acquisition
/// failure aborts session start.
#[async_trait::async_trait]
pub trait LocalAudioBackend: Send {
    /// Perform the capture handshake and return the local track.
    async fn acquire(&mut self) -> Result<TrackHandle>;

    /// Release the device. Safe to call after a failed acquire.
    async fn release(&mut self) -> Result<()>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Configuration for the synthetic frame generator
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Spacing between generated frames
    pub frame_interval: Duration,
    /// Constant sample value of every generated frame
    pub amplitude: i16,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            frame_interval: Duration::from_millis(100),
            amplitude: 1000,
        }
    }
}

/// Deterministic stand-in for a microphone driver: emits fixed-value
/// PCM frames at a fixed spacing until released.
pub struct SyntheticBackend {
    config: SyntheticConfig,
    pump: Option<JoinHandle<()>>,
}

impl SyntheticBackend {
    pub fn new(config: SyntheticConfig) -> Self {
        Self { config, pump: None }
    }
}

#[async_trait::async_trait]
impl LocalAudioBackend for SyntheticBackend {
    async fn acquire(&mut self) -> Result<TrackHandle> {
        if self.pump.is_some() {
            anyhow::bail!("synthetic backend already acquired");
        }

        let track = TrackHandle::default();
        let feeder = track.clone();
        let config = self.config.clone();

        let samples_per_frame = (config.sample_rate as u64
            * config.frame_interval.as_millis() as u64
            / 1000) as usize
            * config.channels as usize;

        self.pump = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.frame_interval);
            let mut elapsed_ms = 0u64;
            loop {
                ticker.tick().await;
                feeder.push(AudioFrame {
                    samples: vec![config.amplitude; samples_per_frame],
                    sample_rate: config.sample_rate,
                    channels: config.channels,
                    timestamp_ms: elapsed_ms,
                });
                elapsed_ms += config.frame_interval.as_millis() as u64;
            }
        }));

        info!(
            "Synthetic audio acquired: {}Hz, {} channels, {}ms frames",
            self.config.sample_rate,
            self.config.channels,
            self.config.frame_interval.as_millis()
        );

        Ok(track)
    }

    async fn release(&mut self) -> Result<()> {
        if let Some(pump) = self.pump.take() {
            pump.abort();
            info!("Synthetic audio released");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
