use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one transcription session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier
    pub session_id: String,

    /// Room to join
    pub room: String,

    /// Wall-clock length of one audio segment
    pub segment_interval: Duration,

    /// Sample rate the pipeline moves audio at (the transcription
    /// service expects 16kHz)
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono)
    pub channels: u16,

    /// Transcription service WebSocket endpoint
    pub transcriber_url: String,

    /// Session-join endpoint that issues the access credential
    pub join_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            room: "default".to_string(),
            segment_interval: Duration::from_millis(1000),
            sample_rate: 16000,
            channels: 1,
            transcriber_url: "wss://localhost:8443/ws".to_string(),
            join_url: "http://localhost:3000/join-room".to_string(),
        }
    }
}
