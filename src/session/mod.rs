//! Session orchestration
//!
//! This module drives the pipeline lifecycle:
//! - Joining a room and acquiring the local microphone
//! - Wiring membership events to source-set mutations
//! - Wiring source-set changes to capture restarts
//! - Routing segments through the transport gate
//! - Folding inbound fragments into the transcript
//! - Ordered teardown (capture, transport, producers)

mod config;
mod events;
mod join;
mod orchestrator;
mod session;
mod stats;

pub use config::SessionConfig;
pub use events::SessionEvent;
pub use join::{HttpJoinService, JoinService, SessionCredential};
pub use orchestrator::{SessionHandle, SessionOrchestrator};
pub use session::Session;
pub use stats::SessionStats;
