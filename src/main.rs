use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use room_scribe::{
    Config, ConsoleDisplay, EnvelopeDecoder, HttpJoinService, Session, SessionConfig,
    SyntheticBackend, SyntheticConfig,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "room-scribe",
    about = "Streams composite room audio to a transcription service"
)]
struct Args {
    /// Config file (without extension, any format the config crate reads)
    #[arg(long, default_value = "config/room-scribe")]
    config: String,

    /// Room to join
    #[arg(long, default_value = "default")]
    room: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} starting", cfg.service.name);

    let session_config = SessionConfig {
        room: args.room,
        segment_interval: Duration::from_millis(cfg.audio.segment_interval_ms),
        sample_rate: cfg.audio.sample_rate,
        channels: cfg.audio.channels,
        transcriber_url: cfg.transcriber.ws_url,
        join_url: cfg.service.join_url,
        ..SessionConfig::default()
    };

    let join = HttpJoinService::new(session_config.join_url.clone());
    let local_audio = Box::new(SyntheticBackend::new(SyntheticConfig {
        sample_rate: session_config.sample_rate,
        channels: session_config.channels,
        ..SyntheticConfig::default()
    }));

    let session = Session::connect(
        session_config,
        &join,
        local_audio,
        Box::new(EnvelopeDecoder),
        Box::new(ConsoleDisplay),
    )
    .await?;

    info!("Session running; ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    let stats = session.disconnect().await;
    info!(
        "Session finished: {} segments sent, {} dropped, {} transcript fragments",
        stats.segments_sent, stats.segments_dropped, stats.fragments_received
    );

    Ok(())
}
