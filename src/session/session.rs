use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::audio::LocalAudioBackend;
use crate::transcript::DisplaySink;
use crate::transport::{ws, FragmentDecoder};

use super::config::SessionConfig;
use super::events::SessionEvent;
use super::join::JoinService;
use super::orchestrator::{SessionHandle, SessionOrchestrator};
use super::stats::SessionStats;

/// A live transcription session: the event loop plus the transport and
/// local-audio resources it drives.
pub struct Session {
    handle: SessionHandle,
    loop_task: JoinHandle<()>,
    local_audio: Box<dyn LocalAudioBackend>,
}

impl Session {
    /// Join the room, acquire local audio, open the transport, and
    /// start the event loop.
    ///
    /// Environment failures (join, microphone, transport handshake)
    /// abort here and the caller can re-offer the join flow; once this
    /// returns Ok, steady-state failures only degrade the pipeline,
    /// they never abort it.
    pub async fn connect(
        config: SessionConfig,
        join: &dyn JoinService,
        mut local_audio: Box<dyn LocalAudioBackend>,
        decoder: Box<dyn FragmentDecoder>,
        display: Box<dyn DisplaySink>,
    ) -> Result<Self> {
        let credential = join
            .join(&config.room)
            .await
            .context("Session join failed")?;
        info!(room = %config.room, session = %config.session_id, "joined room");

        // Microphone handshake is a precondition for the local producer.
        let track = local_audio
            .acquire()
            .await
            .context("Microphone acquisition failed")?;
        info!(backend = local_audio.name(), "local audio acquired");

        let transcriber_url = format!(
            "{}?room={}&token={}",
            config.transcriber_url, config.room, credential.token
        );

        let (orchestrator, handle) = SessionOrchestrator::new(config, decoder, display);
        let loop_task = tokio::spawn(orchestrator.run());

        // Capture starts as soon as the local producer lands; segments
        // produced before the transport opens are dropped by the gate.
        handle.emit(SessionEvent::LocalAudioReady(track));

        match ws::connect(&transcriber_url).await {
            Ok((sink, inbound)) => {
                handle.emit(SessionEvent::TransportOpened(Box::new(sink)));
                tokio::spawn(inbound.pump(handle.events()));
            }
            Err(e) => {
                handle.shutdown();
                let _ = loop_task.await;
                if let Err(release_err) = local_audio.release().await {
                    warn!("local audio release failed: {release_err:#}");
                }
                return Err(e).context("Transport open failed");
            }
        }

        Ok(Self {
            handle,
            loop_task,
            local_audio,
        })
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Ordered teardown: the loop stops capture, closes the transport,
    /// and releases producers; the microphone handle goes last.
    pub async fn disconnect(self) -> SessionStats {
        let Session {
            handle,
            loop_task,
            mut local_audio,
        } = self;

        handle.shutdown();
        if let Err(e) = loop_task.await {
            error!("session loop panicked: {e}");
        }
        if let Err(e) = local_audio.release().await {
            warn!("local audio release failed: {e:#}");
        }

        handle.stats()
    }
}
