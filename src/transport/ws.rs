use anyhow::{Context, Result};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::session::SessionEvent;

use super::gate::SegmentSink;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open the duplex connection to the transcription service. The
/// returned halves are handed to the gate (outbound) and pumped into
/// the session event channel (inbound).
pub async fn connect(url: &str) -> Result<(WsSegmentSink, WsInbound)> {
    info!("Connecting to transcription service at {url}");

    let (stream, _response) = connect_async(url)
        .await
        .context("WebSocket handshake failed")?;

    info!("WebSocket connected");

    let (sink, stream) = stream.split();
    Ok((WsSegmentSink { sink }, WsInbound { stream }))
}

/// Outbound half: each segment is one binary WebSocket message.
pub struct WsSegmentSink {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait::async_trait]
impl SegmentSink for WsSegmentSink {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.sink
            .send(Message::binary(data.to_vec()))
            .await
            .context("WebSocket send failed")
    }

    async fn close(&mut self) -> Result<()> {
        self.sink.close().await.context("WebSocket close failed")
    }
}

/// Inbound half: forwards text frames to the session until the peer
/// closes or the session is gone.
pub struct WsInbound {
    stream: SplitStream<WsStream>,
}

impl WsInbound {
    pub async fn pump(mut self, events: mpsc::UnboundedSender<SessionEvent>) {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if events
                        .send(SessionEvent::InboundText(text.as_str().to_owned()))
                        .is_err()
                    {
                        return;
                    }
                }
                Ok(Message::Binary(_)) => {
                    debug!("unexpected binary message from transcription service")
                }
                Ok(Message::Close(_)) => break,
                // Ping/pong is handled by the protocol layer.
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket read failed: {e}");
                    break;
                }
            }
        }
        let _ = events.send(SessionEvent::TransportClosed);
        debug!("inbound pump exited");
    }
}
