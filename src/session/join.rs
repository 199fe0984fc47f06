use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Access credential returned by the session-join collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionCredential {
    pub token: String,
}

/// Session-join collaborator: room name in, access credential out.
/// Failure here aborts session start.
#[async_trait::async_trait]
pub trait JoinService: Send + Sync {
    async fn join(&self, room: &str) -> Result<SessionCredential>;
}

#[derive(Debug, Serialize)]
struct JoinRequest<'a> {
    #[serde(rename = "roomName")]
    room_name: &'a str,
}

/// Joins over HTTP: `POST <join_url> {"roomName": ...}` → `{"token": ...}`.
pub struct HttpJoinService {
    client: reqwest::Client,
    join_url: String,
}

impl HttpJoinService {
    pub fn new(join_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            join_url: join_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl JoinService for HttpJoinService {
    async fn join(&self, room: &str) -> Result<SessionCredential> {
        info!("Requesting access credential for room {room}");

        let response = self
            .client
            .post(&self.join_url)
            .json(&JoinRequest { room_name: room })
            .send()
            .await
            .context("Join request failed")?
            .error_for_status()
            .context("Join request rejected")?;

        let credential = response
            .json::<SessionCredential>()
            .await
            .context("Malformed join response")?;

        Ok(credential)
    }
}
