use crate::registry::ChannelSnapshot;
use crate::relay::RelayCommand;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use beamcast_core::{ChannelId, IceServerConfig, ServerMessage, SessionId};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    sessions: DashMap<SessionId, mpsc::UnboundedSender<Message>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Session table shared by the websocket handlers and the relay loop.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) relay_tx: mpsc::Sender<RelayCommand>,
}

impl SignalingService {
    pub fn new(relay_tx: mpsc::Sender<RelayCommand>, ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                sessions: DashMap::new(),
                ice_servers,
            }),
            relay_tx,
        }
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn add_session(&self, session: SessionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.sessions.insert(session, tx);
    }

    pub fn remove_session(&self, session: &SessionId) {
        self.inner.sessions.remove(session);
    }

    pub fn send_signal(&self, session: SessionId, msg: &ServerMessage) {
        let Some(tx) = self.inner.sessions.get(&session) else {
            warn!("Attempted to send signal to disconnected session {}", session);
            return;
        };

        match serde_json::to_string(msg) {
            Ok(json) => {
                if let Err(e) = tx.send(Message::Text(json.into())) {
                    error!("Failed to send WS message to {}: {:?}", session, e);
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }

    /// Current membership of `channel_id`, as seen by the relay loop.
    pub async fn snapshot(&self, channel_id: ChannelId) -> Option<ChannelSnapshot> {
        let (cmd, rx) = RelayCommand::snapshot(channel_id);
        if self.relay_tx.send(cmd).await.is_err() {
            error!("Relay is not running");
            return None;
        }
        rx.await.ok().flatten()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send(&self, session: SessionId, message: ServerMessage) {
        self.send_signal(session, &message);
    }
}
