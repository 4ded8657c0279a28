use async_trait::async_trait;
use beamcast_core::{ServerMessage, SessionId};
use beamcast_server::SignalingOutput;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mock SignalingOutput that records every outgoing message per session.
#[derive(Clone, Default)]
pub struct MockSignalingOutput {
    signals: Arc<Mutex<Vec<(SessionId, ServerMessage)>>>,
}

impl MockSignalingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered to `session`, in delivery order.
    pub async fn received(&self, session: SessionId) -> Vec<ServerMessage> {
        self.signals
            .lock()
            .await
            .iter()
            .filter(|(to, _)| *to == session)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub async fn stream_ended_count(&self, session: SessionId) -> usize {
        self.received(session)
            .await
            .iter()
            .filter(|msg| matches!(msg, ServerMessage::StreamEnded { .. }))
            .count()
    }

    pub async fn viewer_joined(&self, session: SessionId) -> Vec<String> {
        self.received(session)
            .await
            .into_iter()
            .filter_map(|msg| match msg {
                ServerMessage::ViewerJoined { user_id, .. } => Some(user_id.0),
                _ => None,
            })
            .collect()
    }

    pub async fn total(&self) -> usize {
        self.signals.lock().await.len()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send(&self, session: SessionId, message: ServerMessage) {
        tracing::debug!("[MockSignaling] {:?} -> {}", message, session);
        self.signals.lock().await.push((session, message));
    }
}
