use async_trait::async_trait;
use beamcast_core::{ServerMessage, SessionId};

/// Outbound side of the relay: whatever holds the client connections.
///
/// Delivery is fire-and-forget. A session that is already gone is skipped.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send(&self, session: SessionId, message: ServerMessage);
}
