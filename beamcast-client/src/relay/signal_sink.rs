use anyhow::Result;
use async_trait::async_trait;
use beamcast_core::ClientMessage;

/// Outbound half of the relay connection.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, message: ClientMessage) -> Result<()>;
}
