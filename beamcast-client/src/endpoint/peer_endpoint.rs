use crate::endpoint::EndpointEvent;
use crate::media::LocalStream;
use anyhow::Result;
use async_trait::async_trait;
use beamcast_core::{IceServerConfig, UserId};
use serde_json::Value;
use tokio::sync::mpsc;

/// One peer-to-peer media session with exactly one remote identity.
///
/// Session descriptions travel as `{"type": .., "sdp": ..}` JSON and
/// candidates as the JSON form of `RTCIceCandidateInit`, which is what the
/// relay carries on the wire.
#[async_trait]
pub trait PeerEndpoint: Send + Sync {
    /// Creates an offer and installs it as the local description.
    async fn create_offer(&self) -> Result<Value>;

    async fn apply_remote_description(&self, sdp: Value) -> Result<()>;

    /// Creates an answer to the applied offer and installs it locally.
    async fn create_answer(&self) -> Result<Value>;

    /// Only valid once a remote description has been applied.
    async fn add_remote_candidate(&self, candidate: Value) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait EndpointFactory: Send + Sync {
    /// Opens an endpoint towards `remote` carrying the tracks of `stream`.
    /// Everything it observes is reported on `events`, tagged with
    /// `generation`.
    async fn create(
        &self,
        remote: UserId,
        generation: u64,
        stream: &LocalStream,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<EndpointEvent>,
    ) -> Result<Box<dyn PeerEndpoint>>;
}
