use beamcast_core::UserId;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// Connection state as reported by the underlying peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    New,
    Connecting,
    Connected,
    Disconnected,
    /// Terminal. Negotiation or connectivity has failed.
    Failed,
    Closed,
}

/// A track received from the remote party.
#[derive(Clone)]
pub struct RemoteMedia(pub Arc<TrackRemote>);

impl fmt::Debug for RemoteMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMedia")
            .field("id", &self.0.id())
            .field("kind", &self.0.kind())
            .finish()
    }
}

/// Emitted by an endpoint towards the channel client.
///
/// Every event carries the generation of the endpoint that produced it, so
/// events from an endpoint that has since been replaced can be told apart.
#[derive(Debug, Clone)]
pub enum EndpointEvent {
    LocalCandidate {
        remote: UserId,
        generation: u64,
        candidate: Value,
    },
    RemoteMedia {
        remote: UserId,
        generation: u64,
        media: RemoteMedia,
    },
    StateChanged {
        remote: UserId,
        generation: u64,
        state: EndpointState,
    },
}

impl EndpointEvent {
    pub fn remote(&self) -> &UserId {
        match self {
            EndpointEvent::LocalCandidate { remote, .. }
            | EndpointEvent::RemoteMedia { remote, .. }
            | EndpointEvent::StateChanged { remote, .. } => remote,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            EndpointEvent::LocalCandidate { generation, .. }
            | EndpointEvent::RemoteMedia { generation, .. }
            | EndpointEvent::StateChanged { generation, .. } => *generation,
        }
    }
}
