use crate::endpoint::RemoteMedia;
use beamcast_core::{ChannelId, UserId};

/// What the surrounding application gets to see.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    ViewerJoined {
        channel_id: ChannelId,
        user_id: UserId,
    },
    ViewerLeft {
        channel_id: ChannelId,
        user_id: UserId,
    },
    RemoteMedia {
        remote: UserId,
        media: RemoteMedia,
    },
    PeerConnected {
        remote: UserId,
    },
    /// Transient notice. `will_retry` is false once retries are used up.
    NegotiationFailed {
        remote: UserId,
        will_retry: bool,
    },
    /// Local media could not be acquired.
    CouldNotStart {
        channel_id: ChannelId,
        reason: String,
    },
    /// Ended by the host or inferred from its disconnect. The application
    /// should return to a neutral view.
    StreamEnded {
        channel_id: ChannelId,
    },
}
