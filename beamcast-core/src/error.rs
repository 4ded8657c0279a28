use crate::model::{ChannelId, UserId};
use thiserror::Error;

/// Failures of a single relay operation.
///
/// None of these are sent back to the client. The relay logs them and moves
/// on, so one channel's fault never touches another channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown channel '{0}'")]
    UnknownChannel(ChannelId),

    #[error("session is not a member of channel '{0}'")]
    NotMember(ChannelId),

    #[error("only the host may end channel '{0}'")]
    NotHost(ChannelId),

    #[error("'{user}' is the host of channel '{channel}'")]
    HostConflict { channel: ChannelId, user: UserId },
}

impl RelayError {
    /// Routing misses are expected races, not faults.
    pub fn is_routing_miss(&self) -> bool {
        matches!(
            self,
            RelayError::UnknownChannel(_) | RelayError::NotMember(_)
        )
    }
}
