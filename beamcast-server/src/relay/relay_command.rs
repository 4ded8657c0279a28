use crate::registry::ChannelSnapshot;
use beamcast_core::{ChannelId, ClientMessage, SessionId};
use tokio::sync::oneshot;

/// Inputs to the relay loop, produced by the websocket layer.
#[derive(Debug)]
pub enum RelayCommand {
    /// A decoded message from a connected session.
    Message {
        session: SessionId,
        message: ClientMessage,
    },

    /// The transport session is gone, for whatever reason.
    Disconnect { session: SessionId },

    /// Diagnostics: current membership of a channel.
    Snapshot {
        channel_id: ChannelId,
        reply: oneshot::Sender<Option<ChannelSnapshot>>,
    },
}

impl RelayCommand {
    pub fn snapshot(channel_id: ChannelId) -> (Self, oneshot::Receiver<Option<ChannelSnapshot>>) {
        let (reply, rx) = oneshot::channel();
        (RelayCommand::Snapshot { channel_id, reply }, rx)
    }
}
