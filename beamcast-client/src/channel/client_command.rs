use crate::media::StreamSource;
use beamcast_core::ChannelId;

/// Local intent, fed to [`ChannelClient::run`](crate::ChannelClient::run).
#[derive(Debug, Clone)]
pub enum ClientCommand {
    StartHosting {
        channel_id: ChannelId,
        source: StreamSource,
    },
    /// `source: None` watches without sending any media.
    Watch {
        channel_id: ChannelId,
        source: Option<StreamSource>,
    },
    Leave,
}
