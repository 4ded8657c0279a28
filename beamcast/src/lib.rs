pub use beamcast_core::model::{ChannelId, SessionId, UserId};

pub mod model {
    pub use beamcast_core::model::*;
}

pub use beamcast_core::RelayError;

#[cfg(feature = "server")]
pub mod server {
    pub use beamcast_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use beamcast_client::*;
}
