pub mod config;
pub mod registry;
pub mod relay;
pub mod signaling;

pub use config::RelayConfig;
pub use registry::*;
pub use relay::*;
pub use signaling::*;

use beamcast_core::IceServerConfig;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Starts the relay loop on the current runtime and returns the service the
/// websocket layer talks to.
pub fn spawn_relay(
    settings: RelaySettings,
    ice_servers: Vec<IceServerConfig>,
    command_buffer: usize,
) -> SignalingService {
    let (relay_tx, relay_rx) = mpsc::channel::<RelayCommand>(command_buffer);
    let service = SignalingService::new(relay_tx, ice_servers);

    let relay = Relay::new(relay_rx, Arc::new(service.clone()), settings);
    tokio::spawn(relay.run());

    service
}
