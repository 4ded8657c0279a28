use crate::relay::RelaySettings;
use beamcast_core::IceServerConfig;
use clap::Parser;
use clap::builder::RangedU64ValueParser;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "beamcast-server")]
#[command(about = "Signaling relay for peer-to-peer broadcasts and calls")]
pub struct RelayConfig {
    /// Address the websocket endpoint listens on
    #[arg(long, env = "BEAMCAST_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// STUN/TURN urls pushed to clients on connect (comma separated)
    #[arg(
        long = "ice-server",
        env = "BEAMCAST_ICE_SERVERS",
        value_delimiter = ',',
        default_values = ["stun:stun.l.google.com:19302", "stun:stun1.l.google.com:19302"]
    )]
    pub ice_servers: Vec<String>,

    /// Username for the `turn:`/`turns:` urls
    #[arg(long, env = "BEAMCAST_TURN_USERNAME")]
    pub turn_username: Option<String>,

    /// Credential for the `turn:`/`turns:` urls
    #[arg(long, env = "BEAMCAST_TURN_CREDENTIAL")]
    pub turn_credential: Option<String>,

    /// Seconds a channel may stay without a host before it is reaped
    #[arg(long, env = "BEAMCAST_IDLE_CHANNEL_TTL", default_value_t = 300)]
    pub idle_channel_ttl_secs: u64,

    /// Seconds between idle channel sweeps
    #[arg(long, env = "BEAMCAST_REAP_INTERVAL", default_value_t = 30)]
    pub reap_interval_secs: u64,

    /// Capacity of the relay command queue
    #[arg(
        long,
        env = "BEAMCAST_COMMAND_BUFFER",
        default_value_t = 1024,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub command_buffer: usize,
}

impl RelayConfig {
    /// STUN urls go out bare; TURN urls are grouped with the credentials.
    pub fn ice_server_configs(&self) -> Vec<IceServerConfig> {
        let (turn, stun): (Vec<String>, Vec<String>) = self
            .ice_servers
            .iter()
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .partition(|url| url.starts_with("turn:") || url.starts_with("turns:"));

        let mut configs = Vec::new();
        if !stun.is_empty() {
            configs.push(IceServerConfig {
                urls: stun,
                username: None,
                credential: None,
            });
        }
        if !turn.is_empty() {
            configs.push(IceServerConfig {
                urls: turn,
                username: self.turn_username.clone(),
                credential: self.turn_credential.clone(),
            });
        }
        configs
    }

    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            idle_channel_ttl: Duration::from_secs(self.idle_channel_ttl_secs),
            reap_interval: Duration::from_secs(self.reap_interval_secs.max(1)),
        }
    }
}
