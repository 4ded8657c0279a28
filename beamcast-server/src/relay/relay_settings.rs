use std::time::Duration;

/// Runtime knobs of the relay loop.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// How long a channel may stay without a host before it is reaped.
    pub idle_channel_ttl: Duration,
    pub reap_interval: Duration,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            idle_channel_ttl: Duration::from_secs(300),
            reap_interval: Duration::from_secs(30),
        }
    }
}
