use beamcast_core::IceServerConfig;

/// Client-side negotiation settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Used until the relay's `welcome` supplies its own list.
    pub ice_servers: Vec<IceServerConfig>,
    /// Per remote identity.
    pub max_buffered_candidates: usize,
    /// Endpoint recreations allowed per remote after a failure.
    pub negotiation_retries: u32,
    pub endpoint_event_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                username: None,
                credential: None,
            }],
            max_buffered_candidates: 64,
            negotiation_retries: 1,
            endpoint_event_buffer: 256,
        }
    }
}
