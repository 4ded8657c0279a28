pub mod channel;
pub mod config;
pub mod endpoint;
pub mod media;
pub mod relay;

pub use channel::*;
pub use config::ClientConfig;
pub use endpoint::*;
pub use media::*;
pub use relay::*;
