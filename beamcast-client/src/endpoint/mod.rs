mod endpoint_event;
mod peer_endpoint;
mod rtc_endpoint;

pub use endpoint_event::*;
pub use peer_endpoint::*;
pub use rtc_endpoint::*;
