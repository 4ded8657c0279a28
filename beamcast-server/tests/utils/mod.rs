pub mod mock_signaling;
pub mod test_relay;
pub mod ws_client;

pub use signal_helpers::*;
pub use test_relay::*;
pub use ws_client::*;
