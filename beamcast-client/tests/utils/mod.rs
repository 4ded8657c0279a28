
pub use fake_endpoint::*;
pub use relay_server::*;
