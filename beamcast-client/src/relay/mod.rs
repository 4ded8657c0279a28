mod relay_connection;
mod signal_sink;

pub use relay_connection::*;
pub use signal_sink::*;
