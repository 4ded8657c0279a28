//! Integration tests for the relay.
//!
//! - `membership_tests` - host/viewer registration and the registry it produces
//! - `routing_tests` - who receives offers, answers and candidates
//! - `lifecycle_tests` - ending, leaving, disconnecting and reaping channels
//! - `transport_tests` - the websocket endpoint end to end

pub mod membership_tests;
pub mod routing_tests;

use tracing::Level;

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}
