mod channel_entry;
mod channel_registry;

pub use channel_entry::*;
pub use channel_registry::*;
