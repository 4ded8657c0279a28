mod candidate_buffer;
mod channel_client;
mod client_command;
mod client_event;

pub use candidate_buffer::CandidateBuffer;
pub use channel_client::*;
pub use client_command::*;
pub use client_event::*;
