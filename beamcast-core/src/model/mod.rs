mod channel;
mod session;
mod signaling;
mod user;

pub use channel::ChannelId;
pub use session::SessionId;
pub use signaling::{ClientMessage, IceServerConfig, ServerMessage};
pub use user::UserId;
