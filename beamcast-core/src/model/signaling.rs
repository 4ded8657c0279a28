use crate::error::RelayError;
use crate::model::{ChannelId, SessionId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Messages a client sends to the relay.
///
/// `sdp` and `candidate` payloads stay opaque JSON: the relay forwards them
/// without looking inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    JoinChannel {
        channel_id: ChannelId,
        is_host: bool,
        user_id: UserId,
    },
    ViewerJoin {
        channel_id: ChannelId,
        user_id: UserId,
    },
    Offer {
        channel_id: ChannelId,
        sdp: Value,
        from: UserId,
        to: UserId,
    },
    Answer {
        channel_id: ChannelId,
        sdp: Value,
        from: UserId,
        to: UserId,
    },
    Candidate {
        channel_id: ChannelId,
        candidate: Value,
        from: UserId,
        to: UserId,
    },
    EndStream {
        channel_id: ChannelId,
    },
    LeaveChannel {
        channel_id: ChannelId,
        user_id: UserId,
    },
}

/// Messages the relay pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Welcome {
        session_id: SessionId,
        ice_servers: Vec<IceServerConfig>,
    },
    ViewerJoined {
        channel_id: ChannelId,
        user_id: UserId,
    },
    ViewerLeft {
        channel_id: ChannelId,
        user_id: UserId,
    },
    Offer {
        channel_id: ChannelId,
        sdp: Value,
        from: UserId,
        to: UserId,
    },
    Answer {
        channel_id: ChannelId,
        sdp: Value,
        from: UserId,
        to: UserId,
    },
    Candidate {
        channel_id: ChannelId,
        candidate: Value,
        from: UserId,
        to: UserId,
    },
    StreamEnded {
        channel_id: ChannelId,
    },
}

impl ClientMessage {
    pub fn channel_id(&self) -> &ChannelId {
        match self {
            ClientMessage::JoinChannel { channel_id, .. }
            | ClientMessage::ViewerJoin { channel_id, .. }
            | ClientMessage::Offer { channel_id, .. }
            | ClientMessage::Answer { channel_id, .. }
            | ClientMessage::Candidate { channel_id, .. }
            | ClientMessage::EndStream { channel_id }
            | ClientMessage::LeaveChannel { channel_id, .. } => channel_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::JoinChannel { .. } => "join-channel",
            ClientMessage::ViewerJoin { .. } => "viewer-join",
            ClientMessage::Offer { .. } => "offer",
            ClientMessage::Answer { .. } => "answer",
            ClientMessage::Candidate { .. } => "candidate",
            ClientMessage::EndStream { .. } => "end-stream",
            ClientMessage::LeaveChannel { .. } => "leave-channel",
        }
    }

    /// Rejects messages whose required fields are present but unusable.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.channel_id().is_empty() {
            return Err(RelayError::Malformed("empty channelId".into()));
        }

        match self {
            ClientMessage::JoinChannel { user_id, .. }
            | ClientMessage::ViewerJoin { user_id, .. }
            | ClientMessage::LeaveChannel { user_id, .. }
                if user_id.is_empty() =>
            {
                Err(RelayError::Malformed("empty userId".into()))
            }
            ClientMessage::Offer { from, to, sdp, .. }
            | ClientMessage::Answer { from, to, sdp, .. } => {
                check_route(from, to)?;
                if sdp.is_null() {
                    return Err(RelayError::Malformed("missing sdp".into()));
                }
                Ok(())
            }
            ClientMessage::Candidate {
                from, to, candidate, ..
            } => {
                check_route(from, to)?;
                if candidate.is_null() {
                    return Err(RelayError::Malformed("missing candidate".into()));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// The relayed form of `offer`, `answer` and `candidate`; `None` for
    /// membership messages.
    pub fn into_relayed(self) -> Option<ServerMessage> {
        match self {
            ClientMessage::Offer {
                channel_id,
                sdp,
                from,
                to,
            } => Some(ServerMessage::Offer {
                channel_id,
                sdp,
                from,
                to,
            }),
            ClientMessage::Answer {
                channel_id,
                sdp,
                from,
                to,
            } => Some(ServerMessage::Answer {
                channel_id,
                sdp,
                from,
                to,
            }),
            ClientMessage::Candidate {
                channel_id,
                candidate,
                from,
                to,
            } => Some(ServerMessage::Candidate {
                channel_id,
                candidate,
                from,
                to,
            }),
            _ => None,
        }
    }
}

impl ServerMessage {
    /// `None` for `welcome`, which belongs to the connection, not a channel.
    pub fn channel_id(&self) -> Option<&ChannelId> {
        match self {
            ServerMessage::Welcome { .. } => None,
            ServerMessage::ViewerJoined { channel_id, .. }
            | ServerMessage::ViewerLeft { channel_id, .. }
            | ServerMessage::Offer { channel_id, .. }
            | ServerMessage::Answer { channel_id, .. }
            | ServerMessage::Candidate { channel_id, .. }
            | ServerMessage::StreamEnded { channel_id } => Some(channel_id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Welcome { .. } => "welcome",
            ServerMessage::ViewerJoined { .. } => "viewer-joined",
            ServerMessage::ViewerLeft { .. } => "viewer-left",
            ServerMessage::Offer { .. } => "offer",
            ServerMessage::Answer { .. } => "answer",
            ServerMessage::Candidate { .. } => "candidate",
            ServerMessage::StreamEnded { .. } => "stream-ended",
        }
    }
}

fn check_route(from: &UserId, to: &UserId) -> Result<(), RelayError> {
    if from.is_empty() || to.is_empty() {
        return Err(RelayError::Malformed("empty from/to".into()));
    }
    Ok(())
}
