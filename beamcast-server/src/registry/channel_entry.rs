use beamcast_core::{SessionId, UserId};
use serde::Serialize;
use tokio::time::Instant;

/// Who holds the host role, and through which transport session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSeat {
    pub user_id: UserId,
    pub session: SessionId,
}

/// A viewer registration. One per session, so two tabs sharing a display name
/// are tracked independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerSeat {
    pub user_id: UserId,
    pub session: SessionId,
}

/// Membership of a single channel.
#[derive(Debug)]
pub struct ChannelEntry {
    pub(crate) host: Option<HostSeat>,
    pub(crate) viewers: Vec<ViewerSeat>,
    /// Set while the channel has no host.
    pub(crate) hostless_since: Option<Instant>,
}

impl ChannelEntry {
    pub(crate) fn with_host(seat: HostSeat) -> Self {
        Self {
            host: Some(seat),
            viewers: Vec::new(),
            hostless_since: None,
        }
    }

    pub fn host_id(&self) -> Option<&UserId> {
        self.host.as_ref().map(|seat| &seat.user_id)
    }

    pub fn host_session(&self) -> Option<SessionId> {
        self.host.as_ref().map(|seat| seat.session)
    }

    /// Distinct viewer ids in the order they first joined.
    pub fn viewers(&self) -> Vec<UserId> {
        let mut seen = Vec::with_capacity(self.viewers.len());
        for seat in &self.viewers {
            if !seen.contains(&seat.user_id) {
                seen.push(seat.user_id.clone());
            }
        }
        seen
    }

    pub fn has_viewer(&self, user_id: &UserId) -> bool {
        self.viewers.iter().any(|seat| &seat.user_id == user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.viewers.is_empty()
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            host_id: self.host_id().cloned(),
            viewers: self.viewers(),
            members: self.viewers.len() + usize::from(self.host.is_some()),
        }
    }
}

/// Read-only copy of a channel's membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnapshot {
    pub host_id: Option<UserId>,
    pub viewers: Vec<UserId>,
    /// Sessions subscribed to the channel, announced or not.
    pub members: usize,
}
