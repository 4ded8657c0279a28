use crate::registry::channel_entry::{ChannelEntry, ChannelSnapshot, HostSeat, ViewerSeat};
use beamcast_core::{ChannelId, RelayError, SessionId, UserId};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// In-memory channel → membership map.
///
/// Only the relay loop owns one of these, so every mutation below runs to
/// completion before the next message is looked at. Entries with neither a
/// host nor viewers are removed as soon as they become empty.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: HashMap<ChannelId, ChannelEntry>,
}

/// Result of removing a viewer registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerRemoval {
    pub user_id: UserId,
    /// False while another session still holds the same display name.
    pub user_gone: bool,
    pub host_session: Option<SessionId>,
}

/// Outcome of a viewer registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerAdmission {
    Added,
    /// This session already holds the same registration.
    Unchanged,
    /// This session held another name, which has been removed.
    Renamed(ViewerRemoval),
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel_id: &ChannelId) -> Option<&ChannelEntry> {
        self.channels.get(channel_id)
    }

    pub fn contains(&self, channel_id: &ChannelId) -> bool {
        self.channels.contains_key(channel_id)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn snapshot(&self, channel_id: &ChannelId) -> Option<ChannelSnapshot> {
        self.channels.get(channel_id).map(ChannelEntry::snapshot)
    }

    /// Installs `user_id` as host, creating the channel if needed. A previous
    /// host is overwritten and returned.
    pub fn set_host(
        &mut self,
        channel_id: &ChannelId,
        user_id: UserId,
        session: SessionId,
    ) -> Option<HostSeat> {
        let seat = HostSeat { user_id, session };

        let Some(entry) = self.channels.get_mut(channel_id) else {
            self.channels
                .insert(channel_id.clone(), ChannelEntry::with_host(seat));
            return None;
        };

        entry
            .viewers
            .retain(|viewer| viewer.user_id != seat.user_id && viewer.session != seat.session);
        entry.hostless_since = None;
        entry.host.replace(seat)
    }

    /// Registers a viewer. The host's own session and name are refused, so a
    /// host is never announced to itself.
    pub fn add_viewer(
        &mut self,
        channel_id: &ChannelId,
        user_id: UserId,
        session: SessionId,
    ) -> Result<ViewerAdmission, RelayError> {
        let entry = self
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| RelayError::UnknownChannel(channel_id.clone()))?;

        if entry.host_session() == Some(session) || entry.host_id() == Some(&user_id) {
            return Err(RelayError::HostConflict {
                channel: channel_id.clone(),
                user: user_id,
            });
        }

        let Some(index) = entry.viewers.iter().position(|s| s.session == session) else {
            entry.viewers.push(ViewerSeat { user_id, session });
            return Ok(ViewerAdmission::Added);
        };
        if entry.viewers[index].user_id == user_id {
            return Ok(ViewerAdmission::Unchanged);
        }

        // Same session re-announcing under a new name: the old name leaves.
        let old = entry.viewers.remove(index);
        let removal = ViewerRemoval {
            user_gone: !entry.has_viewer(&old.user_id),
            user_id: old.user_id,
            host_session: entry.host_session(),
        };
        entry.viewers.push(ViewerSeat { user_id, session });
        Ok(ViewerAdmission::Renamed(removal))
    }

    /// Drops the viewer registration held by `session`, deleting the channel
    /// if that leaves it empty.
    pub fn remove_viewer(
        &mut self,
        channel_id: &ChannelId,
        session: SessionId,
    ) -> Option<ViewerRemoval> {
        let entry = self.channels.get_mut(channel_id)?;
        let index = entry.viewers.iter().position(|s| s.session == session)?;
        let seat = entry.viewers.remove(index);

        let removal = ViewerRemoval {
            user_gone: !entry.has_viewer(&seat.user_id),
            user_id: seat.user_id,
            host_session: entry.host_session(),
        };

        self.prune(channel_id);
        Some(removal)
    }

    /// Vacates the host seat if `session` holds it. The channel survives as
    /// viewer-only while viewers remain.
    pub fn clear_host(&mut self, channel_id: &ChannelId, session: SessionId, now: Instant) -> bool {
        let Some(entry) = self.channels.get_mut(channel_id) else {
            return false;
        };
        if entry.host_session() != Some(session) {
            return false;
        }

        entry.host = None;
        entry.hostless_since = Some(now);
        self.prune(channel_id);
        true
    }

    /// Deletes the channel unconditionally.
    pub fn remove(&mut self, channel_id: &ChannelId) -> Option<ChannelEntry> {
        self.channels.remove(channel_id)
    }

    /// Channels that have been without a host for at least `ttl`, sorted.
    pub fn expired(&self, now: Instant, ttl: Duration) -> Vec<ChannelId> {
        let mut expired: Vec<ChannelId> = self
            .channels
            .iter()
            .filter(|(_, entry)| {
                entry
                    .hostless_since
                    .is_some_and(|since| now.saturating_duration_since(since) >= ttl)
            })
            .map(|(id, _)| id.clone())
            .collect();
        expired.sort();
        expired
    }

    fn prune(&mut self, channel_id: &ChannelId) {
        if self.channels.get(channel_id).is_some_and(ChannelEntry::is_empty) {
            self.channels.remove(channel_id);
        }
    }
}
