use crate::registry::{ChannelRegistry, ViewerAdmission, ViewerRemoval};
use crate::relay::relay_command::RelayCommand;
use crate::relay::relay_settings::RelaySettings;
use crate::signaling::SignalingOutput;
use beamcast_core::{ChannelId, ClientMessage, RelayError, ServerMessage, SessionId, UserId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// The signaling relay.
///
/// A single task owns the registry and the transport groups; commands are
/// handled one at a time, so no two mutations of a channel ever interleave.
pub struct Relay {
    registry: ChannelRegistry,
    /// Sessions subscribed to each channel's traffic. Wider than the registry:
    /// a viewer is subscribed from `join-channel` on, before it is announced.
    groups: HashMap<ChannelId, BTreeSet<SessionId>>,
    /// The one channel each session is currently in.
    memberships: HashMap<SessionId, ChannelId>,
    command_rx: mpsc::Receiver<RelayCommand>,
    signaling: Arc<dyn SignalingOutput>,
    settings: RelaySettings,
}

impl Relay {
    pub fn new(
        command_rx: mpsc::Receiver<RelayCommand>,
        signaling: Arc<dyn SignalingOutput>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            registry: ChannelRegistry::new(),
            groups: HashMap::new(),
            memberships: HashMap::new(),
            command_rx,
            signaling,
            settings,
        }
    }

    pub async fn run(mut self) {
        info!("Relay event loop started");

        let mut reaper = tokio::time::interval(self.settings.reap_interval);
        reaper.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down relay.");
                            break;
                        }
                    }
                }

                _ = reaper.tick() => {
                    self.reap_idle_channels(Instant::now()).await;
                }
            }
        }

        info!("Relay event loop finished");
    }

    async fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Message { session, message } => {
                let kind = message.kind();
                let channel_id = message.channel_id().clone();

                if let Err(e) = self.handle_message(session, message).await {
                    if e.is_routing_miss() {
                        debug!("Dropped {} from {} for '{}': {}", kind, session, channel_id, e);
                    } else {
                        warn!("Rejected {} from {} for '{}': {}", kind, session, channel_id, e);
                    }
                }
            }

            RelayCommand::Disconnect { session } => {
                self.on_disconnect(session).await;
            }

            RelayCommand::Snapshot { channel_id, reply } => {
                let members = self.groups.get(&channel_id).map_or(0, BTreeSet::len);
                let snapshot = self.registry.snapshot(&channel_id).map(|mut snapshot| {
                    snapshot.members = members;
                    snapshot
                });
                let _ = reply.send(snapshot);
            }
        }
    }

    async fn handle_message(
        &mut self,
        session: SessionId,
        message: ClientMessage,
    ) -> Result<(), RelayError> {
        message.validate()?;

        match message {
            ClientMessage::JoinChannel {
                channel_id,
                is_host,
                user_id,
            } => {
                self.join_channel(session, channel_id, is_host, user_id)
                    .await;
                Ok(())
            }
            ClientMessage::ViewerJoin {
                channel_id,
                user_id,
            } => self.viewer_join(session, channel_id, user_id).await,
            ClientMessage::EndStream { channel_id } => self.end_stream(session, channel_id).await,
            ClientMessage::LeaveChannel {
                channel_id,
                user_id,
            } => self.leave_channel(session, channel_id, user_id).await,
            relayed => self.relay(session, relayed).await,
        }
    }

    async fn join_channel(
        &mut self,
        session: SessionId,
        channel_id: ChannelId,
        is_host: bool,
        user_id: UserId,
    ) {
        if let Some(previous) = self.memberships.get(&session).cloned() {
            if previous != channel_id {
                info!("Session {} moves from '{}' to '{}'", session, previous, channel_id);
                self.depart(session, &previous).await;
            }
        }

        self.groups
            .entry(channel_id.clone())
            .or_default()
            .insert(session);
        self.memberships.insert(session, channel_id.clone());

        if !is_host {
            debug!("Session {} ({}) subscribed to '{}'", session, user_id, channel_id);
            return;
        }

        let previous = self
            .registry
            .set_host(&channel_id, user_id.clone(), session);
        match previous {
            Some(seat) if seat.session != session => warn!(
                "Host of '{}' replaced: {} -> {}",
                channel_id, seat.user_id, user_id
            ),
            _ => info!("{} is hosting '{}'", user_id, channel_id),
        }
    }

    async fn viewer_join(
        &mut self,
        session: SessionId,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<(), RelayError> {
        self.ensure_member(session, &channel_id)?;

        match self
            .registry
            .add_viewer(&channel_id, user_id.clone(), session)?
        {
            ViewerAdmission::Added => {}
            ViewerAdmission::Unchanged => {
                debug!("{} re-announced in '{}'", user_id, channel_id);
            }
            ViewerAdmission::Renamed(removal) => {
                info!("Viewer {} renamed to {} in '{}'", removal.user_id, user_id, channel_id);
                self.announce_viewer_left(&channel_id, removal).await;
            }
        }

        let Some(host) = self
            .registry
            .get(&channel_id)
            .and_then(|entry| entry.host_session())
        else {
            debug!("'{}' has no host to announce {} to", channel_id, user_id);
            return Ok(());
        };

        info!("Viewer {} joined '{}'", user_id, channel_id);
        self.signaling
            .send(
                host,
                ServerMessage::ViewerJoined {
                    channel_id,
                    user_id,
                },
            )
            .await;
        Ok(())
    }

    /// Forwards `offer`, `answer` and `candidate` to every other session in
    /// the channel. Payloads are not inspected.
    async fn relay(&mut self, session: SessionId, message: ClientMessage) -> Result<(), RelayError> {
        let channel_id = message.channel_id().clone();
        self.ensure_member(session, &channel_id)?;

        let Some(outbound) = message.into_relayed() else {
            return Ok(());
        };

        let recipients: Vec<SessionId> = self
            .groups
            .get(&channel_id)
            .map(|members| {
                members
                    .iter()
                    .copied()
                    .filter(|member| *member != session)
                    .collect()
            })
            .unwrap_or_default();

        if recipients.is_empty() {
            debug!("Nobody else in '{}' to relay to", channel_id);
        }

        for recipient in recipients {
            self.signaling.send(recipient, outbound.clone()).await;
        }
        Ok(())
    }

    async fn end_stream(&mut self, session: SessionId, channel_id: ChannelId) -> Result<(), RelayError> {
        let entry = self
            .registry
            .get(&channel_id)
            .ok_or_else(|| RelayError::UnknownChannel(channel_id.clone()))?;

        if entry.host_session() != Some(session) {
            return Err(RelayError::NotHost(channel_id));
        }

        info!("Stream '{}' ended by its host", channel_id);
        self.end_channel(&channel_id, Some(session)).await;
        Ok(())
    }

    async fn leave_channel(
        &mut self,
        session: SessionId,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<(), RelayError> {
        self.ensure_member(session, &channel_id)?;

        if self
            .registry
            .clear_host(&channel_id, session, Instant::now())
        {
            info!("Host {} left '{}' without ending it", user_id, channel_id);
        } else {
            self.drop_viewer(session, &channel_id).await;
        }

        self.leave_group(session, &channel_id);
        Ok(())
    }

    async fn on_disconnect(&mut self, session: SessionId) {
        let Some(channel_id) = self.memberships.get(&session).cloned() else {
            debug!("Session {} disconnected outside any channel", session);
            return;
        };

        info!("Session {} disconnected from '{}'", session, channel_id);
        self.depart(session, &channel_id).await;
    }

    /// Implicit leave: the host's departure ends the channel, a viewer's is
    /// an ordinary leave.
    async fn depart(&mut self, session: SessionId, channel_id: &ChannelId) {
        let is_host = self
            .registry
            .get(channel_id)
            .and_then(|entry| entry.host_session())
            == Some(session);

        if is_host {
            info!("Host of '{}' is gone, ending stream", channel_id);
            self.end_channel(channel_id, Some(session)).await;
        } else {
            self.drop_viewer(session, channel_id).await;
            self.leave_group(session, channel_id);
        }
    }

    /// Removes the channel and tells everyone but `initiator` it is over.
    async fn end_channel(&mut self, channel_id: &ChannelId, initiator: Option<SessionId>) {
        self.registry.remove(channel_id);

        let members = self.groups.remove(channel_id).unwrap_or_default();
        for member in &members {
            if self.memberships.get(member) == Some(channel_id) {
                self.memberships.remove(member);
            }
        }

        let ended = ServerMessage::StreamEnded {
            channel_id: channel_id.clone(),
        };
        for member in members.into_iter().filter(|m| Some(*m) != initiator) {
            self.signaling.send(member, ended.clone()).await;
        }
    }

    async fn drop_viewer(&mut self, session: SessionId, channel_id: &ChannelId) {
        let Some(removal) = self.registry.remove_viewer(channel_id, session) else {
            return;
        };
        info!("Viewer {} left '{}'", removal.user_id, channel_id);
        self.announce_viewer_left(channel_id, removal).await;
    }

    /// Tells the host once the last seat under a name is gone.
    async fn announce_viewer_left(&self, channel_id: &ChannelId, removal: ViewerRemoval) {
        if !removal.user_gone {
            return;
        }
        let Some(host) = removal.host_session else {
            return;
        };
        self.signaling
            .send(
                host,
                ServerMessage::ViewerLeft {
                    channel_id: channel_id.clone(),
                    user_id: removal.user_id,
                },
            )
            .await;
    }

    fn leave_group(&mut self, session: SessionId, channel_id: &ChannelId) {
        if let Some(members) = self.groups.get_mut(channel_id) {
            members.remove(&session);
            if members.is_empty() {
                self.groups.remove(channel_id);
            }
        }
        if self.memberships.get(&session) == Some(channel_id) {
            self.memberships.remove(&session);
        }
    }

    fn ensure_member(&self, session: SessionId, channel_id: &ChannelId) -> Result<(), RelayError> {
        if !self.groups.contains_key(channel_id) {
            return Err(RelayError::UnknownChannel(channel_id.clone()));
        }
        if self.memberships.get(&session) != Some(channel_id) {
            return Err(RelayError::NotMember(channel_id.clone()));
        }
        Ok(())
    }

    async fn reap_idle_channels(&mut self, now: Instant) {
        for channel_id in self.registry.expired(now, self.settings.idle_channel_ttl) {
            info!(
                "Reaping '{}': no host for {:?}",
                channel_id, self.settings.idle_channel_ttl
            );
            self.end_channel(&channel_id, None).await;
        }
    }
}
