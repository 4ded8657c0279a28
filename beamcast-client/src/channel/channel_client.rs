use crate::channel::{CandidateBuffer, ClientCommand, ClientEvent};
use crate::config::ClientConfig;
use crate::endpoint::{EndpointEvent, EndpointFactory, EndpointState, PeerEndpoint};
use crate::media::{LocalStream, MediaCapture, StreamSource};
use crate::relay::SignalSink;
use anyhow::{Context, Result, bail};
use beamcast_core::{ChannelId, ClientMessage, IceServerConfig, ServerMessage, UserId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Offers to every announced viewer and may end the stream.
    Host,
    /// Only ever answers.
    Viewer,
}

struct ActiveChannel {
    channel_id: ChannelId,
    role: Role,
    stream: LocalStream,
}

struct PeerSlot {
    endpoint: Box<dyn PeerEndpoint>,
    generation: u64,
    remote_described: bool,
}

/// Drives one participant through a channel.
///
/// Turns local intent into relay messages and relay traffic into endpoint
/// lifecycle actions. Owns one [`PeerEndpoint`] per remote identity, the
/// candidates that arrived too early for them, and the retry budget.
///
/// Everything runs on the task calling [`run`](Self::run), so disposal and
/// negotiation never interleave: once an endpoint is closed its later events
/// carry a stale generation and are dropped.
pub struct ChannelClient {
    user_id: UserId,
    config: ClientConfig,
    ice_servers: Vec<IceServerConfig>,

    sink: Arc<dyn SignalSink>,
    factory: Arc<dyn EndpointFactory>,
    media: Arc<dyn MediaCapture>,

    events: mpsc::UnboundedSender<ClientEvent>,
    endpoint_tx: mpsc::Sender<EndpointEvent>,
    endpoint_rx: mpsc::Receiver<EndpointEvent>,

    active: Option<ActiveChannel>,
    peers: HashMap<UserId, PeerSlot>,
    candidates: CandidateBuffer,
    retries: HashMap<UserId, u32>,
    next_generation: u64,
}

impl ChannelClient {
    pub fn new(
        user_id: UserId,
        config: ClientConfig,
        sink: Arc<dyn SignalSink>,
        factory: Arc<dyn EndpointFactory>,
        media: Arc<dyn MediaCapture>,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (endpoint_tx, endpoint_rx) = mpsc::channel(config.endpoint_event_buffer.max(1));

        let client = Self {
            user_id,
            ice_servers: config.ice_servers.clone(),
            candidates: CandidateBuffer::new(config.max_buffered_candidates),
            config,
            sink,
            factory,
            media,
            events,
            endpoint_tx,
            endpoint_rx,
            active: None,
            peers: HashMap::new(),
            retries: HashMap::new(),
            next_generation: 0,
        };
        (client, events_rx)
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn channel_id(&self) -> Option<&ChannelId> {
        self.active.as_ref().map(|active| &active.channel_id)
    }

    pub fn role(&self) -> Option<Role> {
        self.active.as_ref().map(|active| active.role)
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn has_peer(&self, remote: &UserId) -> bool {
        self.peers.contains_key(remote)
    }

    /// Event loop. Ends when the relay connection or the command channel
    /// closes; an error means the relay could not be written to.
    pub async fn run(
        mut self,
        mut inbound: mpsc::Receiver<ServerMessage>,
        mut commands: mpsc::Receiver<ClientCommand>,
    ) -> Result<()> {
        info!("Channel client for {} started", self.user_id);

        loop {
            tokio::select! {
                msg = inbound.recv() => {
                    match msg {
                        Some(m) => self.handle_server_message(m).await?,
                        None => {
                            info!("Relay connection lost");
                            self.lose_channel().await;
                            break;
                        }
                    }
                }

                cmd = commands.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await?,
                        None => {
                            info!("Command channel closed. Leaving.");
                            self.leave().await?;
                            break;
                        }
                    }
                }

                Some(evt) = self.endpoint_rx.recv() => {
                    self.handle_endpoint_event(evt).await?;
                }
            }
        }

        info!("Channel client for {} finished", self.user_id);
        Ok(())
    }

    pub async fn handle_command(&mut self, cmd: ClientCommand) -> Result<()> {
        match cmd {
            ClientCommand::StartHosting { channel_id, source } => {
                self.start_hosting(channel_id, source).await
            }
            ClientCommand::Watch { channel_id, source } => self.watch(channel_id, source).await,
            ClientCommand::Leave => self.leave().await,
        }
    }

    /// Joins `channel_id` as its host. Viewers get an offer as they announce
    /// themselves.
    pub async fn start_hosting(&mut self, channel_id: ChannelId, source: StreamSource) -> Result<()> {
        self.leave().await?;

        let Some(stream) = self.acquire(&channel_id, Some(&source)).await else {
            return Ok(());
        };

        info!("{} is hosting '{}'", self.user_id, channel_id);
        self.active = Some(ActiveChannel {
            channel_id: channel_id.clone(),
            role: Role::Host,
            stream,
        });

        self.sink
            .send(ClientMessage::JoinChannel {
                channel_id,
                is_host: true,
                user_id: self.user_id.clone(),
            })
            .await
    }

    /// Joins `channel_id` as a viewer and announces itself to the host.
    pub async fn watch(&mut self, channel_id: ChannelId, source: Option<StreamSource>) -> Result<()> {
        self.leave().await?;

        let Some(stream) = self.acquire(&channel_id, source.as_ref()).await else {
            return Ok(());
        };

        info!("{} is watching '{}'", self.user_id, channel_id);
        self.active = Some(ActiveChannel {
            channel_id: channel_id.clone(),
            role: Role::Viewer,
            stream,
        });

        self.sink
            .send(ClientMessage::JoinChannel {
                channel_id,
                is_host: false,
                user_id: self.user_id.clone(),
            })
            .await?;
        self.announce().await
    }

    /// Ends the stream when hosting, leaves it otherwise. Every endpoint is
    /// disposed either way.
    pub async fn leave(&mut self) -> Result<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };

        let msg = match active.role {
            Role::Host => {
                info!("Ending stream '{}'", active.channel_id);
                ClientMessage::EndStream {
                    channel_id: active.channel_id,
                }
            }
            Role::Viewer => {
                info!("Leaving '{}'", active.channel_id);
                ClientMessage::LeaveChannel {
                    channel_id: active.channel_id,
                    user_id: self.user_id.clone(),
                }
            }
        };

        let sent = self.sink.send(msg).await;
        self.dispose_all().await;
        sent
    }

    pub async fn handle_server_message(&mut self, msg: ServerMessage) -> Result<()> {
        if let ServerMessage::Welcome {
            session_id,
            ice_servers,
        } = msg
        {
            info!("Relay assigned session {}", session_id);
            if !ice_servers.is_empty() {
                self.ice_servers = ice_servers;
            }
            return Ok(());
        }

        let Some(active) = &self.active else {
            debug!("Ignoring {} outside any channel", msg.kind());
            return Ok(());
        };
        if msg.channel_id() != Some(&active.channel_id) {
            debug!("Ignoring {} for another channel", msg.kind());
            return Ok(());
        }
        let role = active.role;

        match msg {
            ServerMessage::ViewerJoined {
                channel_id,
                user_id,
            } => {
                if role != Role::Host {
                    return Ok(());
                }
                info!("Viewer {} joined '{}'", user_id, channel_id);
                self.emit(ClientEvent::ViewerJoined {
                    channel_id,
                    user_id: user_id.clone(),
                });
                self.offer_to(&user_id).await
            }

            ServerMessage::ViewerLeft {
                channel_id,
                user_id,
            } => {
                info!("Viewer {} left '{}'", user_id, channel_id);
                self.drop_peer(&user_id).await;
                self.emit(ClientEvent::ViewerLeft {
                    channel_id,
                    user_id,
                });
                Ok(())
            }

            ServerMessage::Offer { sdp, from, to, .. } => {
                if to != self.user_id {
                    return Ok(());
                }
                if role != Role::Viewer {
                    warn!("Host received an offer from {}, ignoring", from);
                    return Ok(());
                }
                self.accept_offer(from, sdp).await
            }

            ServerMessage::Answer { sdp, from, to, .. } => {
                if to != self.user_id {
                    return Ok(());
                }
                self.accept_answer(from, sdp).await
            }

            ServerMessage::Candidate {
                candidate,
                from,
                to,
                ..
            } => {
                if to != self.user_id {
                    return Ok(());
                }
                self.add_candidate(from, candidate).await;
                Ok(())
            }

            ServerMessage::StreamEnded { channel_id } => {
                info!("Stream '{}' ended", channel_id);
                self.active = None;
                self.dispose_all().await;
                self.emit(ClientEvent::StreamEnded { channel_id });
                Ok(())
            }

            ServerMessage::Welcome { .. } => Ok(()),
        }
    }

    pub async fn handle_endpoint_event(&mut self, event: EndpointEvent) -> Result<()> {
        let current = self.peers.get(event.remote()).map(|slot| slot.generation);
        if current != Some(event.generation()) {
            debug!(
                "Ignoring event from disposed endpoint {}#{}",
                event.remote(),
                event.generation()
            );
            return Ok(());
        }

        match event {
            EndpointEvent::LocalCandidate {
                remote, candidate, ..
            } => {
                let Some(channel_id) = self.channel_id().cloned() else {
                    return Ok(());
                };
                self.sink
                    .send(ClientMessage::Candidate {
                        channel_id,
                        candidate,
                        from: self.user_id.clone(),
                        to: remote,
                    })
                    .await
            }

            EndpointEvent::RemoteMedia { remote, media, .. } => {
                self.emit(ClientEvent::RemoteMedia { remote, media });
                Ok(())
            }

            EndpointEvent::StateChanged { remote, state, .. } => match state {
                EndpointState::Connected => {
                    info!("Connected to {}", remote);
                    self.retries.remove(&remote);
                    self.emit(ClientEvent::PeerConnected { remote });
                    Ok(())
                }
                EndpointState::Failed => {
                    warn!("Connection to {} failed", remote);
                    self.recover(&remote).await
                }
                other => {
                    debug!("Connection to {} is {:?}", remote, other);
                    Ok(())
                }
            },
        }
    }

    async fn acquire(&self, channel_id: &ChannelId, source: Option<&StreamSource>) -> Option<LocalStream> {
        let acquired = match source {
            None => return Some(LocalStream::empty()),
            Some(StreamSource::Camera(constraints)) => {
                self.media.acquire_local_stream(constraints).await
            }
            Some(StreamSource::Display) => self.media.acquire_display_stream().await,
        };

        match acquired {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!("Could not acquire media for '{}': {:#}", channel_id, e);
                self.emit(ClientEvent::CouldNotStart {
                    channel_id: channel_id.clone(),
                    reason: format!("{:#}", e),
                });
                None
            }
        }
    }

    async fn announce(&self) -> Result<()> {
        let Some(active) = &self.active else {
            return Ok(());
        };
        self.sink
            .send(ClientMessage::ViewerJoin {
                channel_id: active.channel_id.clone(),
                user_id: self.user_id.clone(),
            })
            .await
    }

    /// Opens a fresh endpoint towards `remote` and sends it an offer,
    /// spending retries while that fails.
    async fn offer_to(&mut self, remote: &UserId) -> Result<()> {
        loop {
            match self.open_offer(remote).await {
                Ok(sdp) => {
                    let Some(channel_id) = self.channel_id().cloned() else {
                        return Ok(());
                    };
                    return self
                        .sink
                        .send(ClientMessage::Offer {
                            channel_id,
                            sdp,
                            from: self.user_id.clone(),
                            to: remote.clone(),
                        })
                        .await;
                }
                Err(e) => {
                    warn!("Could not offer to {}: {:#}", remote, e);
                    if !self.note_failure(remote).await {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn open_offer(&mut self, remote: &UserId) -> Result<Value> {
        self.close_endpoint(remote).await;
        self.candidates.discard(remote);

        let (endpoint, generation) = self.open_endpoint(remote).await?;
        match endpoint.create_offer().await {
            Ok(sdp) => {
                self.peers.insert(
                    remote.clone(),
                    PeerSlot {
                        endpoint,
                        generation,
                        remote_described: false,
                    },
                );
                Ok(sdp)
            }
            Err(e) => {
                let _ = endpoint.close().await;
                Err(e)
            }
        }
    }

    async fn accept_offer(&mut self, from: UserId, sdp: Value) -> Result<()> {
        match self.answer_offer(&from, sdp).await {
            Ok(answer) => {
                let Some(channel_id) = self.channel_id().cloned() else {
                    return Ok(());
                };
                self.sink
                    .send(ClientMessage::Answer {
                        channel_id,
                        sdp: answer,
                        from: self.user_id.clone(),
                        to: from,
                    })
                    .await
            }
            Err(e) => {
                warn!("Could not answer offer from {}: {:#}", from, e);
                self.recover(&from).await
            }
        }
    }

    async fn answer_offer(&mut self, remote: &UserId, sdp: Value) -> Result<Value> {
        let reusable = self
            .peers
            .get(remote)
            .is_some_and(|slot| !slot.remote_described);
        if !reusable {
            self.close_endpoint(remote).await;
            let (endpoint, generation) = self.open_endpoint(remote).await?;
            self.peers.insert(
                remote.clone(),
                PeerSlot {
                    endpoint,
                    generation,
                    remote_described: false,
                },
            );
        }

        let slot = self.peers.get_mut(remote).context("endpoint disappeared")?;
        slot.endpoint.apply_remote_description(sdp).await?;
        slot.remote_described = true;

        self.drain_candidates(remote).await;

        let slot = self.peers.get(remote).context("endpoint disappeared")?;
        slot.endpoint.create_answer().await
    }

    async fn accept_answer(&mut self, from: UserId, sdp: Value) -> Result<()> {
        let Some(slot) = self.peers.get_mut(&from) else {
            debug!("Answer from {} without a pending offer", from);
            return Ok(());
        };
        if slot.remote_described {
            debug!("Duplicate answer from {}", from);
            return Ok(());
        }

        let applied = slot.endpoint.apply_remote_description(sdp).await;
        match applied {
            Ok(()) => {
                slot.remote_described = true;
                self.drain_candidates(&from).await;
                Ok(())
            }
            Err(e) => {
                warn!("Could not apply answer from {}: {:#}", from, e);
                self.recover(&from).await
            }
        }
    }

    async fn add_candidate(&mut self, remote: UserId, candidate: Value) {
        if let Some(slot) = self.peers.get(&remote).filter(|slot| slot.remote_described) {
            if let Err(e) = slot.endpoint.add_remote_candidate(candidate).await {
                warn!("Failed to add ICE candidate from {}: {:#}", remote, e);
            }
            return;
        }

        if !self.candidates.push(&remote, candidate) {
            warn!(
                "Candidate buffer for {} is full ({}), dropping candidate",
                remote, self.config.max_buffered_candidates
            );
        }
    }

    async fn drain_candidates(&mut self, remote: &UserId) {
        let pending = self.candidates.take(remote);
        if pending.is_empty() {
            return;
        }
        let Some(slot) = self.peers.get(remote) else {
            return;
        };

        debug!("Applying {} buffered candidates from {}", pending.len(), remote);
        for candidate in pending {
            if let Err(e) = slot.endpoint.add_remote_candidate(candidate).await {
                warn!("Failed to add buffered ICE candidate from {}: {:#}", remote, e);
            }
        }
    }

    async fn open_endpoint(&mut self, remote: &UserId) -> Result<(Box<dyn PeerEndpoint>, u64)> {
        self.next_generation += 1;
        let generation = self.next_generation;

        let Some(active) = &self.active else {
            bail!("not in a channel");
        };
        let endpoint = self
            .factory
            .create(
                remote.clone(),
                generation,
                &active.stream,
                &self.ice_servers,
                self.endpoint_tx.clone(),
            )
            .await
            .with_context(|| format!("Failed to open endpoint to {}", remote))?;

        debug!("Opened endpoint {}#{}", remote, generation);
        Ok((endpoint, generation))
    }

    /// Handles a failed negotiation with `remote`: the host offers again,
    /// the viewer asks the host to, until the retry budget is spent.
    async fn recover(&mut self, remote: &UserId) -> Result<()> {
        if !self.note_failure(remote).await {
            return Ok(());
        }

        match self.role() {
            Some(Role::Host) => self.offer_to(remote).await,
            Some(Role::Viewer) => {
                info!("Asking {} for a new offer", remote);
                self.announce().await
            }
            None => Ok(()),
        }
    }

    /// Disposes the endpoint to `remote` and reports the failure. Returns
    /// whether a retry is due.
    async fn note_failure(&mut self, remote: &UserId) -> bool {
        self.close_endpoint(remote).await;
        self.candidates.discard(remote);

        let used = self.retries.entry(remote.clone()).or_insert(0);
        let will_retry = *used < self.config.negotiation_retries;
        if will_retry {
            *used += 1;
        }

        self.emit(ClientEvent::NegotiationFailed {
            remote: remote.clone(),
            will_retry,
        });
        will_retry
    }

    async fn close_endpoint(&mut self, remote: &UserId) {
        let Some(slot) = self.peers.remove(remote) else {
            return;
        };
        if let Err(e) = slot.endpoint.close().await {
            warn!("Failed to close endpoint {}#{}: {:#}", remote, slot.generation, e);
        }
    }

    async fn drop_peer(&mut self, remote: &UserId) {
        self.close_endpoint(remote).await;
        self.candidates.discard(remote);
        self.retries.remove(remote);
    }

    async fn dispose_all(&mut self) {
        let peers: Vec<(UserId, PeerSlot)> = self.peers.drain().collect();
        for (remote, slot) in peers {
            if let Err(e) = slot.endpoint.close().await {
                warn!("Failed to close endpoint {}#{}: {:#}", remote, slot.generation, e);
            }
        }
        self.candidates.clear();
        self.retries.clear();
    }

    /// The relay is gone, so is the channel.
    async fn lose_channel(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.dispose_all().await;
        self.emit(ClientEvent::StreamEnded {
            channel_id: active.channel_id,
        });
    }

    fn emit(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            debug!("Nobody is listening for client events");
        }
    }
}
