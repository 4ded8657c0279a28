use crate::endpoint::{EndpointEvent, EndpointFactory, EndpointState, PeerEndpoint, RemoteMedia};
use crate::media::LocalStream;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use beamcast_core::{IceServerConfig, UserId};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::track::track_remote::TrackRemote;

/// Wire form of a session description.
#[derive(Debug, Deserialize)]
struct SessionDescription {
    #[serde(rename = "type")]
    kind: String,
    sdp: String,
}

impl SessionDescription {
    fn to_rtc(&self) -> Result<RTCSessionDescription> {
        let desc = match self.kind.as_str() {
            "offer" => RTCSessionDescription::offer(self.sdp.clone())?,
            "answer" => RTCSessionDescription::answer(self.sdp.clone())?,
            other => bail!("unsupported session description type '{}'", other),
        };
        Ok(desc)
    }
}

/// [`PeerEndpoint`] backed by a webrtc-rs peer connection.
pub struct RtcEndpoint {
    remote: UserId,
    peer_connection: Arc<RTCPeerConnection>,
}

impl RtcEndpoint {
    pub async fn new(
        remote: UserId,
        generation: u64,
        stream: &LocalStream,
        ice_servers: &[IceServerConfig],
        event_tx: mpsc::Sender<EndpointEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        for track in stream.tracks() {
            peer_connection
                .add_track(Arc::clone(track))
                .await
                .with_context(|| format!("Failed to attach local track {}", track.id()))?;
        }

        let state_tx = event_tx.clone();
        let uid_state = remote.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!("Peer connection to {} is {:?}", uid, s);
                    let Some(state) = endpoint_state(s) else { return };
                    let _ = tx
                        .send(EndpointEvent::StateChanged {
                            remote: uid,
                            generation,
                            state,
                        })
                        .await;
                })
            },
        ));

        // Trickle ICE
        let ice_tx = event_tx.clone();
        let uid_ice = remote.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(candidate) = serde_json::to_value(&init) else {
                    return;
                };
                let _ = tx
                    .send(EndpointEvent::LocalCandidate {
                        remote: uid,
                        generation,
                        candidate,
                    })
                    .await;
            })
        }));

        let track_tx = event_tx;
        let uid_track = remote.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>, _receiver, _transceiver| {
                let tx = track_tx.clone();
                let uid = uid_track.clone();

                Box::pin(async move {
                    debug!("Remote {} track from {}", track.kind(), uid);
                    let _ = tx
                        .send(EndpointEvent::RemoteMedia {
                            remote: uid,
                            generation,
                            media: RemoteMedia(track),
                        })
                        .await;
                })
            },
        ));

        Ok(Self {
            remote,
            peer_connection,
        })
    }
}

#[async_trait]
impl PeerEndpoint for RtcEndpoint {
    async fn create_offer(&self) -> Result<Value> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(description_json("offer", offer.sdp))
    }

    async fn apply_remote_description(&self, sdp: Value) -> Result<()> {
        let desc: SessionDescription =
            serde_json::from_value(sdp).context("Failed to parse session description JSON")?;
        self.peer_connection
            .set_remote_description(desc.to_rtc()?)
            .await?;
        Ok(())
    }

    async fn create_answer(&self) -> Result<Value> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(description_json("answer", answer.sdp))
    }

    async fn add_remote_candidate(&self, candidate: Value) -> Result<()> {
        let candidate: RTCIceCandidateInit =
            serde_json::from_value(candidate).context("Failed to parse ICE candidate JSON")?;
        self.peer_connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        debug!("Closing peer connection to {}", self.remote);
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Opens [`RtcEndpoint`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtcEndpointFactory;

#[async_trait]
impl EndpointFactory for RtcEndpointFactory {
    async fn create(
        &self,
        remote: UserId,
        generation: u64,
        stream: &LocalStream,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<EndpointEvent>,
    ) -> Result<Box<dyn PeerEndpoint>> {
        let endpoint = RtcEndpoint::new(remote, generation, stream, ice_servers, events).await?;
        Ok(Box::new(endpoint))
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
        ..Default::default()
    }
}

fn endpoint_state(state: RTCPeerConnectionState) -> Option<EndpointState> {
    let state = match state {
        RTCPeerConnectionState::New => EndpointState::New,
        RTCPeerConnectionState::Connecting => EndpointState::Connecting,
        RTCPeerConnectionState::Connected => EndpointState::Connected,
        RTCPeerConnectionState::Disconnected => EndpointState::Disconnected,
        RTCPeerConnectionState::Failed => EndpointState::Failed,
        RTCPeerConnectionState::Closed => EndpointState::Closed,
        _ => {
            warn!("Unexpected peer connection state {:?}", state);
            return None;
        }
    };
    Some(state)
}

fn description_json(kind: &str, sdp: String) -> Value {
    json!({ "type": kind, "sdp": sdp })
}
