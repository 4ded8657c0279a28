use beamcast_core::{ChannelId, ClientMessage, SessionId};
use beamcast_server::{ChannelSnapshot, Relay, RelayCommand, RelaySettings};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::mock_signaling::MockSignalingOutput;
use super::signal_helpers::{join, viewer_join};

/// A relay loop running on its own task, fed directly with commands.
pub struct TestRelay {
    pub tx: mpsc::Sender<RelayCommand>,
    pub signaling: MockSignalingOutput,
}

impl TestRelay {
    pub fn start() -> Self {
        Self::with_settings(RelaySettings::default())
    }

    pub fn with_settings(settings: RelaySettings) -> Self {
        let (tx, rx) = mpsc::channel::<RelayCommand>(100);
        let signaling = MockSignalingOutput::new();

        let relay = Relay::new(rx, Arc::new(signaling.clone()), settings);
        tokio::spawn(async move {
            relay.run().await;
        });

        Self { tx, signaling }
    }

    pub async fn send(&self, session: SessionId, message: ClientMessage) {
        self.tx
            .send(RelayCommand::Message { session, message })
            .await
            .expect("relay stopped");
    }

    pub async fn disconnect(&self, session: SessionId) {
        self.tx
            .send(RelayCommand::Disconnect { session })
            .await
            .expect("relay stopped");
    }

    /// Commands are handled in order, so the reply also means every earlier
    /// command has been fully processed.
    pub async fn snapshot(&self, channel: &str) -> Option<ChannelSnapshot> {
        let (cmd, rx) = RelayCommand::snapshot(ChannelId::from(channel));
        self.tx.send(cmd).await.expect("relay stopped");
        rx.await.expect("relay dropped snapshot reply")
    }

    pub async fn host(&self, channel: &str, user: &str) -> SessionId {
        let session = SessionId::new();
        self.send(session, join(channel, true, user)).await;
        session
    }

    pub async fn watch(&self, channel: &str, user: &str) -> SessionId {
        let session = SessionId::new();
        self.send(session, join(channel, false, user)).await;
        self.send(session, viewer_join(channel, user)).await;
        session
    }
}
