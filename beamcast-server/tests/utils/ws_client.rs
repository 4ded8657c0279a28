use anyhow::{Context, Result};
use beamcast_core::{ClientMessage, IceServerConfig, ServerMessage};
use beamcast_server::{RelaySettings, SignalingService, router, spawn_relay};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single expected message (ms).
pub const RECV_TIMEOUT_MS: u64 = 2000;

/// Serves the real router on an ephemeral port.
pub async fn start_server() -> (SocketAddr, SignalingService) {
    let ice = vec![IceServerConfig {
        urls: vec!["stun:stun.example.org:3478".to_owned()],
        username: None,
        credential: None,
    }];
    let service = spawn_relay(RelaySettings::default(), ice, 64);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = router(service.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, service)
}

/// Browser stand-in speaking the relay's JSON protocol.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let url = format!("ws://{}/ws", addr);
        let (stream, _) = connect_async(&url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.send_raw(&json).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.stream
            .send(Message::Text(text.to_owned().into()))
            .await
            .context("Failed to send frame")
    }

    /// Next relay message, skipping control frames.
    pub async fn recv(&mut self) -> Result<ServerMessage> {
        let deadline = Duration::from_millis(RECV_TIMEOUT_MS);
        loop {
            let frame = tokio::time::timeout(deadline, self.stream.next())
                .await
                .context("Timeout waiting for relay message")?
                .context("Socket closed")??;

            if let Message::Text(text) = frame {
                return serde_json::from_str(&text).context("Unparseable relay message");
            }
        }
    }

    /// Asserts nothing arrives within `ms`.
    pub async fn expect_silence(&mut self, ms: u64) -> Result<()> {
        match tokio::time::timeout(Duration::from_millis(ms), self.stream.next()).await {
            Err(_) => Ok(()),
            Ok(frame) => anyhow::bail!("Unexpected frame: {:?}", frame),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await.context("Failed to close")
    }
}
