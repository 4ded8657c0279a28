use crate::relay::SignalSink;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use beamcast_core::{ClientMessage, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Inbound relay messages not yet picked up by the channel client.
const INBOUND_BUFFER: usize = 256;

/// Websocket connection to the signaling relay.
///
/// Outbound messages are queued to a writer task. Inbound text frames are
/// decoded and handed out on the receiver returned by [`connect`]; the
/// receiver closes when the socket does. Dropping the connection closes the
/// socket once the writer has drained its queue.
///
/// [`connect`]: RelayConnection::connect
pub struct RelayConnection {
    outbound: mpsc::UnboundedSender<ClientMessage>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl RelayConnection {
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<ServerMessage>)> {
        let (ws_stream, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to relay at {}", url))?;
        info!("Connected to relay at {}", url);

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);

        let writer = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize {}: {}", msg.kind(), e);
                        continue;
                    }
                };
                if let Err(e) = ws_sender.send(Message::Text(json.into())).await {
                    error!("Relay socket write failed: {}", e);
                    break;
                }
            }
            let _ = ws_sender.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = ws_receiver.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(msg) => {
                            debug!("relay -> {}", msg.kind());
                            if inbound_tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Unparseable relay message: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        error!("Relay socket read failed: {}", e);
                        break;
                    }
                }
            }
            info!("Relay connection closed");
        });

        Ok((
            Self {
                outbound,
                writer,
                reader,
            },
            inbound_rx,
        ))
    }

    /// Flushes queued messages, then closes the socket.
    pub async fn close(self) {
        let Self {
            outbound,
            writer,
            reader,
        } = self;
        drop(outbound);
        if let Err(e) = writer.await {
            warn!("Relay writer ended abnormally: {}", e);
        }
        reader.abort();
    }
}

#[async_trait]
impl SignalSink for RelayConnection {
    async fn send(&self, message: ClientMessage) -> Result<()> {
        self.outbound
            .send(message)
            .map_err(|e| anyhow!("Relay connection is closed, dropped {}", e.0.kind()))
    }
}
