use crate::relay::RelayCommand;
use crate::signaling::SignalingService;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use beamcast_core::{ClientMessage, ServerMessage, SessionId};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// `/ws` route with permissive CORS, so browser clients served from another
/// origin can connect.
pub fn router(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let session = SessionId::new();
    info!("New WebSocket connection: {}", session);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_session(session, tx);
    service.send_signal(
        session,
        &ServerMessage::Welcome {
            session_id: session,
            ice_servers: service.ice_servers(),
        },
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            debug!("{} <- {}", session, message.kind());
                            let cmd = RelayCommand::Message { session, message };
                            if let Err(e) = service.relay_tx.send(cmd).await {
                                error!("Relay died: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid ClientMessage from {}: {}", session, e),
                    },
                    Message::Binary(_) => warn!("Ignoring binary frame from {}", session),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_session(&session);

    // Whichever half ended first, the relay must clean up after this session.
    if let Err(e) = service
        .relay_tx
        .send(RelayCommand::Disconnect { session })
        .await
    {
        error!("Relay died before disconnect of {}: {}", session, e);
    }

    info!("WebSocket disconnected: {}", session);
}
