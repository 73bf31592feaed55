//! Progress WebSocket session handling.
//!
//! One session per connected observer. The session loop multiplexes client
//! control frames, the session's registry channel, and a server-side ping
//! with an idle timeout. Control frames use the tagged protocol from
//! `provisio-core`; progress events go out as bare wire objects.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::Extension;
use axum::response::IntoResponse;
use futures_util::{Sink, SinkExt, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use provisio_core::{BroadcastRegistry, ClientMessage, ProgressEvent, ServerMessage};

use crate::server::config::AppConfig;

/// WebSocket upgrade handler
pub async fn progress_handler(
    ws: WebSocketUpgrade,
    Extension(registry): Extension<Arc<BroadcastRegistry>>,
    Extension(config): Extension<Arc<AppConfig>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry, config))
}

/// Handle one observer session until it ends, then scrub its memberships.
async fn handle_socket(socket: WebSocket, registry: Arc<BroadcastRegistry>, config: Arc<AppConfig>) {
    let session_id = Uuid::new_v4();
    info!(session = %session_id, "progress WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();

    // Send connection established message
    let connected = ServerMessage::Connected { session_id };
    if let Ok(json) = serde_json::to_string(&connected) {
        let _ = sender.send(Message::Text(json)).await;
    }

    // Registry channel for this session; the registry fans events into it
    let (tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent>();

    let mut ping_interval = tokio::time::interval(Duration::from_secs(
        config.progress.ping_interval_secs,
    ));
    let heartbeat_timeout = Duration::from_secs(config.progress.heartbeat_timeout_secs);
    let mut last_recv = tokio::time::Instant::now();

    loop {
        tokio::select! {
            // Client control frames
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_recv = tokio::time::Instant::now();
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(message) => {
                                handle_client_message(message, session_id, &registry, &tx)
                            }
                            Err(error) => Replies::one(ServerMessage::Error {
                                message: format!("Invalid message format: {}", error),
                                code: Some("INVALID_MESSAGE".to_string()),
                            }),
                        };
                        if send_replies(&mut sender, reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        last_recv = tokio::time::Instant::now();
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        last_recv = tokio::time::Instant::now();
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(session = %session_id, "progress WebSocket closed");
                        break;
                    }
                    Some(Err(error)) => {
                        warn!(session = %session_id, error = %error, "progress WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
            // Registry events for this session's memberships
            event = event_rx.recv() => {
                match event {
                    Some(event) => {
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if sender.send(Message::Text(json)).await.is_err() {
                                    break;
                                }
                            }
                            Err(error) => {
                                warn!(session = %session_id, error = %error, "failed to encode event");
                            }
                        }
                    }
                    // Unreachable while this loop holds `tx`
                    None => break,
                }
            }
            // Liveness: ping and idle timeout
            _ = ping_interval.tick() => {
                if last_recv.elapsed() > heartbeat_timeout {
                    info!(session = %session_id, "heartbeat timeout, closing session");
                    break;
                }
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    // Abrupt or clean, every membership goes
    registry.on_session_closed(session_id);
    info!(session = %session_id, "progress WebSocket connection ended");
}

/// Replies to one client frame: at most one control frame plus an optional
/// replayed progress event (sent bare, like live events).
struct Replies {
    control: ServerMessage,
    replay: Option<ProgressEvent>,
}

impl Replies {
    fn one(control: ServerMessage) -> Self {
        Self {
            control,
            replay: None,
        }
    }
}

/// Apply one control frame against the registry.
fn handle_client_message(
    message: ClientMessage,
    session_id: Uuid,
    registry: &BroadcastRegistry,
    tx: &tokio::sync::mpsc::UnboundedSender<ProgressEvent>,
) -> Replies {
    match message {
        ClientMessage::JoinTenant { tenant_id } => {
            let replay = registry.join(session_id, &tenant_id, tx.clone());
            debug!(session = %session_id, tenant = %tenant_id, replay = replay.is_some(), "join");
            Replies {
                control: ServerMessage::Joined { tenant_id },
                replay,
            }
        }
        ClientMessage::LeaveTenant { tenant_id } => {
            registry.leave(session_id, &tenant_id);
            Replies::one(ServerMessage::Left { tenant_id })
        }
        ClientMessage::Ping => Replies::one(ServerMessage::Pong),
    }
}

async fn send_replies(
    sender: &mut (impl Sink<Message, Error = axum::Error> + Unpin),
    replies: Replies,
) -> Result<(), axum::Error> {
    if let Ok(json) = serde_json::to_string(&replies.control) {
        sender.send(Message::Text(json)).await?;
    }
    if let Some(event) = replies.replay {
        if let Ok(json) = serde_json::to_string(&event) {
            sender.send(Message::Text(json)).await?;
        }
    }
    Ok(())
}
