//! Resilient WebSocket connection manager.
//!
//! Owns one transport session per observed tenant: connect + join handshake,
//! keep-alive, automatic reconnect with backoff, re-join after reconnect, and
//! deliberate teardown. Every received progress event is handed unmodified to
//! the [`ProgressMonitor`]; the manager itself never interprets step
//! semantics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use provisio_core::{ClientMessage, Error, InboundFrame, Result, ServerMessage};

use crate::backoff::reconnect_delay;
use crate::monitor::ProgressMonitor;

// Type aliases because tokio-tungstenite streams are a mouthful
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSender = SplitSink<WsStream, Message>;
type WsReceiver = SplitStream<WsStream>;

/// Transport lifecycle, independent of provisioning step state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport, no reconnect loop running
    Disconnected,
    /// Initial handshake in flight
    Connecting,
    /// Session established and joined
    Connected,
    /// Transport dropped; backoff loop is re-establishing
    Reconnecting,
}

/// Options for observing one tenant's progress stream.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// WebSocket endpoint, e.g. `ws://localhost:8080/ws/progress`
    pub url: String,
    /// Tenant whose stream to join
    pub tenant_id: String,
    /// Keep-alive interval; the server's idle timeout is generously longer
    pub keepalive: Duration,
    /// How long to wait for the join acknowledgement
    pub handshake_timeout: Duration,
    /// Grace delay before the completion callback fires
    pub completion_grace: Duration,
}

impl WatchOptions {
    /// Options with the default timing for the given endpoint and tenant.
    pub fn new(url: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tenant_id: tenant_id.into(),
            keepalive: Duration::from_secs(15),
            handshake_timeout: Duration::from_secs(10),
            completion_grace: Duration::from_secs(3),
        }
    }
}

/// Why a session loop ended.
enum SessionEnd {
    /// `disconnect()` was called; leave was sent and the socket closed
    Shutdown,
    /// Server closed the socket deliberately
    CleanClose,
    /// Group-protocol error; surfaced, no reconnect
    Fatal,
    /// Transport died unexpectedly; reconnect
    Dropped,
}

/// One resilient logical stream to the progress endpoint.
///
/// All mutable session internals (transport halves, pending timer, reconnect
/// loop) are owned here and torn down together by [`disconnect`].
///
/// [`disconnect`]: ProgressConnection::disconnect
pub struct ProgressConnection {
    options: WatchOptions,
    monitor: Arc<ProgressMonitor>,
    state: Arc<RwLock<ConnectionState>>,
    shutdown: CancellationToken,
    driver: Mutex<Option<JoinHandle<()>>>,
    reconnects: Arc<AtomicUsize>,
}

impl ProgressConnection {
    /// Create a connection manager. No transport is opened until
    /// [`connect`](Self::connect).
    ///
    /// The monitor's completion grace is taken from `options.completion_grace`.
    #[must_use]
    pub fn new(options: WatchOptions, monitor: ProgressMonitor) -> Self {
        let monitor = monitor.with_completion_grace(options.completion_grace);
        Self {
            options,
            monitor: Arc::new(monitor),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            shutdown: CancellationToken::new(),
            driver: Mutex::new(None),
            reconnects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Establish the transport and join the tenant's group.
    ///
    /// Fails loudly if the initial handshake cannot be established; there is
    /// no silent retry on the very first attempt. After a successful connect
    /// the session keeps itself alive until [`disconnect`](Self::disconnect)
    /// or a clean server close.
    ///
    /// The connection is single-use: once [`disconnect`](Self::disconnect)
    /// has been called, further connect attempts are rejected. Observing the
    /// same tenant again takes a fresh [`ProgressConnection`].
    pub async fn connect(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if self.shutdown.is_cancelled() {
                return Err(Error::Connection(
                    "connection has been shut down".to_string(),
                ));
            }
            if *state != ConnectionState::Disconnected {
                return Err(Error::Connection("already connected".to_string()));
            }
            *state = ConnectionState::Connecting;
        }

        let session = match establish_session(&self.options, &self.monitor).await {
            Ok(session) => session,
            Err(error) => {
                *self.state.write().await = ConnectionState::Disconnected;
                return Err(error);
            }
        };
        *self.state.write().await = ConnectionState::Connected;
        info!(tenant = %self.options.tenant_id, "progress stream connected");

        let driver = tokio::spawn(drive(
            session,
            self.options.clone(),
            Arc::clone(&self.monitor),
            Arc::clone(&self.state),
            self.shutdown.clone(),
            Arc::clone(&self.reconnects),
        ));
        *self.driver.lock().await = Some(driver);
        Ok(())
    }

    /// Deliberately tear the session down: leave the group, close the
    /// transport, stop the reconnect loop and cancel any pending completion
    /// callback, together.
    pub async fn disconnect(&self) {
        self.shutdown.cancel();
        self.monitor.cancel();
        if let Some(driver) = self.driver.lock().await.take() {
            let _ = driver.await;
        }
        *self.state.write().await = ConnectionState::Disconnected;
        info!(tenant = %self.options.tenant_id, "progress stream disconnected");
    }

    /// Current transport state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Number of successful reconnects (not counting the initial connect).
    #[must_use]
    pub fn reconnect_count(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }

    /// The monitor holding the reduced provisioning state.
    #[must_use]
    pub fn monitor(&self) -> &ProgressMonitor {
        &self.monitor
    }
}

/// Open the transport, send `join_tenant` and wait for the acknowledgement.
///
/// Progress events arriving during the handshake (the server's last-event
/// replay) are fed straight into the monitor so nothing is lost.
async fn establish_session(
    options: &WatchOptions,
    monitor: &ProgressMonitor,
) -> Result<(WsSender, WsReceiver)> {
    let url = Url::parse(&options.url).map_err(|error| Error::InvalidConfig {
        field: "url".to_string(),
        message: error.to_string(),
    })?;

    let (stream, _) = connect_async(url)
        .await
        .map_err(|error| Error::Connection(error.to_string()))?;
    let (mut ws_tx, mut ws_rx) = stream.split();

    let join = ClientMessage::JoinTenant {
        tenant_id: options.tenant_id.clone(),
    };
    ws_tx
        .send(Message::Text(serde_json::to_string(&join)?))
        .await
        .map_err(|error| Error::Connection(error.to_string()))?;

    let ack = tokio::time::timeout(
        options.handshake_timeout,
        wait_for_join_ack(&mut ws_rx, monitor),
    )
    .await
    .map_err(|_| Error::Handshake("timed out waiting for join acknowledgement".to_string()))??;

    debug!(tenant = %ack, "joined tenant group");
    Ok((ws_tx, ws_rx))
}

/// Read frames until the `joined` acknowledgement arrives.
async fn wait_for_join_ack(ws_rx: &mut WsReceiver, monitor: &ProgressMonitor) -> Result<String> {
    while let Some(frame) = ws_rx.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                return Err(Error::Handshake("server closed during handshake".to_string()))
            }
            Ok(_) => continue,
            Err(error) => return Err(Error::Connection(error.to_string())),
        };
        match serde_json::from_str::<InboundFrame>(&text) {
            Ok(InboundFrame::Control(ServerMessage::Joined { tenant_id })) => {
                return Ok(tenant_id);
            }
            Ok(InboundFrame::Control(ServerMessage::Error { message, code })) => {
                return Err(Error::Group { code, message });
            }
            Ok(InboundFrame::Control(_)) => {}
            Ok(InboundFrame::Progress(event)) => monitor.ingest(&event),
            Err(error) => {
                debug!(error = %error, "ignoring unparseable frame during handshake");
            }
        }
    }
    Err(Error::Handshake("connection lost during handshake".to_string()))
}

/// Session driver: run the current session, reconnect with backoff on
/// unexpected drops, stop on shutdown, clean close or fatal protocol error.
async fn drive(
    mut session: (WsSender, WsReceiver),
    options: WatchOptions,
    monitor: Arc<ProgressMonitor>,
    state: Arc<RwLock<ConnectionState>>,
    shutdown: CancellationToken,
    reconnects: Arc<AtomicUsize>,
) {
    loop {
        let end = run_session(session.0, session.1, &options, &monitor, &shutdown).await;
        match end {
            SessionEnd::Shutdown | SessionEnd::CleanClose | SessionEnd::Fatal => {
                *state.write().await = ConnectionState::Disconnected;
                return;
            }
            SessionEnd::Dropped => {
                warn!(tenant = %options.tenant_id, "progress stream dropped, reconnecting");
                *state.write().await = ConnectionState::Reconnecting;
                match reconnect(&options, &monitor, &shutdown).await {
                    Some(new_session) => {
                        reconnects.fetch_add(1, Ordering::SeqCst);
                        *state.write().await = ConnectionState::Connected;
                        info!(tenant = %options.tenant_id, "progress stream reconnected");
                        session = new_session;
                    }
                    None => {
                        *state.write().await = ConnectionState::Disconnected;
                        return;
                    }
                }
            }
        }
    }
}

/// Retry until a session is re-established or `disconnect()` is called.
/// Membership does not survive a transport reconnect, so every attempt goes
/// through the full join handshake again.
async fn reconnect(
    options: &WatchOptions,
    monitor: &ProgressMonitor,
    shutdown: &CancellationToken,
) -> Option<(WsSender, WsReceiver)> {
    let mut attempt: u32 = 0;
    loop {
        tokio::select! {
            () = shutdown.cancelled() => return None,
            () = tokio::time::sleep(reconnect_delay(attempt)) => {}
        }
        match establish_session(options, monitor).await {
            Ok(session) => return Some(session),
            Err(error) => {
                warn!(attempt, error = %error, "reconnect attempt failed");
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

/// One unbroken connection: multiplex incoming frames, the keep-alive timer
/// and the shutdown signal.
async fn run_session(
    mut ws_tx: WsSender,
    mut ws_rx: WsReceiver,
    options: &WatchOptions,
    monitor: &ProgressMonitor,
    shutdown: &CancellationToken,
) -> SessionEnd {
    let mut keepalive = tokio::time::interval(options.keepalive);
    keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; an eager ping is harmless.

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                let leave = ClientMessage::LeaveTenant {
                    tenant_id: options.tenant_id.clone(),
                };
                if let Ok(json) = serde_json::to_string(&leave) {
                    let _ = ws_tx.send(Message::Text(json)).await;
                }
                let _ = ws_tx.send(Message::Close(None)).await;
                return SessionEnd::Shutdown;
            }
            _ = keepalive.tick() => {
                let ping = match serde_json::to_string(&ClientMessage::Ping) {
                    Ok(json) => json,
                    Err(_) => continue,
                };
                if ws_tx.send(Message::Text(ping)).await.is_err() {
                    return SessionEnd::Dropped;
                }
            }
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<InboundFrame>(&text) {
                            Ok(InboundFrame::Progress(event)) => monitor.ingest(&event),
                            Ok(InboundFrame::Control(ServerMessage::Error { message, code })) => {
                                warn!(?code, %message, "group protocol error");
                                monitor.protocol_error(&message);
                                return SessionEnd::Fatal;
                            }
                            Ok(InboundFrame::Control(_)) => {}
                            Err(error) => {
                                debug!(error = %error, "ignoring unparseable frame");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_tx.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) => return SessionEnd::CleanClose,
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        warn!(error = %error, "websocket error");
                        return SessionEnd::Dropped;
                    }
                    None => return SessionEnd::Dropped,
                }
            }
        }
    }
}
