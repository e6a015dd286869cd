//! WebSocket transport.
//!
//! [`WsTransport`] owns a background task that keeps one WebSocket session
//! alive: it connects, retries with exponential backoff, counts traffic and
//! reports every transition to subscribed listeners. After `max_attempts`
//! failed connects it parks in `failed` until [`Transport::reconnect`] is
//! called.

use std::{
    sync::{
        Arc, Mutex, PoisonError, Weak,
        atomic::{AtomicU32, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use futures::{SinkExt, StreamExt};
use relaywatch_core::{
    CloseClass, CloseCode, ConnectionEvent, ConnectionState, EventKind, Listener, ListenerId,
    ListenerRegistry, Transport, TransportStatus,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    net::TcpStream,
    sync::{Notify, mpsc},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message, protocol::CloseFrame},
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The URL is not a WebSocket URL.
    #[error("invalid websocket url {0:?}: expected ws:// or wss://")]
    InvalidUrl(String),

    /// Handshake or stream failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

/// Reconnection policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Failed connects before parking in `failed`. 0 retries forever.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
    /// Growth factor per attempt.
    pub backoff_multiplier: f32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_multiplier: 1.5,
        }
    }
}

impl ReconnectConfig {
    /// Delay before retry number `attempt` (0-based), capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f32() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f32(secs).map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

struct Shared {
    listeners: ListenerRegistry,
    status: Mutex<TransportStatus>,
    queued: AtomicU32,
    reconnect: Notify,
}

impl Shared {
    fn update(&self, f: impl FnOnce(&mut TransportStatus)) {
        f(&mut self.status.lock().unwrap_or_else(PoisonError::into_inner));
    }

    fn set_state(&self, state: ConnectionState) {
        let changed = {
            let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
            let changed = status.connection_state != state;
            status.connection_state = state;
            changed
        };
        if changed {
            tracing::debug!(state = state.as_str(), "transport state");
            self.listeners.emit(&ConnectionEvent::StateChange(state));
        }
    }

    fn set_attempts(&self, attempts: u32) {
        self.update(|status| status.reconnect_attempts = attempts);
    }

    fn connected(&self, reconnection: bool) {
        let wall_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|since| u64::try_from(since.as_millis()).ok());
        self.update(|status| {
            status.reconnect_attempts = 0;
            status.stats.total_connections += 1;
            if reconnection {
                status.stats.total_reconnections += 1;
            }
            status.stats.last_connected_at = wall_ms;
        });
    }

    fn count_message(&self) {
        self.update(|status| status.stats.total_messages += 1);
    }

    fn dequeued(&self) {
        let _ = self.queued.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

/// WebSocket connection watched by the status indicator.
///
/// Dropping the transport aborts the session task.
pub struct WsTransport {
    url: String,
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport").field("url", &self.url).finish_non_exhaustive()
    }
}

impl WsTransport {
    /// Start connecting to `url` in the background.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] unless `url` is `ws://` or
    /// `wss://`.
    pub fn spawn(url: impl Into<String>, config: ReconnectConfig) -> Result<Self, TransportError> {
        let url = url.into();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(TransportError::InvalidUrl(url));
        }

        let shared = Arc::new(Shared {
            listeners: ListenerRegistry::new(),
            status: Mutex::new(TransportStatus::initial()),
            queued: AtomicU32::new(0),
            reconnect: Notify::new(),
        });
        let (outbound, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(url.clone(), config, Arc::clone(&shared), rx));

        Ok(Self { url, shared, outbound, task })
    }

    /// Queue a text frame. Frames wait in the queue while disconnected.
    pub fn send(&self, text: impl Into<String>) {
        self.shared.queued.fetch_add(1, Ordering::AcqRel);
        if self.outbound.send(text.into()).is_err() {
            self.shared.dequeued();
            tracing::warn!(url = %self.url, "session task gone, frame dropped");
        }
    }

    /// Endpoint this transport connects to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Transport for WsTransport {
    fn subscribe(&self, kind: EventKind, listener: Listener) -> ListenerId {
        self.shared.listeners.add(kind, listener)
    }

    fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool {
        self.shared.listeners.remove(kind, id)
    }

    fn status(&self) -> TransportStatus {
        let mut status = self.shared.status.lock().unwrap_or_else(PoisonError::into_inner).clone();
        status.queued_messages = self.shared.queued.load(Ordering::Acquire);
        status
    }

    fn reconnect(&self) {
        tracing::info!(url = %self.url, "reconnect requested");
        self.shared.reconnect.notify_one();
    }
}

#[derive(Debug, Serialize)]
struct Heartbeat {
    #[serde(rename = "type")]
    kind: &'static str,
    seq: u64,
}

/// Queue a heartbeat frame every `every` until the transport is dropped.
///
/// Heartbeats queue up while disconnected and are flushed on reconnect, which
/// is what the indicator's queued-message counter shows.
pub fn spawn_heartbeat(transport: Weak<WsTransport>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        let mut seq = 0u64;
        loop {
            interval.tick().await;
            let Some(transport) = transport.upgrade() else { break };
            seq += 1;
            match serde_json::to_string(&Heartbeat { kind: "ping", seq }) {
                Ok(frame) => transport.send(frame),
                Err(e) => tracing::warn!(error = %e, "heartbeat encode failed"),
            }
        }
    })
}

async fn run(
    url: String,
    config: ReconnectConfig,
    shared: Arc<Shared>,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let mut attempt = 0u32;
    let mut ever_connected = false;
    // One connection-lost report per outage; later retries only move the state.
    let mut outage_reported = false;

    loop {
        shared.set_attempts(attempt);
        shared.set_state(if attempt == 0 {
            ConnectionState::Connecting
        } else {
            ConnectionState::Reconnecting
        });

        let stream = match connect(&url).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(%url, attempt, error = %e, "websocket connect failed");
                if !std::mem::replace(&mut outage_reported, true) {
                    shared.listeners.emit(&ConnectionEvent::Error {
                        code: Some(CloseCode::ABNORMAL),
                        message: e.to_string(),
                    });
                }

                if config.max_attempts > 0 && attempt >= config.max_attempts {
                    tracing::error!(%url, attempt, "giving up until a manual reconnect");
                    shared.set_state(ConnectionState::Failed);
                    shared.reconnect.notified().await;
                    attempt = 0;
                    continue;
                }

                let delay = config.delay_for_attempt(attempt);
                attempt += 1;
                shared.set_attempts(attempt);
                shared.set_state(ConnectionState::Reconnecting);
                tokio::select! {
                    () = tokio::time::sleep(delay) => {},
                    () = shared.reconnect.notified() => {
                        tracing::debug!("backoff skipped by manual reconnect");
                    },
                }
                continue;
            },
        };

        tracing::info!(%url, "websocket connected");
        shared.connected(ever_connected);
        ever_connected = true;
        outage_reported = false;
        attempt = 0;
        shared.listeners.emit(&ConnectionEvent::Open);
        shared.set_state(ConnectionState::Connected);

        let (code, reason) = session(stream, &shared, &mut outbound).await;
        shared.listeners.emit(&ConnectionEvent::Close { code, reason: reason.clone() });

        match code.class() {
            CloseClass::Normal | CloseClass::AuthFailed => {
                tracing::info!(%url, code = code.0, %reason, "websocket closed, waiting for reconnect");
                shared.set_state(ConnectionState::Disconnected);
                shared.reconnect.notified().await;
            },
            _ => {
                tracing::warn!(%url, code = code.0, %reason, "websocket dropped");
                outage_reported = true;
                attempt = 1;
            },
        }
    }
}

async fn connect(url: &str) -> Result<WsStream, TransportError> {
    let (stream, _response) = connect_async(url).await?;
    Ok(stream)
}

/// Pump one live session until it ends. Returns the close code and reason.
async fn session(
    stream: WsStream,
    shared: &Shared,
    outbound: &mut mpsc::UnboundedReceiver<String>,
) -> (CloseCode, String) {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            incoming = read.next() => match incoming {
                Some(Ok(Message::Close(frame))) => return close_reason(frame),
                Some(Ok(Message::Text(_) | Message::Binary(_))) => shared.count_message(),
                Some(Ok(_)) => {},
                Some(Err(e)) => return (CloseCode::ABNORMAL, e.to_string()),
                None => return (CloseCode::ABNORMAL, "stream ended".to_owned()),
            },
            Some(text) = outbound.recv() => {
                shared.dequeued();
                if let Err(e) = write.send(Message::text(text)).await {
                    return (CloseCode::ABNORMAL, e.to_string());
                }
                shared.count_message();
            },
        }
    }
}

fn close_reason(frame: Option<CloseFrame>) -> (CloseCode, String) {
    match frame {
        Some(frame) => (CloseCode(u16::from(frame.code)), frame.reason.as_str().to_owned()),
        None => (CloseCode::NORMAL, String::new()),
    }
}
