//! Transport Handle contract.
//!
//! The transport is an external collaborator: a persistent bidirectional
//! connection that performs its own retry/backoff. This layer only observes
//! it through the [`Transport`] trait, receiving [`ConnectionEvent`]s through
//! registered listeners and reading [`TransportStatus`] on demand.

use std::{
    fmt,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::{Deserialize, Serialize};

/// Transport connection state as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// First connection attempt in progress.
    Connecting,
    /// Connection established.
    Connected,
    /// Connection lost, transport is retrying.
    Reconnecting,
    /// Connection closed, transport is not retrying.
    Disconnected,
    /// Transport gave up retrying.
    Failed,
}

impl ConnectionState {
    /// Whether the connection is established.
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    /// Whether the user may trigger a manual reconnect from this state.
    pub fn allows_manual_reconnect(self) -> bool {
        matches!(self, Self::Failed | Self::Disconnected)
    }

    /// Whether this state interrupts an established session.
    pub fn is_disruption(self) -> bool {
        matches!(self, Self::Reconnecting | Self::Disconnected | Self::Failed)
    }

    /// Stable lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
        }
    }

    /// Human-readable label shown by the status indicator.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "Подключение...",
            Self::Connected => "Подключено",
            Self::Reconnecting => "Переподключение...",
            Self::Disconnected => "Отключено",
            Self::Failed => "Ошибка подключения",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric close/error code carried by transport close and error payloads.
///
/// Values follow the WebSocket close code registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CloseCode(pub u16);

impl CloseCode {
    /// Normal closure.
    pub const NORMAL: Self = Self(1000);
    /// Endpoint going away.
    pub const GOING_AWAY: Self = Self(1001);
    /// Abnormal closure: connection lost without a close frame.
    pub const ABNORMAL: Self = Self(1006);
    /// Policy violation, used by the backend for expired sessions.
    pub const AUTH_FAILED: Self = Self(1008);
    /// Server hit an unexpected condition.
    pub const SERVER_ERROR: Self = Self(1011);

    /// Classify this code for user-facing handling.
    pub fn class(self) -> CloseClass {
        match self {
            Self::NORMAL | Self::GOING_AWAY => CloseClass::Normal,
            Self::ABNORMAL => CloseClass::ConnectionLost,
            Self::AUTH_FAILED => CloseClass::AuthFailed,
            Self::SERVER_ERROR => CloseClass::ServerError,
            _ => CloseClass::Other,
        }
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-facing classification of a close/error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseClass {
    /// Expected closure; nothing to report.
    Normal,
    /// Connection dropped unexpectedly.
    ConnectionLost,
    /// Session expired or credentials rejected.
    AuthFailed,
    /// Backend failure; retry later.
    ServerError,
    /// Anything else.
    Other,
}

/// Event names a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`ConnectionEvent::StateChange`]
    StateChange,
    /// [`ConnectionEvent::Error`]
    Error,
    /// [`ConnectionEvent::Open`]
    Open,
    /// [`ConnectionEvent::Close`]
    Close,
}

impl EventKind {
    /// Every event kind, in subscription order.
    pub const ALL: [Self; 4] = [Self::StateChange, Self::Error, Self::Open, Self::Close];
}

/// Events emitted by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Connection state changed.
    StateChange(ConnectionState),
    /// Transport reported an error.
    Error {
        /// Close code associated with the error, if any.
        code: Option<CloseCode>,
        /// Error description from the transport.
        message: String,
    },
    /// Socket opened.
    Open,
    /// Socket closed.
    Close {
        /// Close code.
        code: CloseCode,
        /// Close reason sent by the peer (may be empty).
        reason: String,
    },
}

impl ConnectionEvent {
    /// The subscription kind this event is delivered under.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::StateChange(_) => EventKind::StateChange,
            Self::Error { .. } => EventKind::Error,
            Self::Open => EventKind::Open,
            Self::Close { .. } => EventKind::Close,
        }
    }
}

/// Lifetime counters kept by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportStats {
    /// Successful connections since the transport was created.
    pub total_connections: u64,
    /// Successful connections that followed a disconnect.
    pub total_reconnections: u64,
    /// Messages delivered in either direction.
    pub total_messages: u64,
    /// Wall-clock time of the last successful connection (Unix millis).
    pub last_connected_at: Option<u64>,
}

/// Point-in-time status reported by [`Transport::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportStatus {
    /// Current connection state.
    pub connection_state: ConnectionState,
    /// Reconnect attempts since the last successful connection.
    pub reconnect_attempts: u32,
    /// Outbound messages buffered while disconnected.
    pub queued_messages: u32,
    /// Lifetime counters.
    pub stats: TransportStats,
}

impl TransportStatus {
    /// Status of a transport that has not connected yet.
    pub fn initial() -> Self {
        Self {
            connection_state: ConnectionState::Connecting,
            reconnect_attempts: 0,
            queued_messages: 0,
            stats: TransportStats::default(),
        }
    }
}

/// Event callback registered with a transport.
pub type Listener = Arc<dyn Fn(&ConnectionEvent) + Send + Sync>;

/// Registration token returned by [`Transport::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Transport Handle contract.
///
/// # Invariants
///
/// - A listener receives only events of the kind it subscribed to.
/// - After `unsubscribe` returns, the listener is never invoked again.
/// - `reconnect` is fire-and-forget; implementations guard against
///   concurrent attempts themselves.
pub trait Transport: Send + Sync {
    /// Register `listener` for events of `kind`.
    fn subscribe(&self, kind: EventKind, listener: Listener) -> ListenerId;

    /// Remove a listener. Returns `false` if it was not registered.
    fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool;

    /// Current status snapshot.
    fn status(&self) -> TransportStatus;

    /// Trigger a reconnection attempt.
    fn reconnect(&self);
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn subscribe(&self, kind: EventKind, listener: Listener) -> ListenerId {
        (**self).subscribe(kind, listener)
    }

    fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool {
        (**self).unsubscribe(kind, id)
    }

    fn status(&self) -> TransportStatus {
        (**self).status()
    }

    fn reconnect(&self) {
        (**self).reconnect();
    }
}

/// Listener bookkeeping shared by transport implementations.
///
/// Listeners are invoked outside the internal lock, so a listener may
/// subscribe or unsubscribe re-entrantly.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(EventKind, ListenerId, Listener)>>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry").field("len", &self.len()).finish()
    }
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn add(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).push((kind, id, listener));
        id
    }

    /// Remove a listener. Returns `false` if no listener matched.
    pub fn remove(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(k, i, _)| !(*k == kind && *i == id));
        listeners.len() != before
    }

    /// Deliver `event` to every listener subscribed to its kind.
    pub fn emit(&self, event: &ConnectionEvent) {
        let kind = event.kind();
        let targets: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, _, listener)| Arc::clone(listener))
            .collect();

        for listener in targets {
            listener(event);
        }
    }

    /// Number of registered listeners across all kinds.
    pub fn len(&self) -> usize {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
