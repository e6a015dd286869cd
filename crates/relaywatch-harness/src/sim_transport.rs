//! Scripted transport for simulation.
//!
//! [`MockTransport`] implements the [`Transport`] contract without a network.
//! Tests drive it by emitting events and editing the status it reports, and
//! inspect how many listeners are attached and how often reconnect was
//! requested.

use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicU32, Ordering},
};

use relaywatch_core::{
    CloseCode, ConnectionEvent, ConnectionState, EventKind, Listener, ListenerId,
    ListenerRegistry, Transport, TransportStatus,
};

/// In-memory transport driven by the test.
#[derive(Debug)]
pub struct MockTransport {
    listeners: ListenerRegistry,
    status: Mutex<TransportStatus>,
    reconnects: AtomicU32,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Transport in the `connecting` state.
    pub fn new() -> Self {
        Self::with_status(TransportStatus::initial())
    }

    /// Transport reporting `status`.
    pub fn with_status(status: TransportStatus) -> Self {
        Self {
            listeners: ListenerRegistry::new(),
            status: Mutex::new(status),
            reconnects: AtomicU32::new(0),
        }
    }

    /// Deliver an event to subscribed listeners.
    ///
    /// State changes also update the reported status.
    pub fn emit(&self, event: ConnectionEvent) {
        if let ConnectionEvent::StateChange(state) = event {
            self.update(|status| {
                status.connection_state = state;
                match state {
                    ConnectionState::Connected => {
                        status.reconnect_attempts = 0;
                        status.stats.total_connections += 1;
                    },
                    ConnectionState::Reconnecting => status.reconnect_attempts += 1,
                    _ => {},
                }
            });
        }
        self.listeners.emit(&event);
    }

    /// Emit a `stateChange`.
    pub fn set_state(&self, state: ConnectionState) {
        self.emit(ConnectionEvent::StateChange(state));
    }

    /// Emit an `error` carrying a close code.
    pub fn fail_with(&self, code: CloseCode, message: &str) {
        self.emit(ConnectionEvent::Error { code: Some(code), message: message.to_string() });
    }

    /// Emit a `close`.
    pub fn close(&self, code: CloseCode, reason: &str) {
        self.emit(ConnectionEvent::Close { code, reason: reason.to_string() });
    }

    /// Change the reported status without emitting anything, as if an event
    /// was lost.
    pub fn update(&self, f: impl FnOnce(&mut TransportStatus)) {
        f(&mut self.status.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Registered listeners across all kinds.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Times `reconnect()` was called.
    pub fn reconnect_calls(&self) -> u32 {
        self.reconnects.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn subscribe(&self, kind: EventKind, listener: Listener) -> ListenerId {
        self.listeners.add(kind, listener)
    }

    fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool {
        self.listeners.remove(kind, id)
    }

    fn status(&self) -> TransportStatus {
        self.status.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("mock transport reconnect requested");
    }
}
