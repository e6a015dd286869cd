//! Transport subscription lifecycle.
//!
//! [`StatusMonitor`] owns the listener registrations of one mounted status
//! indicator. Events are forwarded into a channel drained by the runtime, so
//! transport callbacks never touch presenter state directly. Dropping the
//! monitor unsubscribes every listener it registered.

use std::{fmt, sync::Arc};

use relaywatch_core::{ConnectionEvent, EventKind, ListenerId, Transport, TransportStatus};
use tokio::sync::mpsc;

/// Mounted subscription to a transport's events.
pub struct StatusMonitor {
    transport: Option<Arc<dyn Transport>>,
    subscriptions: Vec<(EventKind, ListenerId)>,
    // Keeps the event channel open while no transport is attached.
    _keepalive: mpsc::UnboundedSender<ConnectionEvent>,
}

impl StatusMonitor {
    /// Subscribe to every event kind of `transport`.
    ///
    /// With no transport nothing is subscribed and the returned receiver
    /// never yields.
    pub fn mount(
        transport: Option<Arc<dyn Transport>>,
    ) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let subscriptions = match &transport {
            Some(transport) => EventKind::ALL
                .iter()
                .map(|&kind| {
                    let tx = tx.clone();
                    let id = transport.subscribe(
                        kind,
                        Arc::new(move |event: &ConnectionEvent| {
                            // Receiver gone means the runtime is shutting down.
                            let _ = tx.send(event.clone());
                        }),
                    );
                    (kind, id)
                })
                .collect(),
            None => {
                tracing::debug!("status monitor mounted without transport");
                Vec::new()
            },
        };

        (Self { transport, subscriptions, _keepalive: tx }, rx)
    }

    /// Whether a transport is attached.
    pub fn is_attached(&self) -> bool {
        self.transport.is_some()
    }

    /// Poll the transport's status.
    pub fn status(&self) -> Option<TransportStatus> {
        self.transport.as_ref().map(|t| t.status())
    }

    /// Ask the transport to reconnect. Returns `false` without a transport.
    pub fn reconnect(&self) -> bool {
        match &self.transport {
            Some(transport) => {
                transport.reconnect();
                true
            },
            None => false,
        }
    }

    /// Number of listeners this monitor holds.
    pub fn subscriptions(&self) -> usize {
        self.subscriptions.len()
    }
}

impl fmt::Debug for StatusMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusMonitor")
            .field("attached", &self.is_attached())
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}

impl Drop for StatusMonitor {
    fn drop(&mut self) {
        let Some(transport) = &self.transport else { return };
        for (kind, id) in self.subscriptions.drain(..) {
            if !transport.unsubscribe(kind, id) {
                tracing::warn!(?kind, ?id, "listener already removed at unmount");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use relaywatch_core::{ConnectionState, ListenerRegistry, Listener};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        listeners: ListenerRegistry,
        reconnects: AtomicU32,
    }

    impl Transport for Recorder {
        fn subscribe(&self, kind: EventKind, listener: Listener) -> ListenerId {
            self.listeners.add(kind, listener)
        }

        fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool {
            self.listeners.remove(kind, id)
        }

        fn status(&self) -> TransportStatus {
            TransportStatus::initial()
        }

        fn reconnect(&self) {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn forwards_events_and_unsubscribes_on_drop() {
        let transport = Arc::new(Recorder::default());
        let (monitor, mut rx) = StatusMonitor::mount(Some(transport.clone()));
        assert_eq!(transport.listeners.len(), 4);
        assert_eq!(monitor.subscriptions(), 4);

        transport.listeners.emit(&ConnectionEvent::StateChange(ConnectionState::Failed));
        assert_eq!(rx.try_recv().ok(), Some(ConnectionEvent::StateChange(ConnectionState::Failed)));
        assert!(rx.try_recv().is_err(), "one listener per kind");

        assert!(monitor.reconnect());
        assert_eq!(transport.reconnects.load(Ordering::SeqCst), 1);

        drop(monitor);
        assert!(transport.listeners.is_empty());
    }

    #[test]
    fn absent_transport_is_inert() {
        let (monitor, mut rx) = StatusMonitor::mount(None);
        assert!(!monitor.is_attached());
        assert_eq!(monitor.status(), None);
        assert!(!monitor.reconnect());
        assert!(rx.try_recv().is_err());
    }
}
