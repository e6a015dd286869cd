//! Mounted notification queue and its caller-facing handle.
//!
//! [`NotificationCenter`] owns the [`Deduplicator`] for one mounted
//! notification presenter. Any component that wants to raise a notification
//! gets a [`Notifications`] handle by value instead of reaching for a global.
//! Handles outlive the center safely: once it is unmounted every call is a
//! no-op that returns `false`.

use std::fmt;

use relaywatch_core::{
    Activation, DedupConfig, DedupEvent, Deduplicator, EnqueueOutcome, Environment,
    NotificationCard, NotificationId, NotificationOptions, NotificationRequest, NotifyError,
    Timestamp, alerts, presenter,
};
use tokio::sync::mpsc;

/// Request sent from a [`Notifications`] handle to the mounted center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enqueue through debounce and suppression.
    Show(NotificationRequest),
    /// Remove a visible notification.
    Remove(NotificationId),
}

/// Handle for raising notifications from anywhere in the application.
///
/// Cheap to clone. Bound to the center that created it: after that center is
/// unmounted the handle is inert, and a re-mounted center hands out new
/// handles.
#[derive(Clone)]
pub struct Notifications {
    tx: mpsc::UnboundedSender<Command>,
}

impl Notifications {
    /// A handle that was never mounted. Every call is a no-op.
    pub fn detached() -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self { tx }
    }

    /// Whether the center behind this handle is still mounted.
    pub fn is_mounted(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Enqueue an arbitrary request.
    pub fn show(&self, request: NotificationRequest) -> bool {
        self.send(Command::Show(request))
    }

    /// Report an error. Accepts error values and plain strings alike.
    pub fn show_error(&self, error: impl fmt::Display, options: NotificationOptions) -> bool {
        self.show(
            NotificationRequest::error(alerts::GENERIC_ERROR_TITLE, error.to_string())
                .with_options(options),
        )
    }

    /// Report a success.
    pub fn show_success(&self, message: impl Into<String>, options: NotificationOptions) -> bool {
        self.show(NotificationRequest::success(alerts::SUCCESS_TITLE, message).with_options(options))
    }

    /// Report an informational notice.
    pub fn show_info(&self, message: impl Into<String>, options: NotificationOptions) -> bool {
        self.show(NotificationRequest::info(alerts::INFO_TITLE, message).with_options(options))
    }

    /// Report that `model` cannot serve requests right now.
    pub fn show_model_unavailable(&self, model: &str) -> bool {
        self.show(alerts::model_unavailable(model))
    }

    /// Remove a visible notification by id.
    pub fn remove_notification(&self, id: NotificationId) -> bool {
        self.send(Command::Remove(id))
    }

    fn send(&self, command: Command) -> bool {
        match self.tx.send(command) {
            Ok(()) => true,
            Err(mpsc::error::SendError(command)) => {
                tracing::debug!(?command, "notification center not mounted, dropping");
                false
            },
        }
    }
}

impl fmt::Debug for Notifications {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifications").field("mounted", &self.is_mounted()).finish()
    }
}

/// Mounted notification presenter state.
#[derive(Debug)]
pub struct NotificationCenter<I> {
    dedup: Deduplicator<I>,
    commands: mpsc::UnboundedReceiver<Command>,
    handle: Notifications,
}

impl<I: Timestamp> NotificationCenter<I> {
    /// Mount a center with an empty queue.
    pub fn mount(config: DedupConfig) -> Self {
        let (tx, commands) = mpsc::unbounded_channel();
        Self { dedup: Deduplicator::new(config), commands, handle: Notifications { tx } }
    }

    /// A handle bound to this center.
    pub fn handle(&self) -> Notifications {
        self.handle.clone()
    }

    /// Wait for the next command from a handle.
    ///
    /// Cancel safe. Never resolves to `None` while the center is mounted.
    pub async fn next_command(&mut self) -> Option<Command> {
        self.commands.recv().await
    }

    /// Apply every queued command. Returns how many were applied.
    pub fn drain(&mut self, now: I) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command, now);
            applied += 1;
        }
        applied
    }

    /// Apply one command.
    pub fn apply(&mut self, command: Command, now: I) {
        match command {
            Command::Show(request) => {
                let _ = self.enqueue(request, now);
            },
            Command::Remove(id) => {
                let _ = self.dismiss(id);
            },
        }
    }

    /// Enqueue a request through debounce and suppression.
    pub fn enqueue(&mut self, request: NotificationRequest, now: I) -> EnqueueOutcome<I> {
        self.dedup.enqueue(request, now)
    }

    /// Fire due debounce and auto-hide timers.
    pub fn tick<E>(&mut self, env: &E, now: I) -> Vec<DedupEvent>
    where
        E: Environment<Instant = I>,
    {
        self.dedup.tick(env, now)
    }

    /// Close one notification. Returns `false` if it was already gone.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        self.dedup.dismiss(id).is_some()
    }

    /// Run action `index` of notification `id`.
    pub fn activate(&mut self, id: NotificationId, index: usize) -> Result<Activation, NotifyError> {
        self.dedup.activate(id, index)
    }

    /// Remove every visible connection-lost notification.
    pub fn clear_connection_errors(&mut self) -> Vec<NotificationId> {
        self.dedup.dismiss_titled(alerts::CONNECTION_ERROR_TITLE)
    }

    /// Render-ready cards in insertion order.
    pub fn cards(&self, now: I) -> Vec<NotificationCard> {
        presenter::cards(self.dedup.visible(), now)
    }

    /// Earliest armed debounce or auto-hide deadline.
    pub fn next_deadline(&self) -> Option<I> {
        self.dedup.next_deadline()
    }

    /// Underlying queue.
    pub fn deduplicator(&self) -> &Deduplicator<I> {
        &self.dedup
    }

    /// Unmount: disarm every timer and detach all handles.
    pub fn unmount(mut self) {
        self.commands.close();
        let armed = self.dedup.armed_timers();
        self.dedup.shutdown();
        tracing::debug!(armed, "notification center unmounted");
    }
}
