//! Generic runtime for orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`StatusMonitor`]: transport subscriptions
//! - [`StatusPresenter`]: connection indicator state machine
//! - [`NotificationCenter`]: deduplicated notification queue
//! - [`Driver`]: platform-specific I/O

use std::sync::Arc;

use relaywatch_core::{
    ActionIntent, ConnectionEvent, DedupConfig, DedupEvent, Environment, NotificationId,
    StatusAction, StatusConfig, StatusPresenter, Transport,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    Driver, StatusMonitor, UiEvent, View,
    center::{Command, NotificationCenter, Notifications},
};

/// Behavioral configuration of one mounted layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Suppression window and debounce delays.
    pub dedup: DedupConfig,
    /// Indicator hide delay, poll interval, failure ceiling, initial mode.
    pub status: StatusConfig,
}

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError<E: std::error::Error + 'static> {
    /// The driver failed to render, read input or carry out an intent.
    #[error("driver error: {0}")]
    Driver(#[source] E),
}

enum Wake {
    Event(ConnectionEvent),
    Command(Command),
    Input(Option<UiEvent>),
    Timer,
}

type ReconnectOverride = Box<dyn Fn() + Send + Sync>;

/// Generic runtime that orchestrates the status presenter, the notification
/// center and a driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment providing time and randomness
pub struct Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    driver: D,
    env: E,
    monitor: StatusMonitor,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
    status: Option<StatusPresenter<E::Instant>>,
    center: NotificationCenter<E::Instant>,
    selected: Option<NotificationId>,
    reconnect_override: Option<ReconnectOverride>,
    dirty: bool,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    /// Mount the layer against `transport`.
    ///
    /// Without a transport the status indicator is never drawn and nothing
    /// is subscribed; notifications still work.
    pub fn new(driver: D, env: E, transport: Option<Arc<dyn Transport>>, config: RuntimeConfig) -> Self {
        let now = env.now();
        let (monitor, events) = StatusMonitor::mount(transport);
        let status = monitor
            .status()
            .map(|initial| StatusPresenter::new(now, config.status.clone(), initial));
        let center = NotificationCenter::mount(config.dedup);

        Self {
            driver,
            env,
            monitor,
            events,
            status,
            center,
            selected: None,
            reconnect_override: None,
            dirty: true,
        }
    }

    /// Replace the transport's `reconnect()` for the indicator button and
    /// reconnect actions.
    #[must_use]
    pub fn with_reconnect_override<F>(mut self, reconnect: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.reconnect_override = Some(Box::new(reconnect));
        self
    }

    /// Handle for raising notifications from other components.
    pub fn notifications(&self) -> Notifications {
        self.center.handle()
    }

    /// Run the event loop until the driver reports [`UiEvent::Quit`].
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), RuntimeError<D::Error>> {
        self.render()?;

        loop {
            match self.wait().await? {
                Wake::Event(event) => self.handle_event(event),
                Wake::Command(command) => {
                    let now = self.env.now();
                    self.center.apply(command, now);
                },
                Wake::Input(Some(input)) => {
                    if self.handle_input(input)? {
                        break;
                    }
                },
                Wake::Input(None) | Wake::Timer => {},
            }
            self.step()?;
        }

        self.shutdown();
        Ok(())
    }

    async fn wait(&mut self) -> Result<Wake, RuntimeError<D::Error>> {
        let timeout = self.next_deadline().map(|deadline| deadline - self.env.now());
        let env = self.env.clone();
        let timer = async move {
            match timeout {
                Some(duration) => env.sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;

            Some(event) = self.events.recv() => Ok(Wake::Event(event)),
            Some(command) = self.center.next_command() => Ok(Wake::Command(command)),
            input = self.driver.poll_input() => input.map(Wake::Input).map_err(RuntimeError::Driver),
            () = timer => Ok(Wake::Timer),
        }
    }

    /// Process everything that is ready without waiting: queued transport
    /// events, handle commands, due timers. Renders if anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn step(&mut self) -> Result<(), RuntimeError<D::Error>> {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }

        let now = self.env.now();
        self.center.drain(now);

        if let Some(status) = self.status.as_mut() {
            let actions = status.tick(now);
            self.process_status_actions(actions);
        }

        let events = self.center.tick(&self.env, now);
        for event in &events {
            match event {
                DedupEvent::Shown { id, replaced } => {
                    tracing::debug!(%id, replaced = replaced.len(), "notification visible");
                },
                DedupEvent::Expired(id) => tracing::debug!(%id, "notification auto-hidden"),
            }
        }
        self.dirty |= !events.is_empty();

        if self.dirty {
            self.render()?;
        }
        Ok(())
    }

    /// Feed one transport event to the status presenter.
    pub fn handle_event(&mut self, event: ConnectionEvent) {
        let Some(status) = self.status.as_mut() else { return };
        let now = self.env.now();
        let actions = status.handle_event(event, now);
        self.process_status_actions(actions);
    }

    /// Process one input event. Returns `true` if the runtime should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to carry out an action intent.
    pub fn handle_input(&mut self, input: UiEvent) -> Result<bool, RuntimeError<D::Error>> {
        match input {
            UiEvent::Quit => return Ok(true),
            UiEvent::Reconnect => self.with_status(StatusPresenter::request_reconnect),
            UiEvent::ToggleMode => self.with_status(StatusPresenter::toggle_mode),
            UiEvent::ToggleStats => self.with_status(StatusPresenter::toggle_stats),
            UiEvent::SelectNext => self.move_selection(true),
            UiEvent::SelectPrevious => self.move_selection(false),
            UiEvent::DismissSelected => {
                if let Some(id) = self.selected {
                    self.dismiss(id);
                }
            },
            UiEvent::ActivateSelected => {
                let now = self.env.now();
                let target = self.selected.and_then(|id| {
                    self.center
                        .cards(now)
                        .into_iter()
                        .find(|card| card.id == id)
                        .and_then(|card| card.default_action().map(|action| action.index))
                        .map(|index| (id, index))
                });
                if let Some((id, index)) = target {
                    self.activate(id, index)?;
                }
            },
            UiEvent::Dismiss(id) => self.dismiss(id),
            UiEvent::Activate { id, index } => self.activate(id, index)?,
        }
        Ok(false)
    }

    fn with_status(&mut self, f: impl FnOnce(&mut StatusPresenter<E::Instant>) -> Vec<StatusAction>) {
        if let Some(status) = self.status.as_mut() {
            let actions = f(status);
            self.process_status_actions(actions);
        }
    }

    fn process_status_actions(&mut self, actions: Vec<StatusAction>) {
        let now = self.env.now();
        let mut pending = actions;

        while !pending.is_empty() {
            for action in std::mem::take(&mut pending) {
                match action {
                    StatusAction::Render => self.dirty = true,
                    StatusAction::Notify(request) => {
                        let _ = self.center.enqueue(request, now);
                    },
                    StatusAction::ClearConnectionErrors => {
                        let cleared = self.center.clear_connection_errors();
                        self.dirty |= !cleared.is_empty();
                    },
                    StatusAction::Reconnect => self.reconnect(),
                    StatusAction::PollStatus => {
                        if let (Some(status), Some(polled)) = (self.status.as_mut(), self.monitor.status()) {
                            pending.extend(status.apply_status(polled, now));
                        }
                    },
                }
            }
        }
    }

    fn reconnect(&self) {
        tracing::info!("manual reconnect requested");
        match &self.reconnect_override {
            Some(reconnect) => reconnect(),
            None => {
                self.monitor.reconnect();
            },
        }
    }

    fn dismiss(&mut self, id: NotificationId) {
        if self.center.dismiss(id) {
            self.dirty = true;
        }
    }

    fn activate(&mut self, id: NotificationId, index: usize) -> Result<(), RuntimeError<D::Error>> {
        let activation = match self.center.activate(id, index) {
            Ok(activation) => activation,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring action on stale notification");
                return Ok(());
            },
        };

        self.dirty = true;
        match activation.intent {
            Some(ActionIntent::Reconnect) => self.reconnect(),
            Some(intent) => self.driver.execute(intent).map_err(RuntimeError::Driver)?,
            None => {},
        }
        Ok(())
    }

    fn move_selection(&mut self, forward: bool) {
        let now = self.env.now();
        let cards = self.center.cards(now);
        if cards.is_empty() {
            self.selected = None;
            return;
        }

        let len = cards.len();
        let current = self.selected.and_then(|id| cards.iter().position(|card| card.id == id));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        self.selected = Some(cards[next].id);
        self.dirty = true;
    }

    fn render(&mut self) -> Result<(), RuntimeError<D::Error>> {
        let now = self.env.now();
        let cards = self.center.cards(now);
        if self.selected.is_some_and(|id| !cards.iter().any(|card| card.id == id)) {
            self.selected = None;
        }

        let view = View { status: self.status.as_ref(), cards: &cards, selected: self.selected };
        self.driver.render(&view).map_err(RuntimeError::Driver)?;
        self.dirty = false;
        Ok(())
    }

    /// Earliest armed timer across the presenter and the queue.
    pub fn next_deadline(&self) -> Option<E::Instant> {
        let status = self.status.as_ref().and_then(StatusPresenter::next_deadline);
        match (status, self.center.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Status presenter, if a transport is attached.
    pub fn status(&self) -> Option<&StatusPresenter<E::Instant>> {
        self.status.as_ref()
    }

    /// Mounted notification center.
    pub fn center(&self) -> &NotificationCenter<E::Instant> {
        &self.center
    }

    /// Currently selected card.
    pub fn selected(&self) -> Option<NotificationId> {
        self.selected
    }

    /// Driver, for inspection in tests and simulation.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Unmount everything: disarm timers, unsubscribe listeners, stop the
    /// driver.
    pub fn shutdown(self) {
        let Self { mut driver, monitor, status, center, .. } = self;

        if let Some(mut status) = status {
            status.shutdown();
        }
        center.unmount();
        drop(monitor);
        driver.stop();
        tracing::info!("runtime stopped");
    }
}
