//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`relaywatch_app::Runtime`] orchestration code runs in both production and
//! simulation. Instead of drawing, it records what a user would have seen.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use relaywatch_app::{Driver, UiEvent, View};
use relaywatch_core::{ActionIntent, ConnectionState, DisplayMode, NotificationCard};

use crate::{
    invariants::{InvariantRegistry, SystemSnapshot},
    sim_env::SimInstant,
};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// What the last rendered frame showed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Indicator drawn at all.
    pub indicator_visible: bool,
    /// State shown by the indicator.
    pub connection_state: Option<ConnectionState>,
    /// Indicator mode.
    pub mode: DisplayMode,
    /// Reconnect button enabled.
    pub can_reconnect: bool,
    /// Cards in display order.
    pub cards: Vec<NotificationCard>,
}

#[derive(Default)]
struct SharedState {
    inputs: VecDeque<UiEvent>,
    frames: usize,
    last: Frame,
    intents: Vec<ActionIntent>,
}

/// Simulation driver for deterministic testing.
///
/// Clones share recorded state, so a test can keep one while the runtime
/// owns another.
#[derive(Clone, Default)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    invariants: Option<Arc<InvariantRegistry>>,
}

impl SimDriver {
    /// Create a new simulation driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check invariants on every rendered frame.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(Arc::new(registry));
        self
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an input event for the runtime.
    pub fn inject(&self, input: UiEvent) {
        self.lock().inputs.push_back(input);
    }

    /// Check if there are queued inputs.
    pub fn has_pending(&self) -> bool {
        !self.lock().inputs.is_empty()
    }

    /// Last rendered frame.
    pub fn last_frame(&self) -> Frame {
        self.lock().last.clone()
    }

    /// Number of frames rendered.
    pub fn frames(&self) -> usize {
        self.lock().frames
    }

    /// Intents handed to the driver, in order.
    pub fn intents(&self) -> Vec<ActionIntent> {
        self.lock().intents.clone()
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = SimInstant;

    async fn poll_input(&mut self) -> Result<Option<UiEvent>, Self::Error> {
        let next = self.lock().inputs.pop_front();
        match next {
            Some(input) => Ok(Some(input)),
            None => std::future::pending().await,
        }
    }

    fn render(&mut self, view: &View<'_, SimInstant>) -> Result<(), Self::Error> {
        if let Some(registry) = &self.invariants {
            let snapshot = SystemSnapshot::from_view(view);
            registry.check_all(&snapshot).map_err(|violations| {
                let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
                SimDriverError(messages.join("; "))
            })?;
        }

        let frame = Frame {
            indicator_visible: view.status.is_some_and(|s| s.is_visible()),
            connection_state: view.status.map(|s| s.snapshot().connection_state),
            mode: view.status.map(|s| s.mode()).unwrap_or_default(),
            can_reconnect: view.status.is_some_and(|s| s.can_reconnect()),
            cards: view.cards.to_vec(),
        };

        let mut state = self.lock();
        state.frames += 1;
        state.last = frame;
        Ok(())
    }

    fn execute(&mut self, intent: ActionIntent) -> Result<(), Self::Error> {
        self.lock().intents.push(intent);
        Ok(())
    }

    fn stop(&mut self) {
        tracing::debug!(frames = self.frames(), "sim driver stopped");
    }
}
