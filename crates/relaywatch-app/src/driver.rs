//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from a specific front-end. A
//! terminal, a test harness or any other surface implements it to provide
//! input and drawing, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use relaywatch_core::{
    ActionIntent, NotificationCard, NotificationId, StatusPresenter, Timestamp,
};

/// Input vocabulary understood by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// Stop the runtime.
    Quit,
    /// Press the indicator's reconnect button.
    Reconnect,
    /// Switch between compact and detailed indicator.
    ToggleMode,
    /// Expand or collapse the statistics panel.
    ToggleStats,
    /// Move the card selection down.
    SelectNext,
    /// Move the card selection up.
    SelectPrevious,
    /// Close the selected card.
    DismissSelected,
    /// Run the default action of the selected card.
    ActivateSelected,
    /// Close a specific card.
    Dismiss(NotificationId),
    /// Run a specific action of a specific card.
    Activate {
        /// Card.
        id: NotificationId,
        /// Action index on that card.
        index: usize,
    },
}

/// Everything a front-end needs to draw one frame.
#[derive(Debug)]
pub struct View<'a, I> {
    /// Status indicator; `None` when no transport is attached.
    pub status: Option<&'a StatusPresenter<I>>,
    /// Visible notifications in insertion order.
    pub cards: &'a [NotificationCard],
    /// Selected card, if any.
    pub selected: Option<NotificationId>,
}

/// Abstracts I/O operations for the runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the terminal and in simulation.
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Timestamp;

    /// Wait for the next input event.
    ///
    /// Must be cancel safe: the runtime races it against transport events
    /// and timers. Returns `None` for input that maps to nothing.
    fn poll_input(&mut self) -> impl Future<Output = Result<Option<UiEvent>, Self::Error>> + Send;

    /// Draw the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &View<'_, Self::Instant>) -> Result<(), Self::Error>;

    /// Carry out an intent the runtime cannot handle itself (login, retry).
    ///
    /// # Errors
    ///
    /// Returns an error if the front-end cannot perform the intent.
    fn execute(&mut self, intent: ActionIntent) -> Result<(), Self::Error>;

    /// Release front-end resources.
    fn stop(&mut self);
}
