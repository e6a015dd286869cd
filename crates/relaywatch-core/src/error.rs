//! Error types for the relaywatch core.
//!
//! None of these ever reach the user as a failure of the layer itself:
//! action handler errors are caught and logged, and lookups of stale
//! notification IDs are reported to the caller, who decides whether to care.

use thiserror::Error;

use crate::notification::NotificationId;

/// Failure of a notification action handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Handler returned an error.
    #[error("action handler failed: {0}")]
    Failed(String),

    /// Handler panicked; the payload is rendered as text when possible.
    #[error("action handler panicked: {0}")]
    Panicked(String),
}

impl ActionError {
    /// Convenience constructor for handler implementations.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Errors from operations on the visible notification queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// No visible notification carries this ID (dismissed or expired).
    #[error("no visible notification with id {0}")]
    UnknownNotification(NotificationId),

    /// The notification exists but has no action at this index.
    #[error("notification {id} has no action at index {index}")]
    UnknownAction {
        /// Notification that was targeted.
        id: NotificationId,
        /// Requested action index.
        index: usize,
    },
}
