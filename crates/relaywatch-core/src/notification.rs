//! Notification data model.
//!
//! A [`NotificationRequest`] is what callers submit; the deduplicator turns
//! the surviving ones into [`NotificationRecord`]s. Requests with the same
//! [`DedupeKey`] are considered the same condition.

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{env::Timestamp, error::ActionError};

/// Auto-hide duration applied when the caller does not choose one.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
    /// Degraded but working.
    Warning,
    /// Informational.
    Info,
}

impl NotificationKind {
    /// Stable lowercase identifier, used in dedupe keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity used to suppress duplicate notifications.
///
/// Derived deterministically as `type + "_" + title + "_" + message`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupeKey(String);

impl DedupeKey {
    /// Derive the key for a (kind, title, message) triple.
    pub fn new(kind: NotificationKind, title: &str, message: &str) -> Self {
        Self(format!("{kind}_{title}_{message}"))
    }

    /// Key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique notification identity: monotonic sequence plus a random nonce.
///
/// Ordered by sequence, so sorting IDs yields creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId {
    seq: u64,
    nonce: u32,
}

impl NotificationId {
    /// Build an ID from its parts.
    pub fn new(seq: u64, nonce: u32) -> Self {
        Self { seq, nonce }
    }

    /// Monotonic part.
    pub fn seq(self) -> u64 {
        self.seq
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:08x}", self.seq, self.nonce)
    }
}

/// Caller-supplied action callback.
///
/// Equality is identity: two callbacks are equal only if they share the same
/// allocation.
#[derive(Clone)]
pub struct ActionCallback(Arc<dyn Fn() -> Result<(), ActionError> + Send + Sync>);

impl ActionCallback {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Result<(), ActionError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the callback, converting a panic into [`ActionError::Panicked`].
    pub fn invoke(&self) -> Result<(), ActionError> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.0)())) {
            Ok(result) => result,
            Err(payload) => {
                let text = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                Err(ActionError::Panicked(text))
            },
        }
    }
}

impl fmt::Debug for ActionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActionCallback(..)")
    }
}

impl PartialEq for ActionCallback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ActionCallback {}

/// What happens when a notification action is activated.
///
/// Intents are executed by the runtime; callbacks run in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionHandler {
    /// Ask the transport to reconnect.
    Reconnect,
    /// Navigate to the login flow.
    OpenLogin,
    /// Retry the operation that produced the notification.
    Retry,
    /// Only dismiss the notification.
    Dismiss,
    /// Run a caller-supplied callback.
    Callback(ActionCallback),
}

/// Button attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    /// Button label.
    pub label: String,
    /// Activation behavior.
    pub handler: ActionHandler,
    /// Primary actions are rendered highlighted.
    pub is_primary: bool,
    /// Keep the notification on screen after the action runs.
    pub keep_open: bool,
}

impl NotificationAction {
    /// Primary action that dismisses the notification after running.
    pub fn primary(label: impl Into<String>, handler: ActionHandler) -> Self {
        Self { label: label.into(), handler, is_primary: true, keep_open: false }
    }

    /// Secondary action that dismisses the notification after running.
    pub fn secondary(label: impl Into<String>, handler: ActionHandler) -> Self {
        Self { label: label.into(), handler, is_primary: false, keep_open: false }
    }

    /// Keep the notification visible after this action runs.
    #[must_use]
    pub fn keep_open(mut self) -> Self {
        self.keep_open = true;
        self
    }
}

/// Display options for a notification.
///
/// Defaults: auto-hide after [`DEFAULT_DURATION`], no actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOptions {
    /// Remove automatically after `duration`.
    pub auto_hide: bool,
    /// Time on screen when `auto_hide` is set.
    pub duration: Duration,
    /// Buttons, in display order.
    pub actions: Vec<NotificationAction>,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self { auto_hide: true, duration: DEFAULT_DURATION, actions: Vec::new() }
    }
}

impl NotificationOptions {
    /// Options for a notification that stays until dismissed.
    pub fn persistent() -> Self {
        Self { auto_hide: false, ..Self::default() }
    }

    /// Override the auto-hide duration.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Append an action button.
    #[must_use]
    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.actions.push(action);
        self
    }
}

/// A request to show a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    /// Severity.
    pub kind: NotificationKind,
    /// Short heading.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Display options.
    pub options: NotificationOptions,
}

impl NotificationRequest {
    /// Build a request with default options.
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            options: NotificationOptions::default(),
        }
    }

    /// Error request with default options.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, message)
    }

    /// Success request with default options.
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, message)
    }

    /// Warning request with default options.
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, title, message)
    }

    /// Info request with default options.
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, message)
    }

    /// Replace the display options.
    #[must_use]
    pub fn with_options(mut self, options: NotificationOptions) -> Self {
        self.options = options;
        self
    }

    /// Dedupe key of this request.
    pub fn dedupe_key(&self) -> DedupeKey {
        DedupeKey::new(self.kind, &self.title, &self.message)
    }
}

/// A notification that passed debounce and suppression and is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord<I> {
    /// Unique render key.
    pub id: NotificationId,
    /// Suppression identity.
    pub dedupe_key: DedupeKey,
    /// Severity.
    pub kind: NotificationKind,
    /// Short heading.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Removed automatically after `duration`.
    pub auto_hide: bool,
    /// Time on screen when `auto_hide` is set.
    pub duration: Duration,
    /// Buttons, in display order.
    pub actions: Vec<NotificationAction>,
    /// When the record became visible.
    pub created_at: I,
}

impl<I: Timestamp> NotificationRecord<I> {
    pub(crate) fn from_request(id: NotificationId, request: NotificationRequest, now: I) -> Self {
        let dedupe_key = request.dedupe_key();
        let NotificationRequest { kind, title, message, options } = request;
        Self {
            id,
            dedupe_key,
            kind,
            title,
            message,
            auto_hide: options.auto_hide,
            duration: options.duration,
            actions: options.actions,
            created_at: now,
        }
    }

    /// When the record will be removed. `None` if it stays until dismissed.
    pub fn hide_at(&self) -> Option<I> {
        self.auto_hide.then(|| self.created_at + self.duration)
    }

    /// Time left on screen. `None` if it stays until dismissed.
    pub fn remaining(&self, now: I) -> Option<Duration> {
        self.hide_at().map(|at| at - now)
    }

    /// First action flagged primary.
    pub fn primary_action(&self) -> Option<&NotificationAction> {
        self.actions.iter().find(|a| a.is_primary)
    }
}
