//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the layer at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks. Snapshots serialize for `insta`.

use relaywatch_app::{NotificationCenter, View};
use relaywatch_core::{
    ConnectionState, DedupeKey, DisplayMode, NotificationCard, NotificationKind, StatusPresenter,
    Timestamp,
};
use serde::Serialize;

/// Snapshot of everything a user or an invariant can observe.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemSnapshot {
    /// Visible notifications in display order.
    pub notifications: Vec<NotificationSnapshot>,
    /// Timer bookkeeping. `None` when captured from a rendered view.
    pub queue: Option<QueueSnapshot>,
    /// Status indicator. `None` without a transport.
    pub indicator: Option<IndicatorSnapshot>,
}

/// One visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationSnapshot {
    /// Render key.
    pub id: String,
    /// Suppression identity.
    pub dedupe_key: String,
    /// Severity.
    pub kind: NotificationKind,
    /// Heading.
    pub title: String,
    /// Body.
    pub message: String,
    /// Removed automatically.
    pub auto_hide: bool,
    /// Action labels; the primary one is marked with `*`.
    pub actions: Vec<String>,
}

/// Deduplicator timer bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    /// Requests waiting for their debounce timer.
    pub pending: usize,
    /// Armed debounce and auto-hide timers.
    pub armed_timers: usize,
}

/// Status indicator state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorSnapshot {
    /// Cached connection state.
    pub state: ConnectionState,
    /// Indicator drawn.
    pub visible: bool,
    /// Reconnect button enabled.
    pub can_reconnect: bool,
    /// Attempts since the last connect.
    pub reconnect_attempts: u32,
    /// Buffered outbound messages.
    pub queued_messages: u32,
    /// Rendering mode.
    pub mode: DisplayMode,
    /// Connection-lost reports in the current outage.
    pub failures: u32,
}

impl SystemSnapshot {
    /// Create an empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture the full state of a mounted layer.
    pub fn capture<I: Timestamp>(
        center: &NotificationCenter<I>,
        status: Option<&StatusPresenter<I>>,
        now: I,
    ) -> Self {
        let dedup = center.deduplicator();
        Self {
            notifications: center.cards(now).iter().map(NotificationSnapshot::from_card).collect(),
            queue: Some(QueueSnapshot {
                pending: dedup.pending_count(),
                armed_timers: dedup.armed_timers(),
            }),
            indicator: status.map(IndicatorSnapshot::from_presenter),
        }
    }

    /// Capture what a rendered frame shows.
    pub fn from_view<I: Timestamp>(view: &View<'_, I>) -> Self {
        Self {
            notifications: view.cards.iter().map(NotificationSnapshot::from_card).collect(),
            queue: None,
            indicator: view.status.map(IndicatorSnapshot::from_presenter),
        }
    }
}

impl NotificationSnapshot {
    fn from_card(card: &NotificationCard) -> Self {
        Self {
            id: card.id.to_string(),
            dedupe_key: DedupeKey::new(card.kind, &card.title, &card.message).to_string(),
            kind: card.kind,
            title: card.title.clone(),
            message: card.message.clone(),
            auto_hide: card.remaining.is_some(),
            actions: card
                .actions
                .iter()
                .map(|a| if a.is_primary { format!("*{}", a.label) } else { a.label.clone() })
                .collect(),
        }
    }
}

impl IndicatorSnapshot {
    fn from_presenter<I: Timestamp>(status: &StatusPresenter<I>) -> Self {
        let snapshot = status.snapshot();
        Self {
            state: snapshot.connection_state,
            visible: status.is_visible(),
            can_reconnect: status.can_reconnect(),
            reconnect_attempts: snapshot.reconnect_attempts,
            queued_messages: snapshot.queued_messages,
            mode: status.mode(),
            failures: status.consecutive_failures(),
        }
    }
}
