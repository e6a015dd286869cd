//! Render-ready view of the notification queue.
//!
//! Front-ends draw [`NotificationCard`]s; they never touch records or timers.
//! Cards come out in insertion order and are addressed by
//! [`NotificationId`], never by dedupe key.

use std::time::Duration;

use crate::{
    env::Timestamp,
    notification::{NotificationId, NotificationKind, NotificationRecord},
};

/// Button on a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardAction {
    /// Index to pass back to `activate`.
    pub index: usize,
    /// Button label.
    pub label: String,
    /// Drawn highlighted.
    pub is_primary: bool,
}

/// One visible notification, ready to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCard {
    /// Render key.
    pub id: NotificationId,
    /// Severity.
    pub kind: NotificationKind,
    /// Heading.
    pub title: String,
    /// Body.
    pub message: String,
    /// Buttons in display order.
    pub actions: Vec<CardAction>,
    /// Time until auto-hide; `None` for sticky cards.
    pub remaining: Option<Duration>,
}

impl NotificationCard {
    /// Build a card from a visible record.
    pub fn from_record<I: Timestamp>(record: &NotificationRecord<I>, now: I) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            title: record.title.clone(),
            message: record.message.clone(),
            actions: record
                .actions
                .iter()
                .enumerate()
                .map(|(index, action)| CardAction {
                    index,
                    label: action.label.clone(),
                    is_primary: action.is_primary,
                })
                .collect(),
            remaining: record.remaining(now),
        }
    }

    /// First primary action, falling back to the first action.
    pub fn default_action(&self) -> Option<&CardAction> {
        self.actions.iter().find(|a| a.is_primary).or_else(|| self.actions.first())
    }

    /// Single-character severity marker.
    pub fn glyph(&self) -> &'static str {
        glyph(self.kind)
    }
}

/// Single-character severity marker.
pub fn glyph(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Success => "✓",
        NotificationKind::Error => "✗",
        NotificationKind::Warning => "!",
        NotificationKind::Info => "i",
    }
}

/// Cards for every visible record, in insertion order.
pub fn cards<I: Timestamp>(records: &[NotificationRecord<I>], now: I) -> Vec<NotificationCard> {
    records.iter().map(|record| NotificationCard::from_record(record, now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alerts,
        dedup::{DedupConfig, Deduplicator},
        env::test_env::{Ms, TestEnv},
        notification::NotificationRequest,
    };

    #[test]
    fn cards_follow_insertion_order_with_remaining_time() {
        let env = TestEnv::default();
        let mut d = Deduplicator::new(DedupConfig::default());
        d.enqueue(NotificationRequest::info("a", "first"), Ms(0));
        d.enqueue(alerts::auth_failed(), Ms(50));
        d.tick(&env, Ms(100));
        d.tick(&env, Ms(550));

        let cards = cards(d.visible(), Ms(1_100));
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title, "a");
        assert_eq!(cards[0].remaining, Some(Duration::from_millis(4_000)));
        assert_eq!(cards[1].remaining, None);
        assert_eq!(cards[1].default_action().map(|a| a.label.as_str()), Some(alerts::LOGIN_LABEL));
    }

    #[test]
    fn secondary_only_card_defaults_to_first_action() {
        let env = TestEnv::default();
        let mut d = Deduplicator::new(DedupConfig::default());
        d.enqueue(alerts::model_unavailable("m"), Ms(0));
        d.tick(&env, Ms(100));

        let card = NotificationCard::from_record(&d.visible()[0], Ms(100));
        assert_eq!(card.glyph(), "!");
        let action = card.default_action().map(|a| (a.index, a.is_primary));
        assert_eq!(action, Some((0, false)));
    }
}
