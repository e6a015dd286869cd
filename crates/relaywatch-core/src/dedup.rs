//! Notification deduplicator and debouncer.
//!
//! Two tiers absorb notification storms from flapping connections:
//!
//! ```text
//!  enqueue(req) ──> shown < window ago? ──yes──> drop (Suppressed)
//!                        │ no
//!                        ↓
//!               cancel pending timer for key
//!               arm debounce timer (500ms error / 100ms other)
//!                        │ fires (last request of the burst wins)
//!                        ↓
//!               replace visible record with same key
//!               append record, last_shown[key] = now
//!               arm auto-hide timer if auto_hide
//! ```
//!
//! Pure state machine: time is passed in, timers are owned handles in a
//! [`TimerQueue`], and [`Deduplicator::tick`] reports what became visible or
//! expired.

use std::{collections::HashMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    env::{Environment, Timestamp},
    error::{ActionError, NotifyError},
    notification::{
        ActionHandler, DedupeKey, NotificationId, NotificationKind, NotificationRecord,
        NotificationRequest,
    },
    timer::{TimerHandle, TimerQueue},
};

/// Cooldown after a notification is shown during which identical requests
/// are dropped.
pub const DEFAULT_SUPPRESSION_WINDOW: Duration = Duration::from_millis(5000);

/// Debounce delay for error notifications.
pub const DEFAULT_ERROR_DEBOUNCE: Duration = Duration::from_millis(500);

/// Debounce delay for every other kind.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Deduplicator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Post-display cooldown per dedupe key.
    pub suppression_window: Duration,
    /// Trailing debounce for [`NotificationKind::Error`].
    pub error_debounce: Duration,
    /// Trailing debounce for all other kinds.
    pub debounce: Duration,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            suppression_window: DEFAULT_SUPPRESSION_WINDOW,
            error_debounce: DEFAULT_ERROR_DEBOUNCE,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl DedupConfig {
    /// Debounce delay applied to requests of `kind`.
    pub fn debounce_for(&self, kind: NotificationKind) -> Duration {
        match kind {
            NotificationKind::Error => self.error_debounce,
            NotificationKind::Success | NotificationKind::Warning | NotificationKind::Info => {
                self.debounce
            },
        }
    }
}

/// Result of [`Deduplicator::enqueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome<I> {
    /// Debounce timer armed.
    Scheduled {
        /// When the notification will be shown unless superseded.
        fire_at: I,
        /// An earlier pending request for the same key was discarded.
        superseded: bool,
    },
    /// Dropped: the same notification was shown within the window.
    Suppressed {
        /// Time until requests for this key are accepted again.
        remaining: Duration,
    },
}

/// Changes to the visible queue reported by [`Deduplicator::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupEvent {
    /// A record became visible.
    Shown {
        /// The new record.
        id: NotificationId,
        /// Records with the same key that it replaced.
        replaced: Vec<NotificationId>,
    },
    /// A record's auto-hide timer fired and it was removed.
    Expired(NotificationId),
}

/// Side effect requested by an activated action, executed by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionIntent {
    /// Ask the transport to reconnect.
    Reconnect,
    /// Navigate to the login flow.
    OpenLogin,
    /// Retry the operation behind the notification.
    Retry,
}

/// Result of [`Deduplicator::activate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Notification whose action ran.
    pub id: NotificationId,
    /// Intent for the runtime to execute.
    pub intent: Option<ActionIntent>,
    /// The notification was removed after the action ran.
    pub dismissed: bool,
    /// Callback failure, already logged.
    pub failure: Option<ActionError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TimerKey {
    Debounce(DedupeKey),
    AutoHide(NotificationId),
}

/// Latest request for a key waiting for its debounce timer.
#[derive(Debug)]
struct PendingDebounce {
    timer: TimerHandle,
    request: NotificationRequest,
}

/// Notification deduplicator, debouncer and visible queue.
///
/// # Invariants
///
/// - At most one visible record per [`DedupeKey`].
/// - At most one pending debounce per [`DedupeKey`].
/// - Every visible auto-hide record has exactly one armed auto-hide timer.
#[derive(Debug)]
pub struct Deduplicator<I> {
    config: DedupConfig,
    timers: TimerQueue<TimerKey, I>,
    pending: HashMap<DedupeKey, PendingDebounce>,
    visible: Vec<NotificationRecord<I>>,
    auto_hide: HashMap<NotificationId, TimerHandle>,
    last_shown: HashMap<DedupeKey, I>,
    next_seq: u64,
}

impl<I: Timestamp> Deduplicator<I> {
    /// Create an empty deduplicator.
    pub fn new(config: DedupConfig) -> Self {
        Self {
            config,
            timers: TimerQueue::new(),
            pending: HashMap::new(),
            visible: Vec::new(),
            auto_hide: HashMap::new(),
            last_shown: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Submit a notification request.
    ///
    /// Drops the request if its key was shown less than the suppression
    /// window ago. Otherwise replaces any pending request for the key and
    /// re-arms the debounce timer.
    pub fn enqueue(&mut self, request: NotificationRequest, now: I) -> EnqueueOutcome<I> {
        let key = request.dedupe_key();

        if let Some(&shown_at) = self.last_shown.get(&key) {
            let elapsed = now - shown_at;
            if elapsed < self.config.suppression_window {
                let remaining = self.config.suppression_window - elapsed;
                tracing::debug!(%key, ?remaining, "suppressing duplicate notification");
                return EnqueueOutcome::Suppressed { remaining };
            }
        }

        let superseded = match self.pending.remove(&key) {
            Some(previous) => {
                let _ = self.timers.cancel(previous.timer);
                true
            },
            None => false,
        };

        let delay = self.config.debounce_for(request.kind);
        let fire_at = now + delay;
        let timer = self.timers.schedule(TimerKey::Debounce(key.clone()), fire_at);
        tracing::debug!(%key, ?delay, superseded, "debouncing notification");

        self.pending.insert(key, PendingDebounce { timer, request });
        EnqueueOutcome::Scheduled { fire_at, superseded }
    }

    /// Fire every timer due at `now`.
    ///
    /// Debounce timers make their request visible; auto-hide timers remove
    /// their record. Events are reported in deadline order.
    pub fn tick<E>(&mut self, env: &E, now: I) -> Vec<DedupEvent>
    where
        E: Environment<Instant = I>,
    {
        let mut events = Vec::new();

        while let Some(fired) = self.timers.pop_expired(now) {
            match fired.key {
                TimerKey::Debounce(key) => {
                    let Some(pending) = self.pending.remove(&key) else {
                        continue;
                    };
                    debug_assert_eq!(pending.timer.id(), fired.timer);
                    events.push(self.show(key, pending.request, env.random_u32(), now));
                },
                TimerKey::AutoHide(id) => {
                    self.auto_hide.remove(&id);
                    if let Some(pos) = self.visible.iter().position(|r| r.id == id) {
                        self.visible.remove(pos);
                        tracing::debug!(%id, "notification expired");
                        events.push(DedupEvent::Expired(id));
                    }
                },
            }
        }

        events
    }

    fn show(
        &mut self,
        key: DedupeKey,
        request: NotificationRequest,
        nonce: u32,
        now: I,
    ) -> DedupEvent {
        let kind = request.kind;
        let replaced = self.remove_where(|r| r.dedupe_key == key && r.kind == kind);

        self.next_seq += 1;
        let id = NotificationId::new(self.next_seq, nonce);
        let record = NotificationRecord::from_request(id, request, now);

        if let Some(hide_at) = record.hide_at() {
            let handle = self.timers.schedule(TimerKey::AutoHide(id), hide_at);
            self.auto_hide.insert(id, handle);
        }

        tracing::debug!(%id, %key, replaced = replaced.len(), "notification shown");
        self.visible.push(record);
        self.last_shown.insert(key, now);

        DedupEvent::Shown { id, replaced }
    }

    fn remove_where<F>(&mut self, pred: F) -> Vec<NotificationId>
    where
        F: Fn(&NotificationRecord<I>) -> bool,
    {
        let mut removed = Vec::new();
        let timers = &mut self.timers;
        let auto_hide = &mut self.auto_hide;

        self.visible.retain(|record| {
            if !pred(record) {
                return true;
            }
            if let Some(handle) = auto_hide.remove(&record.id) {
                let _ = timers.cancel(handle);
            }
            removed.push(record.id);
            false
        });

        removed
    }

    /// Remove exactly the record with this ID, cancelling its auto-hide.
    pub fn dismiss(&mut self, id: NotificationId) -> Option<NotificationRecord<I>> {
        let pos = self.visible.iter().position(|r| r.id == id)?;
        let record = self.visible.remove(pos);
        if let Some(handle) = self.auto_hide.remove(&id) {
            let _ = self.timers.cancel(handle);
        }
        Some(record)
    }

    /// Remove every visible record matching `pred`.
    pub fn dismiss_where<F>(&mut self, pred: F) -> Vec<NotificationId>
    where
        F: Fn(&NotificationRecord<I>) -> bool,
    {
        self.remove_where(pred)
    }

    /// Remove every visible record with this title.
    pub fn dismiss_titled(&mut self, title: &str) -> Vec<NotificationId> {
        self.remove_where(|r| r.title == title)
    }

    /// Run the action at `index` on a visible notification.
    ///
    /// Callbacks run in place; failures are logged and reported in the
    /// result, never propagated. The notification is dismissed afterwards
    /// unless the action is `keep_open`, including when the callback failed.
    pub fn activate(&mut self, id: NotificationId, index: usize) -> Result<Activation, NotifyError> {
        let record = self
            .visible
            .iter()
            .find(|r| r.id == id)
            .ok_or(NotifyError::UnknownNotification(id))?;
        let action =
            record.actions.get(index).ok_or(NotifyError::UnknownAction { id, index })?.clone();

        let (intent, failure) = match &action.handler {
            ActionHandler::Reconnect => (Some(ActionIntent::Reconnect), None),
            ActionHandler::OpenLogin => (Some(ActionIntent::OpenLogin), None),
            ActionHandler::Retry => (Some(ActionIntent::Retry), None),
            ActionHandler::Dismiss => (None, None),
            ActionHandler::Callback(callback) => match callback.invoke() {
                Ok(()) => (None, None),
                Err(error) => {
                    tracing::warn!(%id, label = %action.label, %error, "notification action failed");
                    (None, Some(error))
                },
            },
        };

        let dismissed = !action.keep_open && self.dismiss(id).is_some();
        Ok(Activation { id, intent, dismissed, failure })
    }

    /// Visible records in display order.
    pub fn visible(&self) -> &[NotificationRecord<I>] {
        &self.visible
    }

    /// Visible record with this ID.
    pub fn get(&self, id: NotificationId) -> Option<&NotificationRecord<I>> {
        self.visible.iter().find(|r| r.id == id)
    }

    /// Number of requests waiting for their debounce timer.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Request waiting for its debounce timer under `key`.
    pub fn pending(&self, key: &DedupeKey) -> Option<&NotificationRequest> {
        self.pending.get(key).map(|p| &p.request)
    }

    /// When `key` was last shown. `None` if never.
    pub fn last_shown(&self, key: &DedupeKey) -> Option<I> {
        self.last_shown.get(key).copied()
    }

    /// Number of armed timers (debounce and auto-hide).
    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    /// Earliest armed deadline. `None` if idle.
    pub fn next_deadline(&self) -> Option<I> {
        self.timers.next_deadline()
    }

    /// Drop every pending request, visible record and armed timer.
    pub fn shutdown(&mut self) {
        self.timers.clear();
        self.pending.clear();
        self.auto_hide.clear();
        self.visible.clear();
        self.last_shown.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        env::test_env::{Ms, TestEnv},
        notification::{ActionCallback, NotificationAction, NotificationOptions},
    };

    fn dedup() -> Deduplicator<Ms> {
        Deduplicator::new(DedupConfig::default())
    }

    #[test]
    fn info_shows_after_short_debounce() {
        let env = TestEnv::default();
        let mut d = dedup();

        let outcome = d.enqueue(NotificationRequest::info("t", "m"), Ms(0));
        assert_eq!(outcome, EnqueueOutcome::Scheduled { fire_at: Ms(100), superseded: false });

        assert!(d.tick(&env, Ms(99)).is_empty());
        let events = d.tick(&env, Ms(100));
        assert!(matches!(events.as_slice(), [DedupEvent::Shown { .. }]));
        assert_eq!(d.visible().len(), 1);
    }

    #[test]
    fn errors_debounce_longer() {
        let env = TestEnv::default();
        let mut d = dedup();

        d.enqueue(NotificationRequest::error("t", "m"), Ms(0));
        assert!(d.tick(&env, Ms(499)).is_empty());
        assert_eq!(d.tick(&env, Ms(500)).len(), 1);
    }

    #[test]
    fn burst_keeps_pushing_fire_time() {
        let env = TestEnv::default();
        let mut d = dedup();

        for t in [0, 50, 90, 150] {
            d.enqueue(NotificationRequest::info("t", "m"), Ms(t));
            assert!(d.tick(&env, Ms(t)).is_empty());
        }
        assert_eq!(d.pending_count(), 1);
        assert!(d.tick(&env, Ms(249)).is_empty());
        assert_eq!(d.tick(&env, Ms(250)).len(), 1);
    }

    #[test]
    fn trailing_request_wins() {
        let env = TestEnv::default();
        let mut d = dedup();

        let first = NotificationRequest::info("t", "m");
        let last = NotificationRequest::info("t", "m")
            .with_options(NotificationOptions::persistent());
        d.enqueue(first, Ms(0));
        let outcome = d.enqueue(last, Ms(10));
        assert!(matches!(outcome, EnqueueOutcome::Scheduled { superseded: true, .. }));

        d.tick(&env, Ms(200));
        assert!(!d.visible()[0].auto_hide, "payload must come from the last call");
    }

    #[test]
    fn repeat_within_window_is_dropped() {
        let env = TestEnv::default();
        let mut d = dedup();

        d.enqueue(NotificationRequest::info("t", "m"), Ms(0));
        d.tick(&env, Ms(100));

        let outcome = d.enqueue(NotificationRequest::info("t", "m"), Ms(4_000));
        assert_eq!(outcome, EnqueueOutcome::Suppressed { remaining: Duration::from_millis(1_100) });
        assert_eq!(d.pending_count(), 0);

        let outcome = d.enqueue(NotificationRequest::info("t", "m"), Ms(5_100));
        assert!(matches!(outcome, EnqueueOutcome::Scheduled { .. }));
    }

    #[test]
    fn distinct_keys_are_independent() {
        let env = TestEnv::default();
        let mut d = dedup();

        d.enqueue(NotificationRequest::info("t", "a"), Ms(0));
        d.enqueue(NotificationRequest::info("t", "b"), Ms(0));
        d.enqueue(NotificationRequest::warning("t", "a"), Ms(0));
        assert_eq!(d.tick(&env, Ms(100)).len(), 3);
        assert_eq!(d.visible().len(), 3);
    }

    #[test]
    fn reshow_replaces_sticky_record_with_same_key() {
        let env = TestEnv::default();
        let mut d = dedup();
        let sticky = || {
            NotificationRequest::error("auth", "expired")
                .with_options(NotificationOptions::persistent())
        };

        d.enqueue(sticky(), Ms(0));
        d.tick(&env, Ms(500));
        let old = d.visible()[0].id;

        d.enqueue(sticky(), Ms(6_000));
        let events = d.tick(&env, Ms(6_500));
        match events.as_slice() {
            [DedupEvent::Shown { id, replaced }] => {
                assert_ne!(*id, old);
                assert_eq!(replaced, &vec![old]);
            },
            other => panic!("unexpected events: {other:?}"),
        }
        assert_eq!(d.visible().len(), 1);
    }

    #[test]
    fn auto_hide_removes_after_duration() {
        let env = TestEnv::default();
        let mut d = dedup();

        d.enqueue(NotificationRequest::info("t", "m"), Ms(0));
        d.tick(&env, Ms(100));
        let id = d.visible()[0].id;

        assert!(d.tick(&env, Ms(5_099)).is_empty());
        assert_eq!(d.tick(&env, Ms(5_100)), vec![DedupEvent::Expired(id)]);
        assert!(d.visible().is_empty());
        assert_eq!(d.armed_timers(), 0);
    }

    #[test]
    fn dismiss_cancels_auto_hide() {
        let env = TestEnv::default();
        let mut d = dedup();

        d.enqueue(NotificationRequest::info("t", "m"), Ms(0));
        d.tick(&env, Ms(100));
        let id = d.visible()[0].id;

        assert!(d.dismiss(id).is_some());
        assert!(d.dismiss(id).is_none());
        assert_eq!(d.armed_timers(), 0);
        assert!(d.tick(&env, Ms(10_000)).is_empty());
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let env = TestEnv::default();
        let mut d = dedup();

        for i in 0..5 {
            d.enqueue(NotificationRequest::info("t", format!("m{i}")), Ms(0));
        }
        d.tick(&env, Ms(100));

        let ids: Vec<_> = d.visible().iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn dismiss_titled_removes_only_that_title() {
        let env = TestEnv::default();
        let mut d = dedup();

        d.enqueue(NotificationRequest::error("Ошибка соединения", "a"), Ms(0));
        d.enqueue(NotificationRequest::error("Ошибка соединения", "b"), Ms(0));
        d.enqueue(NotificationRequest::error("Другое", "a"), Ms(0));
        d.tick(&env, Ms(500));

        assert_eq!(d.dismiss_titled("Ошибка соединения").len(), 2);
        assert_eq!(d.visible().len(), 1);
        assert_eq!(d.visible()[0].title, "Другое");
    }

    #[test]
    fn activate_returns_intent_and_dismisses() {
        let env = TestEnv::default();
        let mut d = dedup();
        let request = NotificationRequest::error("t", "m").with_options(
            NotificationOptions::default()
                .with_action(NotificationAction::primary("go", ActionHandler::Reconnect)),
        );
        d.enqueue(request, Ms(0));
        d.tick(&env, Ms(500));
        let id = d.visible()[0].id;

        let activation = d.activate(id, 0).expect("action exists");
        assert_eq!(activation.intent, Some(ActionIntent::Reconnect));
        assert!(activation.dismissed);
        assert!(d.visible().is_empty());
        assert_eq!(d.activate(id, 0), Err(NotifyError::UnknownNotification(id)));
    }

    #[test]
    fn failing_callback_is_contained_and_still_dismisses() {
        let env = TestEnv::default();
        let mut d = dedup();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let callback = ActionCallback::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ActionError::failed("nope"))
        });
        let request = NotificationRequest::info("t", "m").with_options(
            NotificationOptions::default()
                .with_action(NotificationAction::secondary("x", ActionHandler::Callback(callback))),
        );
        d.enqueue(request, Ms(0));
        d.tick(&env, Ms(100));
        let id = d.visible()[0].id;

        let activation = d.activate(id, 0).expect("action exists");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(activation.failure, Some(ActionError::Failed("nope".into())));
        assert!(activation.dismissed);
    }

    #[test]
    fn keep_open_action_leaves_record() {
        let env = TestEnv::default();
        let mut d = dedup();
        let request = NotificationRequest::info("t", "m").with_options(
            NotificationOptions::default().with_action(
                NotificationAction::secondary("peek", ActionHandler::Dismiss).keep_open(),
            ),
        );
        d.enqueue(request, Ms(0));
        d.tick(&env, Ms(100));
        let id = d.visible()[0].id;

        assert!(!d.activate(id, 0).expect("action exists").dismissed);
        assert_eq!(d.activate(id, 3), Err(NotifyError::UnknownAction { id, index: 3 }));
        assert_eq!(d.visible().len(), 1);
    }

    #[test]
    fn shutdown_disarms_everything() {
        let env = TestEnv::default();
        let mut d = dedup();

        d.enqueue(NotificationRequest::info("t", "a"), Ms(0));
        d.tick(&env, Ms(100));
        d.enqueue(NotificationRequest::error("t", "b"), Ms(100));
        assert_eq!(d.armed_timers(), 2);

        d.shutdown();
        assert_eq!(d.armed_timers(), 0);
        assert_eq!(d.pending_count(), 0);
        assert!(d.visible().is_empty());
        assert_eq!(d.next_deadline(), None);
    }

    #[test]
    fn default_config_snapshot() {
        insta::assert_json_snapshot!(DedupConfig::default(), @r#"
        {
          "suppression_window": {
            "secs": 5,
            "nanos": 0
          },
          "error_debounce": {
            "secs": 0,
            "nanos": 500000000
          },
          "debounce": {
            "secs": 0,
            "nanos": 100000000
          }
        }
        "#);
    }

    fn request_for(key: u8) -> NotificationRequest {
        let title = format!("t{key}");
        if key % 2 == 0 {
            NotificationRequest::info(title, "m")
        } else {
            NotificationRequest::error(title, "m")
        }
    }

    proptest::proptest! {
        /// Shows of one key are at least a suppression window apart, and no
        /// two visible records ever share a key.
        #[test]
        fn prop_shows_respect_the_window(
            ops in proptest::collection::vec((0u8..4, 0u64..2_000), 1..80),
        ) {
            let env = TestEnv::default();
            let mut d = dedup();
            let mut shown: std::collections::HashMap<DedupeKey, Ms> = std::collections::HashMap::new();
            let mut now = 0u64;

            let mut settle = |d: &mut Deduplicator<Ms>, until: u64| -> Result<(), proptest::test_runner::TestCaseError> {
                while let Some(deadline) = d.next_deadline().filter(|at| at.0 <= until) {
                    for event in d.tick(&env, deadline) {
                        if let DedupEvent::Shown { id, .. } = event {
                            let record = d.get(id).cloned();
                            proptest::prop_assert!(record.is_some());
                            let Some(record) = record else { continue };
                            if let Some(previous) = shown.insert(record.dedupe_key.clone(), record.created_at) {
                                proptest::prop_assert!(record.created_at - previous >= DEFAULT_SUPPRESSION_WINDOW);
                            }
                        }
                    }
                    let mut keys: Vec<_> = d.visible().iter().map(|r| r.dedupe_key.clone()).collect();
                    let before = keys.len();
                    keys.sort();
                    keys.dedup();
                    proptest::prop_assert_eq!(keys.len(), before);
                }
                Ok(())
            };

            for (key, gap) in ops {
                now += gap;
                settle(&mut d, now)?;
                d.enqueue(request_for(key), Ms(now));
            }
            settle(&mut d, now + 60_000)?;
        }
    }
}
