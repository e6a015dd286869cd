//! Connection status presenter state machine.
//!
//! Translates transport events into a stable [`ConnectionSnapshot`], decides
//! when the status indicator is visible, gates the manual reconnect button
//! and turns relevant transitions into notification requests. Uses the action
//! pattern: methods take time as input and return [`StatusAction`]s for the
//! runtime to execute.
//!
//! # Indicator visibility
//!
//! ```text
//!  connecting / reconnecting / failed ──> visible
//!  connected ──> visible, hide after 3s ──(any other state first)──> stays
//!  disconnected ──> unchanged, pending hide cancelled
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    alerts,
    env::Timestamp,
    notification::NotificationRequest,
    timer::{TimerHandle, TimerQueue},
    transport::{CloseClass, CloseCode, ConnectionEvent, ConnectionState, TransportStats, TransportStatus},
};

/// Delay before the indicator hides after reaching `connected`.
pub const DEFAULT_CONNECTED_HIDE_DELAY: Duration = Duration::from_millis(3000);

/// Interval between fallback `status()` polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Consecutive connection-lost notifications allowed per outage.
pub const DEFAULT_FAILURE_CEILING: u32 = 3;

/// Rendering mode of the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Dot and label.
    #[default]
    Compact,
    /// Card with reconnect button, counters and statistics.
    Detailed,
}

/// Status presenter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Indicator auto-hide delay after `connected`.
    pub connected_hide_delay: Duration,
    /// Fallback status poll interval (upper bound on staleness).
    pub poll_interval: Duration,
    /// Connection-lost notifications surfaced before further ones are
    /// swallowed. Resets on successful reconnect.
    pub failure_ceiling: u32,
    /// Mode at mount.
    pub mode: DisplayMode,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            connected_hide_delay: DEFAULT_CONNECTED_HIDE_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            failure_ceiling: DEFAULT_FAILURE_CEILING,
            mode: DisplayMode::Compact,
        }
    }
}

/// Locally cached view of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot<I> {
    /// Last known connection state.
    pub connection_state: ConnectionState,
    /// Reconnect attempts since the last successful connect.
    pub reconnect_attempts: u32,
    /// Messages buffered by the transport while disconnected.
    pub queued_messages: u32,
    /// Last time the presenter saw the connection come up.
    pub last_connected_at: Option<I>,
    /// Last time the presenter saw a transport error.
    pub last_error_at: Option<I>,
    /// Transport counters from the last poll.
    pub stats: TransportStats,
}

impl<I> ConnectionSnapshot<I> {
    fn from_status(status: TransportStatus) -> Self {
        Self {
            connection_state: status.connection_state,
            reconnect_attempts: status.reconnect_attempts,
            queued_messages: status.queued_messages,
            last_connected_at: None,
            last_error_at: None,
            stats: status.stats,
        }
    }
}

/// Actions returned by the status presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusAction {
    /// Redraw the indicator.
    Render,
    /// Hand this request to the notification deduplicator.
    Notify(NotificationRequest),
    /// Remove visible connection-error notifications.
    ClearConnectionErrors,
    /// Call the transport's `reconnect()` (or the caller's override).
    Reconnect,
    /// Read `status()` and feed it to [`StatusPresenter::apply_status`].
    PollStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusTimer {
    HideIndicator,
    Poll,
}

/// Connection status presenter.
///
/// Pure state machine - no I/O. Time is passed as parameters to methods that
/// need it.
#[derive(Debug)]
pub struct StatusPresenter<I> {
    config: StatusConfig,
    snapshot: ConnectionSnapshot<I>,
    visible: bool,
    mode: DisplayMode,
    stats_expanded: bool,
    timers: TimerQueue<StatusTimer, I>,
    hide_timer: Option<TimerHandle>,
    poll_timer: Option<TimerHandle>,
    reconnect_in_flight: bool,
    consecutive_failures: u32,
    disrupted: bool,
    ever_connected: bool,
}

impl<I: Timestamp> StatusPresenter<I> {
    /// Create a presenter seeded with the transport's current status.
    ///
    /// Arms the first status poll one interval from `now`.
    pub fn new(now: I, config: StatusConfig, initial: TransportStatus) -> Self {
        let mut timers = TimerQueue::new();
        let poll_timer = Some(timers.schedule(StatusTimer::Poll, now + config.poll_interval));
        let state = initial.connection_state;
        let ever_connected = state.is_connected() || initial.stats.total_connections > 0;

        let mut snapshot = ConnectionSnapshot::from_status(initial);
        if state.is_connected() {
            snapshot.last_connected_at = Some(now);
        }

        Self {
            mode: config.mode,
            config,
            snapshot,
            visible: matches!(
                state,
                ConnectionState::Connecting | ConnectionState::Reconnecting | ConnectionState::Failed
            ),
            stats_expanded: false,
            timers,
            hide_timer: None,
            poll_timer,
            reconnect_in_flight: false,
            consecutive_failures: 0,
            disrupted: state.is_disruption()
                && (ever_connected || state != ConnectionState::Reconnecting),
            ever_connected,
        }
    }

    /// Process a transport event.
    pub fn handle_event(&mut self, event: ConnectionEvent, now: I) -> Vec<StatusAction> {
        match event {
            ConnectionEvent::StateChange(state) => self.transition(state, now),
            ConnectionEvent::Open => {
                self.snapshot.last_connected_at = Some(now);
                vec![StatusAction::Render]
            },
            ConnectionEvent::Error { code, message } => {
                self.snapshot.last_error_at = Some(now);
                let class = code.map_or(CloseClass::Other, CloseCode::class);
                self.report(class, message)
            },
            ConnectionEvent::Close { code, reason } => match code.class() {
                CloseClass::Normal => vec![StatusAction::Render],
                class => {
                    self.snapshot.last_error_at = Some(now);
                    self.report(class, reason)
                },
            },
        }
    }

    fn transition(&mut self, state: ConnectionState, now: I) -> Vec<StatusAction> {
        let previous = self.snapshot.connection_state;
        self.snapshot.connection_state = state;
        self.reconnect_in_flight = false;

        if previous != state {
            tracing::info!(from = %previous, to = %state, "connection state changed");
        }

        let mut actions = Vec::new();
        match state {
            ConnectionState::Connected => {
                self.visible = true;
                self.rearm_hide(now);
                self.snapshot.reconnect_attempts = 0;
                self.snapshot.last_connected_at = Some(now);
                self.consecutive_failures = 0;
                self.ever_connected = true;

                if std::mem::take(&mut self.disrupted) {
                    actions.push(StatusAction::ClearConnectionErrors);
                    actions.push(StatusAction::Notify(alerts::reconnected()));
                }
            },
            ConnectionState::Connecting => {
                self.visible = true;
                self.cancel_hide();
            },
            ConnectionState::Reconnecting => {
                self.visible = true;
                self.cancel_hide();
                // Retrying a first connect is not an interruption.
                self.disrupted |= self.ever_connected;
                if previous != ConnectionState::Reconnecting {
                    self.snapshot.reconnect_attempts += 1;
                }
            },
            ConnectionState::Failed => {
                self.visible = true;
                self.cancel_hide();
                self.disrupted = true;
                actions.extend(self.connection_lost("Не удалось подключиться к серверу"));
            },
            ConnectionState::Disconnected => {
                self.cancel_hide();
                self.disrupted = true;
                if previous != ConnectionState::Disconnected {
                    actions.push(StatusAction::Notify(alerts::disconnected()));
                }
            },
        }

        actions.push(StatusAction::Render);
        actions
    }

    fn report(&mut self, class: CloseClass, message: String) -> Vec<StatusAction> {
        let mut actions = match class {
            CloseClass::AuthFailed => vec![StatusAction::Notify(alerts::auth_failed())],
            CloseClass::ConnectionLost => self.connection_lost("Соединение с сервером потеряно"),
            CloseClass::ServerError => vec![StatusAction::Notify(alerts::server_error())],
            CloseClass::Other => vec![StatusAction::Notify(alerts::generic_error(message))],
            CloseClass::Normal => Vec::new(),
        };
        actions.push(StatusAction::Render);
        actions
    }

    /// Connection-lost notification, subject to the per-outage ceiling.
    fn connection_lost(&mut self, message: &str) -> Vec<StatusAction> {
        self.disrupted = true;
        self.consecutive_failures += 1;
        if self.consecutive_failures > self.config.failure_ceiling {
            tracing::debug!(
                failures = self.consecutive_failures,
                ceiling = self.config.failure_ceiling,
                "connection-lost notification over ceiling"
            );
            return Vec::new();
        }
        vec![StatusAction::Notify(alerts::connection_lost(message))]
    }

    fn rearm_hide(&mut self, now: I) {
        self.cancel_hide();
        let deadline = now + self.config.connected_hide_delay;
        self.hide_timer = Some(self.timers.schedule(StatusTimer::HideIndicator, deadline));
    }

    fn cancel_hide(&mut self) {
        if let Some(handle) = self.hide_timer.take() {
            let _ = self.timers.cancel(handle);
        }
    }

    /// Fire due timers: indicator auto-hide and status polling.
    ///
    /// Also ends the current reconnect guard window, so a reconnect request
    /// can be issued again on the next tick if the state still allows it.
    pub fn tick(&mut self, now: I) -> Vec<StatusAction> {
        self.reconnect_in_flight = false;
        let mut actions = Vec::new();
        let mut poll_due = false;

        while let Some(fired) = self.timers.pop_expired(now) {
            match fired.key {
                StatusTimer::HideIndicator => {
                    self.hide_timer = None;
                    if self.snapshot.connection_state.is_connected() {
                        self.visible = false;
                        actions.push(StatusAction::Render);
                    }
                },
                StatusTimer::Poll => poll_due = true,
            }
        }

        // Re-armed after draining so a zero interval fires once per tick.
        if poll_due {
            let next = now + self.config.poll_interval;
            self.poll_timer = Some(self.timers.schedule(StatusTimer::Poll, next));
            actions.push(StatusAction::PollStatus);
        }

        actions
    }

    /// Reconcile the snapshot with a polled status.
    ///
    /// A state that differs from the cached one is processed exactly as a
    /// missed `stateChange` event.
    pub fn apply_status(&mut self, status: TransportStatus, now: I) -> Vec<StatusAction> {
        let changed_counters = self.snapshot.queued_messages != status.queued_messages
            || self.snapshot.stats != status.stats;
        self.snapshot.queued_messages = status.queued_messages;
        self.snapshot.stats = status.stats;

        if status.connection_state != self.snapshot.connection_state {
            tracing::debug!(
                cached = %self.snapshot.connection_state,
                polled = %status.connection_state,
                "status poll found missed transition"
            );
            let actions = self.transition(status.connection_state, now);
            if !status.connection_state.is_connected() {
                self.snapshot.reconnect_attempts = status.reconnect_attempts;
            }
            return actions;
        }

        let changed = changed_counters || self.snapshot.reconnect_attempts != status.reconnect_attempts;
        self.snapshot.reconnect_attempts = status.reconnect_attempts;
        if changed { vec![StatusAction::Render] } else { Vec::new() }
    }

    /// User pressed "Reconnect".
    ///
    /// Returns no actions unless the state allows a manual reconnect and no
    /// request issued by this presenter is still outstanding.
    pub fn request_reconnect(&mut self) -> Vec<StatusAction> {
        if !self.can_reconnect() {
            tracing::debug!(
                state = %self.snapshot.connection_state,
                in_flight = self.reconnect_in_flight,
                "manual reconnect ignored"
            );
            return Vec::new();
        }

        self.reconnect_in_flight = true;
        vec![StatusAction::Reconnect, StatusAction::Render]
    }

    /// Mark the outstanding reconnect request as finished.
    pub fn reconnect_finished(&mut self) {
        self.reconnect_in_flight = false;
    }

    /// Whether the reconnect button is enabled.
    pub fn can_reconnect(&self) -> bool {
        self.snapshot.connection_state.allows_manual_reconnect() && !self.reconnect_in_flight
    }

    /// Switch rendering mode.
    pub fn set_mode(&mut self, mode: DisplayMode) -> Vec<StatusAction> {
        self.mode = mode;
        vec![StatusAction::Render]
    }

    /// Toggle between compact and detailed rendering.
    pub fn toggle_mode(&mut self) -> Vec<StatusAction> {
        let next = match self.mode {
            DisplayMode::Compact => DisplayMode::Detailed,
            DisplayMode::Detailed => DisplayMode::Compact,
        };
        self.set_mode(next)
    }

    /// Expand or collapse the statistics panel (detailed mode).
    pub fn toggle_stats(&mut self) -> Vec<StatusAction> {
        self.stats_expanded = !self.stats_expanded;
        vec![StatusAction::Render]
    }

    /// Cached connection view.
    pub fn snapshot(&self) -> &ConnectionSnapshot<I> {
        &self.snapshot
    }

    /// Whether the indicator should be drawn.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current rendering mode.
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Whether the statistics panel is expanded.
    pub fn stats_expanded(&self) -> bool {
        self.stats_expanded
    }

    /// Connection-lost reports in the current outage.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether the indicator auto-hide is armed.
    pub fn hide_pending(&self) -> bool {
        self.hide_timer.is_some()
    }

    /// Earliest armed deadline.
    pub fn next_deadline(&self) -> Option<I> {
        self.timers.next_deadline()
    }

    /// Disarm all timers (unmount).
    pub fn shutdown(&mut self) {
        self.hide_timer = None;
        self.poll_timer = None;
        self.timers.clear();
    }

    /// Number of armed timers.
    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alerts::{AUTH_ERROR_TITLE, CONNECTION_ERROR_TITLE, LOGIN_LABEL, RECONNECTED_TITLE},
        env::test_env::Ms,
        notification::NotificationKind,
    };

    fn presenter() -> StatusPresenter<Ms> {
        StatusPresenter::new(Ms(0), StatusConfig::default(), TransportStatus::initial())
    }

    fn notifications(actions: &[StatusAction]) -> Vec<&NotificationRequest> {
        actions
            .iter()
            .filter_map(|a| match a {
                StatusAction::Notify(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn state(s: ConnectionState) -> ConnectionEvent {
        ConnectionEvent::StateChange(s)
    }

    #[test]
    fn connecting_is_visible_at_mount() {
        let p = presenter();
        assert!(p.is_visible());
        assert_eq!(p.snapshot().connection_state, ConnectionState::Connecting);
        assert_eq!(p.next_deadline(), Some(Ms(5_000)));
    }

    #[test]
    fn connected_hides_after_delay() {
        let mut p = presenter();
        p.handle_event(state(ConnectionState::Connected), Ms(1_000));
        assert!(p.is_visible());

        assert!(p.tick(Ms(3_999)).is_empty());
        assert!(p.is_visible());
        assert_eq!(p.tick(Ms(4_000)), vec![StatusAction::Render]);
        assert!(!p.is_visible());
    }

    #[test]
    fn non_connected_state_cancels_hide() {
        let mut p = presenter();
        p.handle_event(state(ConnectionState::Connected), Ms(0));
        p.handle_event(state(ConnectionState::Reconnecting), Ms(1_000));
        assert!(!p.hide_pending());

        p.tick(Ms(4_000));
        assert!(p.is_visible());
    }

    #[test]
    fn disconnected_cancels_hide_without_forcing_visibility() {
        let mut p = presenter();
        p.handle_event(state(ConnectionState::Connected), Ms(0));
        p.tick(Ms(3_000));
        assert!(!p.is_visible());

        p.handle_event(state(ConnectionState::Disconnected), Ms(3_500));
        assert!(!p.is_visible());
        assert!(!p.hide_pending());
    }

    #[test]
    fn first_connect_is_silent() {
        let mut p = presenter();
        let actions = p.handle_event(state(ConnectionState::Connected), Ms(0));
        assert_eq!(actions, vec![StatusAction::Render]);
    }

    #[test]
    fn recovery_clears_errors_then_reports_success() {
        let mut p = presenter();
        let failed = p.handle_event(state(ConnectionState::Failed), Ms(0));
        assert_eq!(notifications(&failed)[0].title, CONNECTION_ERROR_TITLE);

        let recovered = p.handle_event(state(ConnectionState::Connected), Ms(100));
        assert_eq!(recovered[0], StatusAction::ClearConnectionErrors);
        let notes = notifications(&recovered);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Success);
        assert_eq!(notes[0].title, RECONNECTED_TITLE);
    }

    #[test]
    fn retried_first_connect_is_not_a_recovery() {
        let mut p = presenter();
        p.handle_event(state(ConnectionState::Reconnecting), Ms(0));
        p.handle_event(state(ConnectionState::Reconnecting), Ms(1_000));

        let actions = p.handle_event(state(ConnectionState::Connected), Ms(2_000));
        assert_eq!(actions, vec![StatusAction::Render]);
        assert_eq!(p.snapshot().reconnect_attempts, 0);
    }

    #[test]
    fn retry_after_a_session_is_a_recovery() {
        let mut p = presenter();
        p.handle_event(state(ConnectionState::Connected), Ms(0));
        p.handle_event(state(ConnectionState::Reconnecting), Ms(1_000));

        let actions = p.handle_event(state(ConnectionState::Connected), Ms(2_000));
        assert_eq!(notifications(&actions)[0].title, RECONNECTED_TITLE);
    }

    #[test]
    fn first_connect_after_reported_error_clears_it() {
        let mut p = presenter();
        p.handle_event(
            ConnectionEvent::Error { code: Some(CloseCode::ABNORMAL), message: String::new() },
            Ms(0),
        );
        p.handle_event(state(ConnectionState::Reconnecting), Ms(0));

        let actions = p.handle_event(state(ConnectionState::Connected), Ms(1_000));
        assert_eq!(actions[0], StatusAction::ClearConnectionErrors);
    }

    #[test]
    fn mounted_mid_outage_of_earlier_session_reports_recovery() {
        let mut initial = TransportStatus::initial();
        initial.connection_state = ConnectionState::Reconnecting;
        initial.stats.total_connections = 1;
        let mut p = StatusPresenter::new(Ms(0), StatusConfig::default(), initial);

        let actions = p.handle_event(state(ConnectionState::Connected), Ms(100));
        assert_eq!(notifications(&actions)[0].title, RECONNECTED_TITLE);
    }

    #[test]
    fn failure_ceiling_caps_reports_until_reconnect() {
        let mut p = presenter();
        let mut produced = 0;
        for t in 0..5 {
            produced += notifications(&p.handle_event(state(ConnectionState::Failed), Ms(t))).len();
        }
        assert_eq!(produced, 3);

        p.handle_event(state(ConnectionState::Connected), Ms(10));
        let again = p.handle_event(state(ConnectionState::Failed), Ms(20));
        assert_eq!(notifications(&again).len(), 1);
    }

    #[test]
    fn abnormal_close_counts_toward_ceiling() {
        let mut p = presenter();
        let abnormal = || ConnectionEvent::Error { code: Some(CloseCode::ABNORMAL), message: String::new() };
        let mut produced = 0;
        for t in 0..2 {
            produced += notifications(&p.handle_event(abnormal(), Ms(t))).len();
        }
        for t in 2..4 {
            produced += notifications(&p.handle_event(state(ConnectionState::Failed), Ms(t))).len();
        }
        assert_eq!(produced, 3);
        assert_eq!(p.snapshot().last_error_at, Some(Ms(1)));
    }

    #[test]
    fn auth_failure_is_sticky_with_login() {
        let mut p = presenter();
        let actions = p.handle_event(
            ConnectionEvent::Error { code: Some(CloseCode::AUTH_FAILED), message: "expired".into() },
            Ms(0),
        );
        let notes = notifications(&actions);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, AUTH_ERROR_TITLE);
        assert!(!notes[0].options.auto_hide);
        assert_eq!(notes[0].options.actions.len(), 1);
        assert_eq!(notes[0].options.actions[0].label, LOGIN_LABEL);
    }

    #[test]
    fn normal_close_is_silent() {
        let mut p = presenter();
        let actions = p.handle_event(
            ConnectionEvent::Close { code: CloseCode::NORMAL, reason: String::new() },
            Ms(0),
        );
        assert_eq!(actions, vec![StatusAction::Render]);
        assert_eq!(p.snapshot().last_error_at, None);
    }

    #[test]
    fn unknown_error_uses_transport_message() {
        let mut p = presenter();
        let actions = p.handle_event(
            ConnectionEvent::Error { code: None, message: "tls handshake failed".into() },
            Ms(0),
        );
        assert_eq!(notifications(&actions)[0].message, "tls handshake failed");
    }

    #[test]
    fn reconnect_gated_by_state_and_in_flight() {
        let mut p = presenter();
        assert!(p.request_reconnect().is_empty(), "connecting");

        p.handle_event(state(ConnectionState::Failed), Ms(0));
        assert_eq!(p.request_reconnect(), vec![StatusAction::Reconnect, StatusAction::Render]);
        assert!(p.request_reconnect().is_empty(), "double click in same tick");

        p.tick(Ms(1));
        assert!(!p.request_reconnect().is_empty(), "new tick");
    }

    #[test]
    fn poll_fires_on_interval() {
        let mut p = presenter();
        assert!(p.tick(Ms(4_999)).is_empty());
        assert_eq!(p.tick(Ms(5_000)), vec![StatusAction::PollStatus]);
        assert_eq!(p.next_deadline(), Some(Ms(10_000)));
    }

    #[test]
    fn zero_poll_interval_fires_once_per_tick() {
        let config = StatusConfig { poll_interval: Duration::ZERO, ..StatusConfig::default() };
        let mut p = StatusPresenter::new(Ms(0), config, TransportStatus::initial());

        assert_eq!(p.tick(Ms(0)), vec![StatusAction::PollStatus]);
        assert_eq!(p.next_deadline(), Some(Ms(0)));
        assert_eq!(p.tick(Ms(0)), vec![StatusAction::PollStatus]);
        assert_eq!(p.armed_timers(), 1);
    }

    #[test]
    fn poll_catches_missed_transition() {
        let mut p = presenter();
        p.handle_event(state(ConnectionState::Connected), Ms(0));

        let mut polled = TransportStatus::initial();
        polled.connection_state = ConnectionState::Failed;
        polled.reconnect_attempts = 4;

        let actions = p.apply_status(polled, Ms(5_000));
        assert_eq!(p.snapshot().connection_state, ConnectionState::Failed);
        assert_eq!(p.snapshot().reconnect_attempts, 4);
        assert_eq!(notifications(&actions).len(), 1);
    }

    #[test]
    fn poll_without_change_is_quiet() {
        let mut p = presenter();
        assert!(p.apply_status(TransportStatus::initial(), Ms(5_000)).is_empty());

        let mut polled = TransportStatus::initial();
        polled.queued_messages = 3;
        assert_eq!(p.apply_status(polled, Ms(5_000)), vec![StatusAction::Render]);
        assert_eq!(p.snapshot().queued_messages, 3);
    }

    #[test]
    fn mode_and_stats_toggle() {
        let mut p = presenter();
        assert_eq!(p.mode(), DisplayMode::Compact);
        p.toggle_mode();
        assert_eq!(p.mode(), DisplayMode::Detailed);
        p.toggle_stats();
        assert!(p.stats_expanded());
    }

    #[test]
    fn shutdown_disarms_timers() {
        let mut p = presenter();
        p.handle_event(state(ConnectionState::Connected), Ms(0));
        assert_eq!(p.armed_timers(), 2);
        p.shutdown();
        assert_eq!(p.armed_timers(), 0);
        assert_eq!(p.next_deadline(), None);
    }
}
