//! Behavioral properties of the notification layer.
//!
//! Every test runs the production runtime against virtual time, so the
//! millisecond boundaries below are exact.

use std::{collections::HashSet, sync::Arc, time::Duration};

use proptest::prelude::*;
use relaywatch_app::StatusMonitor;
use relaywatch_core::{
    CloseCode, ConnectionEvent, ConnectionState, NotificationKind, NotificationOptions,
    NotificationRequest, StatusAction, StatusConfig, StatusPresenter, TransportStatus,
    alerts::{self, AUTH_ERROR_TITLE, CONNECTION_ERROR_TITLE, LOGIN_LABEL, RECONNECTED_TITLE},
};
use relaywatch_harness::{MockTransport, Scenario, SimInstant};

fn titles(s: &Scenario) -> Vec<String> {
    s.cards().into_iter().map(|c| c.title).collect()
}

proptest! {
    /// A burst of identical requests spanning at most the suppression window
    /// produces exactly one visible notification.
    #[test]
    fn prop_burst_shows_exactly_once(
        mut offsets in prop::collection::vec(0u64..5_000, 1..40),
        seed in any::<u64>(),
    ) {
        offsets.sort_unstable();
        let mut s = Scenario::new(seed);
        let notifications = s.notifications();
        let mut shown = HashSet::new();

        for offset in offsets {
            s.advance_to_ms(offset);
            notifications.show_error("Сервер не отвечает", NotificationOptions::default());
            s.step();
            shown.extend(s.cards().into_iter().map(|c| c.id));
        }
        for _ in 0..6 {
            s.advance_ms(100);
            shown.extend(s.cards().into_iter().map(|c| c.id));
        }

        prop_assert_eq!(shown.len(), 1);
    }

    /// Any interleaving of transport events keeps the standard invariants.
    #[test]
    fn prop_transport_noise_keeps_invariants(
        steps in prop::collection::vec((0u8..9, 0u64..1_500), 0..60),
    ) {
        let mut s = Scenario::new(11);
        for (event, gap) in steps {
            let event = match event {
                0 => ConnectionEvent::StateChange(ConnectionState::Connecting),
                1 => ConnectionEvent::StateChange(ConnectionState::Connected),
                2 => ConnectionEvent::StateChange(ConnectionState::Reconnecting),
                3 => ConnectionEvent::StateChange(ConnectionState::Disconnected),
                4 => ConnectionEvent::StateChange(ConnectionState::Failed),
                5 => ConnectionEvent::Error { code: Some(CloseCode::ABNORMAL), message: String::new() },
                6 => ConnectionEvent::Error { code: Some(CloseCode::AUTH_FAILED), message: String::new() },
                7 => ConnectionEvent::Close { code: CloseCode::SERVER_ERROR, reason: "boom".into() },
                _ => ConnectionEvent::Open,
            };
            // Scenario asserts the standard invariants after every step.
            s.emit(event);
            s.advance_ms(gap);
        }
    }
}

#[test]
fn trailing_request_wins_the_burst() {
    let mut s = Scenario::new(2);
    let notifications = s.notifications();
    for (at, secs) in [(0, 1), (40, 2), (80, 3)] {
        s.advance_to_ms(at);
        let options = NotificationOptions::default().with_duration(Duration::from_secs(secs));
        notifications.show_info("Экспорт завершён", options);
        s.step();
    }

    s.advance_to_ms(179);
    assert!(s.cards().is_empty(), "debounce restarts on every request");

    s.advance_to_ms(180);
    let cards = s.cards();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].remaining, Some(Duration::from_secs(3)));
}

#[test]
fn mount_unmount_cycles_leave_no_listeners() {
    let transport = Arc::new(MockTransport::new());
    for _ in 0..100 {
        let (monitor, _events) = StatusMonitor::mount(Some(transport.clone()));
        assert_eq!(transport.listener_count(), 4);
        drop(monitor);
    }
    assert_eq!(transport.listener_count(), 0);
}

#[test]
fn runtime_unmount_releases_listeners() {
    let s = Scenario::new(3);
    let transport = s.shared_transport();
    let notifications = s.notifications();
    assert_eq!(transport.listener_count(), 4);

    s.unmount();
    assert_eq!(transport.listener_count(), 0);
    assert!(!notifications.is_mounted());
}

#[test]
fn auto_hide_boundary_is_exact() {
    let mut s = Scenario::new(4);
    s.notifications().show_info("Документ сохранён", NotificationOptions::default());
    s.step();

    s.advance_to_ms(100);
    assert_eq!(s.cards().len(), 1, "shown after info debounce");

    s.advance_to_ms(100 + 4_999);
    assert_eq!(s.cards().len(), 1);

    s.advance_to_ms(100 + 5_001);
    assert!(s.cards().is_empty());
}

#[test]
fn recovery_replaces_connection_error_with_success() {
    let mut s = Scenario::new(5);
    s.emit(ConnectionEvent::StateChange(ConnectionState::Failed));
    s.advance_ms(500);
    assert_eq!(titles(&s), vec![CONNECTION_ERROR_TITLE]);

    s.emit(ConnectionEvent::StateChange(ConnectionState::Connected));
    assert!(titles(&s).is_empty(), "error cleared synchronously");

    s.advance_ms(100);
    let cards = s.cards();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].kind, NotificationKind::Success);
    assert_eq!(cards[0].title, RECONNECTED_TITLE);
}

#[test]
fn auth_failure_is_sticky_with_one_login_action() {
    let mut s = Scenario::new(6);
    s.transport().fail_with(CloseCode::AUTH_FAILED, "policy violation");
    s.step();
    s.advance_ms(500);

    let cards = s.cards();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].title, AUTH_ERROR_TITLE);
    assert_eq!(cards[0].remaining, None);
    assert_eq!(cards[0].actions.len(), 1);
    assert_eq!(cards[0].actions[0].label, LOGIN_LABEL);
    assert!(cards[0].actions[0].is_primary);

    s.advance_ms(60_000);
    assert_eq!(s.cards().len(), 1, "auth error never auto-hides");
}

#[test]
fn five_failures_surface_three_notifications() {
    let mut presenter = StatusPresenter::new(
        SimInstant::default(),
        StatusConfig::default(),
        TransportStatus::initial(),
    );

    let produced: usize = (0..5u64)
        .map(|i| {
            presenter
                .handle_event(
                    ConnectionEvent::StateChange(ConnectionState::Failed),
                    SimInstant::from_millis(i * 1_000),
                )
                .into_iter()
                .filter(|a| matches!(a, StatusAction::Notify(_)))
                .count()
        })
        .sum();

    assert_eq!(produced, 3);
    assert_eq!(presenter.consecutive_failures(), 5);
}

#[test]
fn ceiling_resets_after_reconnect() {
    let mut s = Scenario::new(7);
    for _ in 0..5 {
        s.emit(ConnectionEvent::StateChange(ConnectionState::Failed));
        s.advance_ms(6_000);
    }
    let failures = s.snapshot().indicator.map(|i| i.failures);
    assert_eq!(failures, Some(5));

    s.emit(ConnectionEvent::StateChange(ConnectionState::Connected));
    s.emit(ConnectionEvent::StateChange(ConnectionState::Failed));
    s.advance_ms(500);
    assert!(titles(&s).iter().any(|t| t == CONNECTION_ERROR_TITLE));
}

#[test]
fn normal_close_is_silent() {
    let mut s = Scenario::new(8);
    s.transport().close(CloseCode::NORMAL, "bye");
    s.transport().close(CloseCode::GOING_AWAY, "navigating");
    s.step();
    s.advance_ms(1_000);
    assert!(s.cards().is_empty());
}

#[test]
fn missed_transition_is_caught_by_poll() {
    let mut s = Scenario::new(9);
    s.emit(ConnectionEvent::StateChange(ConnectionState::Connected));
    s.transport().update(|status| status.connection_state = ConnectionState::Failed);

    s.advance_to_ms(4_999);
    assert_eq!(s.frame().connection_state, Some(ConnectionState::Connected));

    s.advance_to_ms(5_000);
    assert_eq!(s.frame().connection_state, Some(ConnectionState::Failed));
    assert!(s.frame().indicator_visible);
    assert!(s.frame().can_reconnect);
}

#[test]
fn model_unavailable_through_handle() {
    let mut s = Scenario::new(10);
    assert!(s.notifications().show_model_unavailable("legal-large"));
    s.step();
    s.advance_ms(100);
    let cards = s.cards();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].title, alerts::MODEL_UNAVAILABLE_TITLE);
}

#[test]
fn queue_snapshot_after_auth_failure() {
    let mut s = Scenario::new(12);
    s.transport().fail_with(CloseCode::AUTH_FAILED, "policy violation");
    s.step();
    s.advance_ms(500);

    insta::assert_json_snapshot!(s.snapshot(), { ".notifications[].id" => "[id]" }, @r#"
    {
      "notifications": [
        {
          "id": "[id]",
          "dedupe_key": "error_Ошибка авторизации_Сессия истекла. Войдите в систему снова.",
          "kind": "error",
          "title": "Ошибка авторизации",
          "message": "Сессия истекла. Войдите в систему снова.",
          "auto_hide": false,
          "actions": [
            "*Войти"
          ]
        }
      ],
      "queue": {
        "pending": 0,
        "armed_timers": 0
      },
      "indicator": {
        "state": "connecting",
        "visible": true,
        "can_reconnect": false,
        "reconnect_attempts": 0,
        "queued_messages": 0,
        "mode": "compact",
        "failures": 0
      }
    }
    "#);
}

#[test]
fn generic_request_uses_its_own_title() {
    let mut s = Scenario::new(13);
    s.notifications().show(NotificationRequest::warning("Квота", "Осталось 5%"));
    s.step();
    s.advance_ms(100);
    assert_eq!(titles(&s), vec!["Квота"]);
}
