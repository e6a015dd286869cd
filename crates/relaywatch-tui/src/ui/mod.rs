//! UI rendering
//!
//! Rendering functions that convert a [`Screen`] into terminal output using
//! ratatui widgets. All functions are pure (no I/O).
//!
//! The runtime hands the driver a borrowed [`View`]; the driver copies it into
//! an owned [`Screen`] so the last frame can be redrawn on resize and its
//! countdowns aged between runtime renders.

mod notifications;
mod status;

use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use relaywatch_app::View;
use relaywatch_core::{
    ConnectionState, DisplayMode, NotificationCard, NotificationId, Timestamp, TransportStats,
};

const KEY_HELP: &str =
    " q выход  r переподключить  m режим  s статистика  ↑↓ выбор  Enter действие  d закрыть";

/// Owned copy of the connection indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    /// Last known state.
    pub state: ConnectionState,
    /// Drawn at all.
    pub visible: bool,
    /// Compact or detailed.
    pub mode: DisplayMode,
    /// Statistics panel open.
    pub stats_expanded: bool,
    /// Reconnect button enabled.
    pub can_reconnect: bool,
    /// Attempts since the last successful connect.
    pub reconnect_attempts: u32,
    /// Frames waiting for the connection.
    pub queued_messages: u32,
    /// Time since the connection last came up.
    pub since_connected: Option<Duration>,
    /// Transport counters.
    pub stats: TransportStats,
}

/// Everything drawn in one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    /// `None` when no transport is attached.
    pub indicator: Option<Indicator>,
    /// Visible notifications in insertion order.
    pub cards: Vec<NotificationCard>,
    /// Selected card.
    pub selected: Option<NotificationId>,
    /// Transient footer message from the front-end.
    pub hint: Option<String>,
}

impl Screen {
    /// Copy a runtime view taken at `now`.
    pub fn from_view<I: Timestamp>(view: &View<'_, I>, now: I) -> Self {
        let indicator = view.status.map(|status| {
            let snapshot = status.snapshot();
            Indicator {
                state: snapshot.connection_state,
                visible: status.is_visible(),
                mode: status.mode(),
                stats_expanded: status.stats_expanded(),
                can_reconnect: status.can_reconnect(),
                reconnect_attempts: snapshot.reconnect_attempts,
                queued_messages: snapshot.queued_messages,
                since_connected: snapshot.last_connected_at.map(|at| now - at),
                stats: snapshot.stats.clone(),
            }
        });

        Self { indicator, cards: view.cards.to_vec(), selected: view.selected, hint: None }
    }

    /// The same frame `elapsed` later: countdowns run down, ages grow.
    #[must_use]
    pub fn aged(&self, elapsed: Duration) -> Self {
        let mut screen = self.clone();
        for card in &mut screen.cards {
            card.remaining = card.remaining.map(|left| left.saturating_sub(elapsed));
        }
        if let Some(indicator) = screen.indicator.as_mut() {
            indicator.since_connected = indicator.since_connected.map(|age| age + elapsed);
        }
        screen
    }
}

/// Render the entire UI.
pub fn render(frame: &mut Frame, screen: &Screen) {
    const CARDS_MIN_HEIGHT: u16 = 3;
    const HELP_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(status::height(screen.indicator.as_ref())),
            Constraint::Min(CARDS_MIN_HEIGHT),
            Constraint::Length(HELP_HEIGHT),
        ])
        .split(frame.area());

    let [status_area, cards_area, help_area] = chunks.as_ref() else {
        return;
    };

    status::render(frame, screen.indicator.as_ref(), screen.hint.as_deref(), *status_area);
    notifications::render(frame, &screen.cards, screen.selected, *cards_area);

    let help = Paragraph::new(Line::from(Span::raw(KEY_HELP)))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(help, *help_area);
}
