//! Connection indicator
//!
//! Compact mode is a single line with a colored dot and the state label.
//! Detailed mode is a bordered card with counters, the reconnect button and
//! an expandable statistics panel.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use relaywatch_core::{ConnectionState, DisplayMode, alerts::RECONNECT_LABEL};

use super::Indicator;

const BORDER_SIZE: u16 = 2;
const DOT: &str = "●";

/// Rows needed by the indicator.
pub fn height(indicator: Option<&Indicator>) -> u16 {
    match indicator {
        Some(indicator) if indicator.visible && indicator.mode == DisplayMode::Detailed => {
            let rows = u16::try_from(detailed_lines(indicator).len()).unwrap_or(u16::MAX);
            rows.saturating_add(BORDER_SIZE)
        },
        _ => 1,
    }
}

/// Render the indicator, or just the hint when it is hidden.
pub fn render(frame: &mut Frame, indicator: Option<&Indicator>, hint: Option<&str>, area: Rect) {
    let hint = hint.map(|text| Span::styled(format!("  {text}"), Style::default().fg(Color::Cyan)));

    match indicator {
        Some(indicator) if indicator.visible && indicator.mode == DisplayMode::Detailed => {
            let mut lines = detailed_lines(indicator);
            if let (Some(hint), Some(first)) = (hint, lines.first_mut()) {
                first.spans.push(hint);
            }
            let block = Block::default().borders(Borders::ALL).title(" Соединение ");
            frame.render_widget(Paragraph::new(lines).block(block), area);
        },
        Some(indicator) if indicator.visible => {
            let mut spans = vec![Span::raw(" ")];
            spans.extend(state_spans(indicator.state));
            spans.extend(hint);
            frame.render_widget(Paragraph::new(Line::from(spans)), area);
        },
        _ => {
            frame.render_widget(Paragraph::new(Line::from(hint.into_iter().collect::<Vec<_>>())), area);
        },
    }
}

fn state_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Connected => Color::Green,
        ConnectionState::Connecting | ConnectionState::Reconnecting => Color::Yellow,
        ConnectionState::Disconnected | ConnectionState::Failed => Color::Red,
    }
}

fn state_spans(state: ConnectionState) -> [Span<'static>; 3] {
    [
        Span::styled(DOT, Style::default().fg(state_color(state))),
        Span::raw(" "),
        Span::styled(state.label(), Style::default().add_modifier(Modifier::BOLD)),
    ]
}

fn detailed_lines(indicator: &Indicator) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);

    let last_connected = indicator
        .since_connected
        .map_or_else(|| "—".to_owned(), |age| format!("{} с назад", age.as_secs()));

    let button_style = if indicator.can_reconnect {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        dim
    };

    let mut lines = vec![
        Line::from(state_spans(indicator.state).to_vec()),
        Line::from(format!("Попытки переподключения: {}", indicator.reconnect_attempts)),
        Line::from(format!("Сообщений в очереди: {}", indicator.queued_messages)),
        Line::from(format!("Последнее подключение: {last_connected}")),
        Line::from(vec![
            Span::styled(format!("[r] {RECONNECT_LABEL}"), button_style),
            Span::raw("  "),
            Span::styled("[s] Статистика", dim),
        ]),
    ];

    if indicator.stats_expanded {
        let stats = &indicator.stats;
        lines.push(Line::from(format!("Всего подключений: {}", stats.total_connections)));
        lines.push(Line::from(format!("Переподключений: {}", stats.total_reconnections)));
        lines.push(Line::from(format!("Сообщений: {}", stats.total_messages)));
    }

    lines
}
