//! Notification cards
//!
//! One list entry per visible notification, in insertion order.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};
use relaywatch_core::{NotificationCard, NotificationId, NotificationKind};

fn kind_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Success => Color::Green,
        NotificationKind::Error => Color::Red,
        NotificationKind::Warning => Color::Yellow,
        NotificationKind::Info => Color::Blue,
    }
}

/// Render the card list.
pub fn render(
    frame: &mut Frame,
    cards: &[NotificationCard],
    selected: Option<NotificationId>,
    area: Rect,
) {
    let block = Block::default().borders(Borders::ALL).title(format!(" Уведомления ({}) ", cards.len()));

    let items: Vec<ListItem> = if cards.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "Нет уведомлений",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        cards.iter().map(|card| card_item(card, selected == Some(card.id))).collect()
    };

    frame.render_widget(List::new(items).block(block), area);
}

fn card_item(card: &NotificationCard, is_selected: bool) -> ListItem<'static> {
    let marker = if is_selected { "▶ " } else { "  " };

    let mut heading = vec![
        Span::raw(marker),
        Span::styled(card.glyph(), Style::default().fg(kind_color(card.kind))),
        Span::raw(" "),
        Span::styled(card.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
    ];
    if let Some(remaining) = card.remaining {
        let secs = remaining.as_millis().div_ceil(1000);
        heading.push(Span::styled(format!("  {secs} с"), Style::default().fg(Color::DarkGray)));
    }

    let mut lines = vec![Line::from(heading), Line::from(format!("    {}", card.message))];

    if !card.actions.is_empty() {
        let mut buttons = vec![Span::raw("    ")];
        for action in &card.actions {
            let style = if action.is_primary {
                Style::default().fg(Color::Black).bg(kind_color(card.kind)).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            buttons.push(Span::styled(format!("[{}]", action.label), style));
            buttons.push(Span::raw(" "));
        }
        lines.push(Line::from(buttons));
    }

    let item = ListItem::new(lines);
    if is_selected { item.style(Style::default().bg(Color::DarkGray)) } else { item }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use relaywatch_core::{CardAction, alerts::LOGIN_LABEL};

    use crate::ui::{Screen, test_support::draw};

    use super::*;

    fn auth_card() -> NotificationCard {
        NotificationCard {
            id: NotificationId::new(1, 9),
            kind: NotificationKind::Error,
            title: "Ошибка авторизации".into(),
            message: "Сессия истекла. Войдите в систему снова.".into(),
            actions: vec![CardAction { index: 0, label: LOGIN_LABEL.into(), is_primary: true }],
            remaining: None,
        }
    }

    fn saved_card() -> NotificationCard {
        NotificationCard {
            id: NotificationId::new(2, 9),
            kind: NotificationKind::Success,
            title: "Успешно".into(),
            message: "Документ сохранён".into(),
            actions: Vec::new(),
            remaining: Some(Duration::from_millis(4_200)),
        }
    }

    #[test]
    fn cards_show_glyph_title_message_and_actions() {
        let screen = Screen { cards: vec![auth_card(), saved_card()], ..Screen::default() };
        let text = draw(&screen, 100, 12);

        assert!(text.contains("Уведомления (2)"));
        assert!(text.contains("✗ Ошибка авторизации"));
        assert!(text.contains("Сессия истекла. Войдите в систему снова."));
        assert!(text.contains("[Войти]"));
        assert!(text.contains("✓ Успешно  5 с"));
        assert!(text.contains("Документ сохранён"));
    }

    #[test]
    fn selected_card_is_marked() {
        let saved = saved_card();
        let screen =
            Screen { cards: vec![auth_card(), saved.clone()], selected: Some(saved.id), ..Screen::default() };
        let text = draw(&screen, 100, 12);

        assert!(text.contains("▶ ✓ Успешно"));
        assert!(text.contains("  ✗ Ошибка авторизации"));
    }

    #[test]
    fn sticky_card_has_no_countdown() {
        let screen = Screen { cards: vec![auth_card()], ..Screen::default() };
        let text = draw(&screen, 100, 12);
        let heading = text.lines().find(|line| line.contains("Ошибка авторизации")).unwrap();
        assert!(!heading.contains(" с"));
    }
}
