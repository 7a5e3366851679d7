use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let criteria = app.session.criteria();
    let mut flags = Vec::new();
    if !criteria.search_text.is_empty() {
        flags.push(format!("search: {}", criteria.search_text));
    }
    if criteria.only_unanswered {
        flags.push("unanswered".to_string());
    }
    if criteria.only_incorrect {
        flags.push("incorrect".to_string());
    }
    let title = if flags.is_empty() {
        " Questions ".to_string()
    } else {
        format!(" Questions ({}) ", flags.join(", "))
    };

    // Group headers and question rows share one list; the cursor only ever
    // lands on question rows.
    let mut items: Vec<ListItem> = Vec::new();
    let mut selected_row = None;
    let mut question_index = 0usize;

    for (label, questions) in app.session.grouped_listing() {
        items.push(ListItem::new(Line::from(Span::styled(
            format!("▸ {}", label),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ))));

        for q in questions {
            if question_index == app.cursor {
                selected_row = Some(items.len());
            }
            question_index += 1;

            let (badge, badge_color) = match app.session.latest_for(&q.id) {
                Some(entry) if entry.is_correct => ("✓", Color::Green),
                Some(_) => ("✗", Color::Red),
                None => ("○", Color::DarkGray),
            };

            items.push(ListItem::new(Line::from(vec![
                Span::styled(format!("  {} ", badge), Style::default().fg(badge_color)),
                Span::styled(
                    format!("{:<10}", q.id),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    truncate(&q.question_text, 60),
                    Style::default().fg(Color::White),
                ),
            ])));
        }
    }

    if items.is_empty() {
        items.push(ListItem::new(Line::from(Span::styled(
            "No questions match.",
            Style::default().fg(Color::DarkGray),
        ))));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(selected_row);

    f.render_stateful_widget(list, area, &mut state);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
