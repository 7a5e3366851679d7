use chrono::DateTime;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::dashboard::{BreakdownSort, DashboardSnapshot, Granularity};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let snapshot = app
        .session
        .dashboard(Granularity::Parent, BreakdownSort::RateDesc);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Stats
            Constraint::Min(0),    // Category breakdown
            Constraint::Length(8), // Recent attempts
        ])
        .split(area);

    draw_stats(f, &snapshot, chunks[0]);
    draw_categories(f, &snapshot, chunks[1]);
    draw_recent(f, &snapshot, chunks[2]);
}

fn draw_stats(f: &mut Frame, snapshot: &DashboardSnapshot, area: Rect) {
    let text = vec![
        Line::from(vec![
            Span::styled("Questions: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", snapshot.total_questions),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Answered: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", snapshot.answered_count),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Accuracy (latest): ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_rate(snapshot.latest_accuracy),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![
            Span::styled("Accuracy (all): ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_rate(snapshot.all_attempts_accuracy),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_categories(f: &mut Frame, snapshot: &DashboardSnapshot, area: Rect) {
    let items: Vec<ListItem> = snapshot
        .per_category
        .iter()
        .map(|row| {
            let rate_color = if row.rate >= 0.8 {
                Color::Green
            } else if row.rate >= 0.5 {
                Color::Yellow
            } else {
                Color::Red
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<20}", truncate(&row.category, 18)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:>3}/{:<3}", row.correct, row.answered),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!(" {:>4.0}%", row.rate * 100.0),
                    Style::default().fg(rate_color),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" By Category ")
        .title_style(Style::default().fg(Color::Yellow));

    f.render_widget(List::new(items).block(block), area);
}

fn draw_recent(f: &mut Frame, snapshot: &DashboardSnapshot, area: Rect) {
    let items: Vec<ListItem> = snapshot
        .recent
        .iter()
        .map(|entry| {
            let (mark, color) = if entry.is_correct {
                ("✓", Color::Green)
            } else {
                ("✗", Color::Red)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", mark), Style::default().fg(color)),
                Span::styled(
                    format!("{:<10}", entry.question_id),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format_timestamp(entry.timestamp),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Recent Attempts ")
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(List::new(items).block(block), area);
}

fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.0}%", r * 100.0),
        None => "-".to_string(),
    }
}

fn format_timestamp(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(dt) => dt.format("%b %d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
