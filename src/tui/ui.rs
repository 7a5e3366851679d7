use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::widgets::{dashboard, listing, quiz};
use super::App;
use crate::session::NavState;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_content(f, app, chunks[0]);
    draw_help_bar(f, app, chunks[1]);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.session.nav_state() {
        NavState::List => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
                .split(area);
            listing::draw(f, app, columns[0]);
            dashboard::draw(f, app, columns[1]);
        }
        NavState::Quiz(id) => quiz::draw(f, app, id, area),
    }
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.filter_mode {
        vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(&app.filter_input),
            Span::styled("█", Style::default().fg(Color::Yellow)),
            Span::raw(" | "),
            Span::styled("<CR>", Style::default().fg(Color::Cyan)),
            Span::raw(" Apply  "),
            Span::styled("<Esc>", Style::default().fg(Color::Cyan)),
            Span::raw(" Cancel"),
        ]
    } else if let Some(status) = &app.status {
        vec![Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        )]
    } else {
        let mut spans = Vec::new();
        match app.session.nav_state() {
            NavState::List => {
                spans.extend(vec![
                    Span::styled("j/k", Style::default().fg(Color::Cyan)),
                    Span::raw(" Nav  "),
                    Span::styled("g/G", Style::default().fg(Color::Cyan)),
                    Span::raw(" Top/Bot  "),
                    Span::styled("l/<CR>", Style::default().fg(Color::Cyan)),
                    Span::raw(" Open  "),
                    Span::styled("/", Style::default().fg(Color::Cyan)),
                    Span::raw(" Search  "),
                    Span::styled("u", Style::default().fg(Color::Cyan)),
                    Span::raw(" Unanswered  "),
                    Span::styled("i", Style::default().fg(Color::Cyan)),
                    Span::raw(" Incorrect  "),
                    Span::styled("m", Style::default().fg(Color::Cyan)),
                    Span::raw(" Grouping  "),
                ]);
            }
            NavState::Quiz(_) => {
                spans.extend(vec![
                    Span::styled("j/k", Style::default().fg(Color::Cyan)),
                    Span::raw(" Nav  "),
                    Span::styled("<Space>", Style::default().fg(Color::Cyan)),
                    Span::raw(" Select  "),
                    Span::styled("s/<CR>", Style::default().fg(Color::Cyan)),
                    Span::raw(" Submit  "),
                    Span::styled("o", Style::default().fg(Color::Cyan)),
                    Span::raw(" Explain  "),
                    Span::styled("n/p", Style::default().fg(Color::Cyan)),
                    Span::raw(" Next/Prev  "),
                    Span::styled("h/<Esc>", Style::default().fg(Color::Cyan)),
                    Span::raw(" Back  "),
                ]);
            }
        }
        spans.extend(vec![
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::raw(" Quit"),
        ]);
        spans
    };

    let help = Paragraph::new(Line::from(help_text)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
