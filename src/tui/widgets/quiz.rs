use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::session::Disclosure;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, id: &str, area: Rect) {
    let Some(question) = app.session.current_question() else {
        draw_not_found(f, id, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Question text
            Constraint::Min(0),    // Choices
        ])
        .split(area);

    let mut header_lines = vec![Line::from(vec![
        Span::styled(&*question.category, Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled(&*question.source, Style::default().fg(Color::DarkGray)),
    ])];
    header_lines.push(Line::raw(""));
    header_lines.push(Line::from(Span::styled(
        &*question.question_text,
        Style::default().fg(Color::White),
    )));

    let header = Paragraph::new(header_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Question {} ", question.id))
                .title_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(header, chunks[0]);

    draw_choices(f, app, chunks[1]);
}

fn draw_choices(f: &mut Frame, app: &App, area: Rect) {
    let question = match app.session.current_question() {
        Some(q) => q,
        None => return,
    };
    let submitted = app.session.is_submitted();
    let selected = app.session.selected_indices();

    let mut lines: Vec<Line> = Vec::new();
    for (i, choice) in question.choices.iter().enumerate() {
        let cursor = if i == app.choice_cursor { ">" } else { " " };
        let mark = if selected.contains(&i) { "[x]" } else { "[ ]" };

        // Before submission every choice is neutral; afterwards the correct
        // set is green and wrongly selected choices are red.
        let style = if !submitted {
            Style::default().fg(Color::White)
        } else if question.correct_indices.contains(&i) {
            Style::default().fg(Color::Green)
        } else if selected.contains(&i) {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::White)
        };

        lines.push(Line::from(vec![
            Span::styled(
                format!("{} {} ", cursor, mark),
                if i == app.choice_cursor {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                },
            ),
            Span::styled(format!("[{}] {}", i, choice.text), style),
        ]));

        let disclosure = app.session.disclosure(i);
        if disclosure != Disclosure::Collapsed && !choice.overview.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("        {}", choice.overview),
                Style::default().fg(Color::Gray),
            )));
        }
        if disclosure == Disclosure::DetailShown {
            if !choice.detail.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("        {}", choice.detail),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            if let Some(link) = &choice.link {
                lines.push(Line::from(Span::styled(
                    format!("        → {}", link),
                    Style::default().fg(Color::Blue),
                )));
            }
        }
    }

    let title = match app.session.result() {
        Some(result) if result.is_correct => " Choices — Correct! ".to_string(),
        Some(_) => " Choices — Incorrect ".to_string(),
        None => " Choices ".to_string(),
    };
    let title_color = match app.session.result() {
        Some(result) if result.is_correct => Color::Green,
        Some(_) => Color::Red,
        None => Color::Cyan,
    };

    let choices = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_style(Style::default().fg(title_color)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(choices, area);
}

fn draw_not_found(f: &mut Frame, id: &str, area: Rect) {
    let lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            format!("Question '{}' was not found.", id),
            Style::default().fg(Color::Red),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            "It may have been removed from the question bank.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Press h or Esc to return to the list.",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Question ")
            .title_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(paragraph, area);
}
