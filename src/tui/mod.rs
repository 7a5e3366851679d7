mod ui;
mod widgets;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::error::QuizError;
use crate::filter::GroupMode;
use crate::models::Question;
use crate::session::{NavState, Session};
use crate::store::ProgressLog;

pub struct App {
    pub session: Session,
    /// Cursor over the visible questions, in listing order.
    pub cursor: usize,
    /// Cursor over the current question's choices.
    pub choice_cursor: usize,
    pub filter_input: String,
    pub filter_mode: bool,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            cursor: 0,
            choice_cursor: 0,
            filter_input: String::new(),
            filter_mode: false,
            status: None,
            should_quit: false,
        }
    }

    /// Visible question ids in the order the listing renders them (group
    /// order, then id order within each group).
    pub fn listing_ids(&self) -> Vec<String> {
        self.session
            .grouped_listing()
            .iter()
            .flat_map(|(_, qs)| qs.iter().map(|q| q.id.clone()))
            .collect()
    }

    fn clamp_cursor(&mut self) {
        let len = self.listing_ids().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    fn list_next(&mut self) {
        let len = self.listing_ids().len();
        if len == 0 {
            return;
        }
        self.cursor = if self.cursor + 1 >= len {
            0
        } else {
            self.cursor + 1
        };
    }

    fn list_previous(&mut self) {
        let len = self.listing_ids().len();
        if len == 0 {
            return;
        }
        self.cursor = if self.cursor == 0 {
            len - 1
        } else {
            self.cursor - 1
        };
    }

    fn open_cursor_question(&mut self) {
        if let Some(id) = self.listing_ids().get(self.cursor).cloned() {
            self.session.select_question(&id);
            self.choice_cursor = 0;
            self.status = None;
        }
    }

    fn choice_count(&self) -> usize {
        self.session
            .current_question()
            .map(|q| q.choices.len())
            .unwrap_or(0)
    }

    fn choice_next(&mut self) {
        let len = self.choice_count();
        if len == 0 {
            return;
        }
        self.choice_cursor = if self.choice_cursor + 1 >= len {
            0
        } else {
            self.choice_cursor + 1
        };
    }

    fn choice_previous(&mut self) {
        let len = self.choice_count();
        if len == 0 {
            return;
        }
        self.choice_cursor = if self.choice_cursor == 0 {
            len - 1
        } else {
            self.choice_cursor - 1
        };
    }

    fn apply_filter(&mut self) {
        let text = self.filter_input.clone();
        self.session.update_criteria(|c| c.search_text = text);
        self.clamp_cursor();
    }

    fn cycle_group_mode(&mut self) {
        self.session.update_criteria(|c| {
            c.group_mode = match c.group_mode {
                GroupMode::ParentSub => GroupMode::ParentOnly,
                GroupMode::ParentOnly => GroupMode::Session,
                GroupMode::Session => GroupMode::ParentSub,
            };
        });
        self.clamp_cursor();
    }

    fn submit(&mut self) {
        match self.session.submit_answer() {
            Ok(outcome) => {
                self.status = Some(if outcome.evaluation.is_correct {
                    "Correct!".to_string()
                } else {
                    "Incorrect.".to_string()
                });
                if let Some(e) = outcome.persist_error {
                    self.status = Some(format!("Attempt was not saved: {}", e));
                }
            }
            Err(QuizError::EmptySelection) => {
                self.status = Some("Select at least one choice first".to_string());
            }
            Err(QuizError::AlreadySubmitted) => {
                self.status = Some("Already answered; n/p for the next question".to_string());
            }
            Err(e) => {
                self.status = Some(e.to_string());
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        // Filter input captures everything while active (vim-like / search).
        if self.filter_mode {
            match key {
                KeyCode::Esc => {
                    self.filter_mode = false;
                    self.filter_input.clear();
                }
                KeyCode::Enter => {
                    self.filter_mode = false;
                    self.apply_filter();
                }
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                KeyCode::Char(c) => {
                    self.filter_input.push(c);
                }
                _ => {}
            }
            return;
        }

        if key == KeyCode::Char('q') {
            self.should_quit = true;
            return;
        }

        match self.session.nav_state().clone() {
            NavState::List => match key {
                KeyCode::Char('j') | KeyCode::Down => self.list_next(),
                KeyCode::Char('k') | KeyCode::Up => self.list_previous(),
                KeyCode::Char('g') => self.cursor = 0,
                KeyCode::Char('G') => {
                    let len = self.listing_ids().len();
                    self.cursor = len.saturating_sub(1);
                }
                KeyCode::Char('l') | KeyCode::Right | KeyCode::Enter => {
                    self.open_cursor_question()
                }
                KeyCode::Char('/') => {
                    self.filter_mode = true;
                    self.filter_input.clear();
                }
                KeyCode::Char('u') => {
                    self.session
                        .update_criteria(|c| c.only_unanswered = !c.only_unanswered);
                    self.clamp_cursor();
                }
                KeyCode::Char('i') => {
                    self.session
                        .update_criteria(|c| c.only_incorrect = !c.only_incorrect);
                    self.clamp_cursor();
                }
                KeyCode::Char('m') => self.cycle_group_mode(),
                KeyCode::Esc => {
                    self.filter_input.clear();
                    self.session.update_criteria(|c| {
                        c.search_text.clear();
                        c.only_unanswered = false;
                        c.only_incorrect = false;
                    });
                    self.clamp_cursor();
                }
                _ => {}
            },
            NavState::Quiz(_) => match key {
                KeyCode::Char('j') | KeyCode::Down => self.choice_next(),
                KeyCode::Char('k') | KeyCode::Up => self.choice_previous(),
                KeyCode::Char(' ') => {
                    match self.session.toggle_choice_selection(self.choice_cursor) {
                        Ok(()) => self.status = None,
                        Err(QuizError::AlreadySubmitted) => {
                            self.status = Some("Already answered".to_string());
                        }
                        Err(_) => {}
                    }
                }
                KeyCode::Char('s') | KeyCode::Enter => self.submit(),
                KeyCode::Char('o') => {
                    let _ = self.session.toggle_disclosure(self.choice_cursor);
                }
                KeyCode::Char('n') | KeyCode::Char(']') => {
                    self.session.go_next();
                    self.choice_cursor = 0;
                    self.status = None;
                }
                KeyCode::Char('p') | KeyCode::Char('[') => {
                    self.session.go_prev();
                    self.choice_cursor = 0;
                    self.status = None;
                }
                KeyCode::Char('h') | KeyCode::Left | KeyCode::Esc => {
                    self.session.go_back();
                    self.status = None;
                    self.clamp_cursor();
                }
                _ => {}
            },
        }
    }
}

pub fn run(questions: Vec<Question>, log: ProgressLog) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(Session::new(questions, log));

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
