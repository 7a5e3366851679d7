use std::collections::BTreeSet;

use crate::dashboard::{self, BreakdownSort, DashboardSnapshot, Granularity};
use crate::error::QuizError;
use crate::filter::{self, FilterCriteria, GroupMode};
use crate::models::{evaluate, AttemptLogEntry, Evaluation, Question};
use crate::store::ProgressLog;
use crate::taxonomy;

/// The two navigation states. A `Quiz` whose id does not resolve stays in
/// `Quiz` as an error-display sub-state (the engine reports no current
/// question) instead of silently falling back to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    List,
    Quiz(String),
}

/// Location mirrored to the routing collaborator (browser history or
/// equivalent). Transitions push routes one-directionally; external
/// back/forward events come back in through `handle_route`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    List,
    Quiz(String),
}

pub trait RouteSink {
    fn push(&mut self, route: Route);
}

/// Sink for shells with no routing transport (the TUI, the CLI).
pub struct NullSink;

impl RouteSink for NullSink {
    fn push(&mut self, _route: Route) {}
}

/// Per-choice visibility of the explanation text: a cyclic three-step
/// toggle, nothing -> overview -> overview+detail -> nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disclosure {
    #[default]
    Collapsed,
    OverviewShown,
    DetailShown,
}

impl Disclosure {
    fn advance(self) -> Self {
        match self {
            Disclosure::Collapsed => Disclosure::OverviewShown,
            Disclosure::OverviewShown => Disclosure::DetailShown,
            Disclosure::DetailShown => Disclosure::Collapsed,
        }
    }
}

/// Transient per-visit state for one question. Recreated on every entry into
/// `Quiz(id)`, so prior attempts never block a fresh submission.
struct QuizInstance {
    index: usize,
    selected: BTreeSet<usize>,
    disclosure: Vec<Disclosure>,
    result: Option<Evaluation>,
}

impl QuizInstance {
    fn new(index: usize, choice_count: usize) -> Self {
        Self {
            index,
            selected: BTreeSet::new(),
            disclosure: vec![Disclosure::Collapsed; choice_count],
            result: None,
        }
    }
}

/// What a submission produced. A persistence failure is reported alongside
/// the evaluation rather than instead of it: the learner still sees their
/// result even when durable storage failed.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub evaluation: Evaluation,
    pub persist_error: Option<QuizError>,
}

/// Session state owning the question set, the attempt log, the filter
/// criteria, and the navigation machine. The presentation layer only renders
/// accessors and forwards user intents to the operations below; no other
/// mutation path exists.
pub struct Session {
    questions: Vec<Question>,
    log: ProgressLog,
    criteria: FilterCriteria,
    nav: NavState,
    instance: Option<QuizInstance>,
    lock_feedback_open: bool,
    sink: Box<dyn RouteSink>,
}

impl Session {
    pub fn new(questions: Vec<Question>, log: ProgressLog) -> Self {
        Self::with_sink(questions, log, Box::new(NullSink))
    }

    pub fn with_sink(
        questions: Vec<Question>,
        log: ProgressLog,
        sink: Box<dyn RouteSink>,
    ) -> Self {
        Self {
            questions,
            log,
            criteria: FilterCriteria::default(),
            nav: NavState::List,
            instance: None,
            lock_feedback_open: false,
            sink,
        }
    }

    /// When set, explanations can no longer be collapsed below overview once
    /// an answer has been submitted.
    pub fn set_lock_feedback_open(&mut self, lock: bool) {
        self.lock_feedback_open = lock;
    }

    // --- Read accessors ---

    pub fn nav_state(&self) -> &NavState {
        &self.nav
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn log(&self) -> &ProgressLog {
        &self.log
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// The question on screen, if the current quiz id resolves.
    pub fn current_question(&self) -> Option<&Question> {
        self.instance.as_ref().map(|i| &self.questions[i.index])
    }

    pub fn visible_questions(&self) -> Vec<&Question> {
        filter::filter(&self.questions, &self.log, &self.criteria)
    }

    /// The visible questions grouped for display along the criteria's
    /// grouping axis: (group label, questions) in group order.
    pub fn grouped_listing(&self) -> Vec<(String, Vec<&Question>)> {
        let visible = self.visible_questions();
        match self.criteria.group_mode {
            GroupMode::ParentSub => taxonomy::group_by_parent_then_sub(visible)
                .into_iter()
                .flat_map(|(parent, subs)| {
                    subs.into_iter()
                        .map(move |(sub, qs)| (format!("{} / {}", parent, sub), qs))
                })
                .collect(),
            GroupMode::ParentOnly => taxonomy::group_by_parent(visible).into_iter().collect(),
            GroupMode::Session => taxonomy::group_by_session(visible).into_iter().collect(),
        }
    }

    pub fn dashboard(&self, granularity: Granularity, sort: BreakdownSort) -> DashboardSnapshot {
        dashboard::summarize(&self.questions, &self.log, granularity, sort)
    }

    /// Latest persisted attempt for a question, for badges and banners.
    pub fn latest_for(&self, id: &str) -> Option<&AttemptLogEntry> {
        self.log.latest_by_question().get(id).copied()
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.instance
            .as_ref()
            .map(|i| i.selected.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn disclosure(&self, choice_index: usize) -> Disclosure {
        self.instance
            .as_ref()
            .and_then(|i| i.disclosure.get(choice_index).copied())
            .unwrap_or_default()
    }

    pub fn result(&self) -> Option<&Evaluation> {
        self.instance.as_ref().and_then(|i| i.result.as_ref())
    }

    pub fn is_submitted(&self) -> bool {
        self.result().is_some()
    }

    pub fn can_prev(&self) -> bool {
        matches!(&self.instance, Some(i) if i.index > 0)
    }

    pub fn can_next(&self) -> bool {
        matches!(&self.instance, Some(i) if i.index + 1 < self.questions.len())
    }

    // --- Operations ---

    /// Enter `Quiz(id)`. An id outside the active set still transitions; the
    /// view renders its not-found sub-state and `go_back` stays available.
    pub fn select_question(&mut self, id: &str) {
        self.instance = self.instance_for(id);
        self.nav = NavState::Quiz(id.to_string());
        self.sink.push(Route::Quiz(id.to_string()));
    }

    /// Return to the list, dropping all per-question transient state.
    pub fn go_back(&mut self) {
        self.instance = None;
        self.nav = NavState::List;
        self.sink.push(Route::List);
    }

    /// Move to the adjacent question in the active ordering; no-op at the
    /// ends or in the not-found sub-state.
    pub fn go_next(&mut self) {
        self.step(1);
    }

    pub fn go_prev(&mut self) {
        self.step(-1);
    }

    /// Apply a partial update to the filter criteria.
    pub fn update_criteria(&mut self, apply: impl FnOnce(&mut FilterCriteria)) {
        apply(&mut self.criteria);
    }

    /// Toggle one choice in the working selection. Rejected after
    /// submission: inputs are immutable for the rest of this instance.
    pub fn toggle_choice_selection(&mut self, choice_index: usize) -> Result<(), QuizError> {
        let instance = self.instance.as_mut().ok_or(QuizError::NoActiveQuestion)?;
        if instance.result.is_some() {
            return Err(QuizError::AlreadySubmitted);
        }
        if choice_index >= instance.disclosure.len() {
            return Ok(());
        }
        if !instance.selected.remove(&choice_index) {
            instance.selected.insert(choice_index);
        }
        Ok(())
    }

    /// Grade the working selection and persist the attempt. Gated: exactly
    /// one submission is accepted per question instance. Submission
    /// force-opens every choice's overview.
    pub fn submit_answer(&mut self) -> Result<SubmitOutcome, QuizError> {
        let instance = self.instance.as_mut().ok_or(QuizError::NoActiveQuestion)?;
        if instance.result.is_some() {
            return Err(QuizError::AlreadySubmitted);
        }
        if instance.selected.is_empty() {
            return Err(QuizError::EmptySelection);
        }

        let question = &self.questions[instance.index];
        let selected: Vec<usize> = instance.selected.iter().copied().collect();
        let evaluation = evaluate(question, &selected);
        let entry = AttemptLogEntry::record(question, &evaluation);

        instance.result = Some(evaluation.clone());
        for d in &mut instance.disclosure {
            if *d == Disclosure::Collapsed {
                *d = Disclosure::OverviewShown;
            }
        }

        let persist_error = self.log.append(entry).err();
        Ok(SubmitOutcome {
            evaluation,
            persist_error,
        })
    }

    /// Advance one choice's explanation through the disclosure cycle. With
    /// the lock policy active, a submitted question can not collapse below
    /// overview.
    pub fn toggle_disclosure(&mut self, choice_index: usize) -> Result<(), QuizError> {
        let lock = self.lock_feedback_open;
        let instance = self.instance.as_mut().ok_or(QuizError::NoActiveQuestion)?;
        let Some(d) = instance.disclosure.get_mut(choice_index) else {
            return Ok(());
        };
        let mut next = d.advance();
        if lock && instance.result.is_some() && next == Disclosure::Collapsed {
            next = Disclosure::OverviewShown;
        }
        *d = next;
        Ok(())
    }

    /// Re-derive state from an externally triggered location change
    /// (back/forward). Does not re-emit to the sink, so external events can
    /// not echo into a feedback loop.
    pub fn handle_route(&mut self, route: Route) {
        match route {
            Route::List => {
                self.instance = None;
                self.nav = NavState::List;
            }
            Route::Quiz(id) => {
                self.instance = self.instance_for(&id);
                self.nav = NavState::Quiz(id);
            }
        }
    }

    fn instance_for(&self, id: &str) -> Option<QuizInstance> {
        self.questions
            .iter()
            .position(|q| q.id == id)
            .map(|index| QuizInstance::new(index, self.questions[index].choices.len()))
    }

    fn step(&mut self, delta: isize) {
        let Some(instance) = &self.instance else {
            return;
        };
        let next = instance.index as isize + delta;
        if next < 0 || next as usize >= self.questions.len() {
            return;
        }
        let id = self.questions[next as usize].id.clone();
        self.select_question(&id);
    }
}
