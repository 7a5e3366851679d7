use crate::models::Question;
use crate::store::ProgressLog;
use crate::taxonomy::{category_path, session_label};

/// Which grouping axis the listing is on. Session grouping is mutually
/// exclusive with the category axes: its criteria ignore parent/sub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupMode {
    #[default]
    ParentSub,
    ParentOnly,
    Session,
}

#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub search_text: String,
    pub parent: Option<String>,
    pub sub: Option<String>,
    pub session: Option<String>,
    pub only_unanswered: bool,
    pub only_incorrect: bool,
    pub group_mode: GroupMode,
}

/// Select the visible subset of `questions`. All criteria are combined as a
/// conjunction. Filtering never reorders: the result keeps the original
/// question-set order; grouping for display is a separate step.
pub fn filter<'a>(
    questions: &'a [Question],
    log: &ProgressLog,
    criteria: &FilterCriteria,
) -> Vec<&'a Question> {
    let latest = log.latest_by_question();
    let needle = criteria.search_text.trim().to_lowercase();

    questions
        .iter()
        .filter(|q| {
            match criteria.group_mode {
                GroupMode::Session => {
                    if let Some(session) = &criteria.session {
                        if session_label(&q.source) != *session {
                            return false;
                        }
                    }
                }
                GroupMode::ParentOnly | GroupMode::ParentSub => {
                    let path = category_path(&q.category);
                    if let Some(parent) = &criteria.parent {
                        if path.parent != *parent {
                            return false;
                        }
                    }
                    if criteria.group_mode == GroupMode::ParentSub {
                        if let Some(sub) = &criteria.sub {
                            if path.sub != *sub {
                                return false;
                            }
                        }
                    }
                }
            }

            if !needle.is_empty() {
                let haystack =
                    format!("{}{}{}", q.id, q.question_text, q.source).to_lowercase();
                if !haystack.contains(&needle) {
                    return false;
                }
            }

            let latest_entry = latest.get(q.id.as_str());
            if criteria.only_unanswered && latest_entry.is_some() {
                return false;
            }
            if criteria.only_incorrect {
                // Only answered-and-wrong passes.
                match latest_entry {
                    Some(entry) if !entry.is_correct => {}
                    _ => return false,
                }
            }
            true
        })
        .collect()
}
