use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One selectable answer. `overview` and `detail` are the two levels of
/// explanation text revealed by the disclosure toggle; `link` is an optional
/// reference URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// A multiple-choice question. Immutable once loaded; choice index is the
/// identity used everywhere else (0-based, position = meaning).
///
/// Field names follow the question-bank JSON: the statement is stored under
/// `question`, the exam citation under `source` (e.g. "令和5年春期 問12"),
/// and `category` is a free-form "parent / sub" string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "question")]
    pub question_text: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub source: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub correct_indices: Vec<usize>,
}

/// One persisted submission. Append-only, never mutated after creation.
/// `category` and `correct_indices` are snapshotted at attempt time so the
/// history stays meaningful even if the question later changes or disappears
/// from the active set. Every field defaults so blobs written by prior format
/// revisions still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptLogEntry {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub question_id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub selected_indices: Vec<usize>,
    #[serde(default)]
    pub correct_indices: Vec<usize>,
    #[serde(default)]
    pub is_correct: bool,
}

impl AttemptLogEntry {
    pub fn record(question: &Question, evaluation: &Evaluation) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            question_id: question.id.clone(),
            category: question.category.clone(),
            selected_indices: evaluation.selected.clone(),
            correct_indices: evaluation.correct.clone(),
            is_correct: evaluation.is_correct,
        }
    }
}

/// Result of grading one selection against one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub selected: Vec<usize>,
    pub correct: Vec<usize>,
    pub is_correct: bool,
}

/// Deduplicate and ascending-sort an index set.
pub fn uniq_sorted(indices: &[usize]) -> Vec<usize> {
    let set: std::collections::BTreeSet<usize> = indices.iter().copied().collect();
    set.into_iter().collect()
}

/// Grade `selected` against the question's correct set. Order- and
/// duplicate-independent: both sides are normalized to sorted unique sets and
/// compared element-wise. A question with an empty correct set always grades
/// incorrect; there is no vacuously-correct question.
pub fn evaluate(question: &Question, selected: &[usize]) -> Evaluation {
    let selected = uniq_sorted(selected);
    let correct = uniq_sorted(&question.correct_indices);
    let is_correct = !correct.is_empty() && selected == correct;
    Evaluation {
        selected,
        correct,
        is_correct,
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
pub(crate) fn make_question(id: &str, correct: &[usize]) -> Question {
    Question {
        id: id.to_string(),
        question_text: format!("Question {}", id),
        category: String::new(),
        source: String::new(),
        choices: (0..4)
            .map(|i| Choice {
                text: format!("choice {}", i),
                overview: format!("overview {}", i),
                detail: format!("detail {}", i),
                link: None,
            })
            .collect(),
        correct_indices: correct.to_vec(),
    }
}
