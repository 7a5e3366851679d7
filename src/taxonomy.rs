use std::collections::{BTreeMap, BTreeSet};

use crate::models::Question;

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const UNKNOWN_SOURCE: &str = "Unknown source";

/// The question-number marker in exam citations, e.g. "令和5年春期 問12".
/// Everything before the first marker is the session label.
const QUESTION_MARKER: char = '問';

/// Two-level taxonomy derived from a free-form category string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPath {
    pub parent: String,
    pub sub: String,
}

/// Split a category string into parent/sub. Total: malformed input (empty,
/// single-segment, extra slashes, stray whitespace) degrades to the
/// "Uncategorized" bucket rather than erroring, because the rest of the UI
/// depends on every question landing in exactly one group.
pub fn category_path(category: &str) -> CategoryPath {
    let mut segments = category
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let parent = segments.next().unwrap_or(UNCATEGORIZED).to_string();
    let sub = segments.next().unwrap_or(UNCATEGORIZED).to_string();
    CategoryPath { parent, sub }
}

/// Extract the exam-session label from a source citation: the substring
/// before the first question marker, trimmed. A source without the marker is
/// used whole; an empty source maps to "Unknown source".
pub fn session_label(source: &str) -> String {
    let label = match source.find(QUESTION_MARKER) {
        Some(pos) => source[..pos].trim(),
        None => source.trim(),
    };
    if label.is_empty() {
        UNKNOWN_SOURCE.to_string()
    } else {
        label.to_string()
    }
}

/// Distinct parent categories, sorted (code-point order).
pub fn distinct_parents<'a>(questions: impl IntoIterator<Item = &'a Question>) -> Vec<String> {
    let set: BTreeSet<String> = questions
        .into_iter()
        .map(|q| category_path(&q.category).parent)
        .collect();
    set.into_iter().collect()
}

/// Distinct sub-categories under one parent, sorted.
pub fn distinct_subs<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
    parent: &str,
) -> Vec<String> {
    let set: BTreeSet<String> = questions
        .into_iter()
        .map(|q| category_path(&q.category))
        .filter(|path| path.parent == parent)
        .map(|path| path.sub)
        .collect();
    set.into_iter().collect()
}

/// Group questions parent -> sub -> questions, each list stably sorted by id.
pub fn group_by_parent_then_sub<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
) -> BTreeMap<String, BTreeMap<String, Vec<&'a Question>>> {
    let mut groups: BTreeMap<String, BTreeMap<String, Vec<&Question>>> = BTreeMap::new();
    for q in questions {
        let path = category_path(&q.category);
        groups
            .entry(path.parent)
            .or_default()
            .entry(path.sub)
            .or_default()
            .push(q);
    }
    for subs in groups.values_mut() {
        for list in subs.values_mut() {
            list.sort_by(|a, b| a.id.cmp(&b.id));
        }
    }
    groups
}

/// Group questions by parent category only, each list stably sorted by id.
pub fn group_by_parent<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
) -> BTreeMap<String, Vec<&'a Question>> {
    let mut groups: BTreeMap<String, Vec<&Question>> = BTreeMap::new();
    for q in questions {
        groups
            .entry(category_path(&q.category).parent)
            .or_default()
            .push(q);
    }
    for list in groups.values_mut() {
        list.sort_by(|a, b| a.id.cmp(&b.id));
    }
    groups
}

/// Group questions by exam-session label, each list stably sorted by id.
pub fn group_by_session<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
) -> BTreeMap<String, Vec<&'a Question>> {
    let mut groups: BTreeMap<String, Vec<&Question>> = BTreeMap::new();
    for q in questions {
        groups
            .entry(session_label(&q.source))
            .or_default()
            .push(q);
    }
    for list in groups.values_mut() {
        list.sort_by(|a, b| a.id.cmp(&b.id));
    }
    groups
}
