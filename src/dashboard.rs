use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{AttemptLogEntry, Question};
use crate::store::ProgressLog;
use crate::taxonomy::category_path;

/// How many log entries the snapshot carries as "recent activity".
pub const RECENT_ATTEMPTS: usize = 10;

/// Category axis for the per-category breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    #[default]
    Parent,
    ParentSub,
}

/// Row ordering for the per-category breakdown. Rate-descending is the
/// canonical leaderboard presentation; name-ascending is the structural one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakdownSort {
    #[default]
    RateDesc,
    NameAsc,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub answered: usize,
    pub correct: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub total_questions: usize,
    pub answered_count: usize,
    /// Correct share among per-question latest results. None (not zero) when
    /// nothing has been answered.
    pub latest_accuracy: Option<f64>,
    /// Correct share over every attempt in the log, not deduplicated by
    /// question. None when the log is empty.
    pub all_attempts_accuracy: Option<f64>,
    pub per_category: Vec<CategoryStats>,
    /// Most-recent-first.
    pub recent: Vec<AttemptLogEntry>,
}

/// Derive summary statistics from the question set and the attempt log.
/// Pure given its inputs; performs no writes.
pub fn summarize(
    questions: &[Question],
    log: &ProgressLog,
    granularity: Granularity,
    sort: BreakdownSort,
) -> DashboardSnapshot {
    let latest = log.latest_by_question();

    let answered_count = latest.len();
    let correct_latest = latest.values().filter(|e| e.is_correct).count();
    let latest_accuracy = if answered_count == 0 {
        None
    } else {
        Some(correct_latest as f64 / answered_count as f64)
    };

    let total_attempts = log.all().len();
    let correct_attempts = log.all().iter().filter(|e| e.is_correct).count();
    let all_attempts_accuracy = if total_attempts == 0 {
        None
    } else {
        Some(correct_attempts as f64 / total_attempts as f64)
    };

    let mut buckets: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for q in questions {
        let path = category_path(&q.category);
        let key = match granularity {
            Granularity::Parent => path.parent,
            Granularity::ParentSub => format!("{} / {}", path.parent, path.sub),
        };
        if let Some(entry) = latest.get(q.id.as_str()) {
            let bucket = buckets.entry(key).or_insert((0, 0));
            bucket.0 += 1;
            if entry.is_correct {
                bucket.1 += 1;
            }
        }
    }
    let mut per_category: Vec<CategoryStats> = buckets
        .into_iter()
        .map(|(category, (answered, correct))| CategoryStats {
            category,
            answered,
            correct,
            rate: correct as f64 / answered as f64,
        })
        .collect();
    if sort == BreakdownSort::RateDesc {
        per_category.sort_by(|a, b| {
            b.rate
                .partial_cmp(&a.rate)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.category.cmp(&b.category))
        });
    }

    let recent: Vec<AttemptLogEntry> = log
        .all()
        .iter()
        .rev()
        .take(RECENT_ATTEMPTS)
        .cloned()
        .collect();

    DashboardSnapshot {
        total_questions: questions.len(),
        answered_count,
        latest_accuracy,
        all_attempts_accuracy,
        per_category,
        recent,
    }
}
