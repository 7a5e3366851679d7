use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::QuizError;
use crate::models::AttemptLogEntry;

/// Maximum number of persisted attempts. Oldest entries are dropped first
/// once the bound is exceeded.
pub const LOG_CAPACITY: usize = 4000;

/// The persistence collaborator: a flat string store under a single
/// well-known key. The store serializes and deserializes the log itself;
/// backends only move bytes.
pub trait LogBackend {
    fn read_raw(&self) -> io::Result<Option<String>>;
    fn write_raw(&mut self, payload: &str) -> io::Result<()>;
}

/// File-backed store, one JSON document per log.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LogBackend for FileBackend {
    fn read_raw(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_raw(&mut self, payload: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, payload)
    }
}

/// In-memory store for tests and for running without a data directory.
#[derive(Default)]
pub struct MemoryBackend {
    payload: Option<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(payload.into()),
        }
    }
}

impl LogBackend for MemoryBackend {
    fn read_raw(&self) -> io::Result<Option<String>> {
        Ok(self.payload.clone())
    }

    fn write_raw(&mut self, payload: &str) -> io::Result<()> {
        self.payload = Some(payload.to_string());
        Ok(())
    }
}

/// Durable, append-only attempt log with a capacity bound.
///
/// Reads degrade gracefully: a missing, unreadable, or corrupt payload opens
/// as an empty log, never as an error, so a damaged history can not block
/// quiz-taking. Writes are the one failure surfaced to callers.
pub struct ProgressLog {
    backend: Box<dyn LogBackend>,
    entries: Vec<AttemptLogEntry>,
    capacity: usize,
}

impl ProgressLog {
    pub fn open(backend: Box<dyn LogBackend>) -> Self {
        Self::with_capacity(backend, LOG_CAPACITY)
    }

    pub fn with_capacity(backend: Box<dyn LogBackend>, capacity: usize) -> Self {
        let mut entries = match backend.read_raw() {
            Ok(Some(payload)) => {
                serde_json::from_str::<Vec<AttemptLogEntry>>(&payload).unwrap_or_default()
            }
            Ok(None) | Err(_) => Vec::new(),
        };
        // A blob written under a larger historical bound is pruned on load.
        if entries.len() > capacity {
            let excess = entries.len() - capacity;
            entries.drain(..excess);
        }
        Self {
            backend,
            entries,
            capacity,
        }
    }

    /// Append one attempt and flush the whole collection. On write failure
    /// the entry stays in memory; the session keeps its result, only
    /// durability is lost.
    pub fn append(&mut self, entry: AttemptLogEntry) -> Result<(), QuizError> {
        self.entries.push(entry);
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
        let payload = serde_json::to_string(&self.entries)
            .map_err(|e| QuizError::PersistWrite(io::Error::new(io::ErrorKind::Other, e)))?;
        self.backend
            .write_raw(&payload)
            .map_err(QuizError::PersistWrite)
    }

    /// Entries in storage (append) order.
    pub fn all(&self) -> &[AttemptLogEntry] {
        &self.entries
    }

    /// Last-write-wins index: question id -> the entry with the greatest
    /// timestamp, later log-sequence order breaking ties. Recomputed from the
    /// log on demand so the two can not drift apart.
    pub fn latest_by_question(&self) -> HashMap<&str, &AttemptLogEntry> {
        let mut latest: HashMap<&str, &AttemptLogEntry> = HashMap::new();
        for entry in &self.entries {
            match latest.get(entry.question_id.as_str()) {
                Some(current) if current.timestamp > entry.timestamp => {}
                _ => {
                    latest.insert(&entry.question_id, entry);
                }
            }
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(question_id: &str, timestamp: i64, is_correct: bool) -> AttemptLogEntry {
        AttemptLogEntry {
            timestamp,
            question_id: question_id.to_string(),
            category: String::new(),
            selected_indices: vec![0],
            correct_indices: vec![0],
            is_correct,
        }
    }

    fn memory_log() -> ProgressLog {
        ProgressLog::open(Box::new(MemoryBackend::new()))
    }

    mod open_tests {
        use super::*;

        #[test]
        fn empty_backend_opens_empty() {
            let log = memory_log();
            assert!(log.all().is_empty());
        }

        #[test]
        fn corrupt_payload_opens_empty() {
            let backend = MemoryBackend::with_payload("{not valid json");
            let log = ProgressLog::open(Box::new(backend));
            assert!(log.all().is_empty());
        }

        #[test]
        fn wrong_shape_opens_empty() {
            let backend = MemoryBackend::with_payload(r#"{"entries": []}"#);
            let log = ProgressLog::open(Box::new(backend));
            assert!(log.all().is_empty());
        }

        #[test]
        fn read_error_opens_empty() {
            struct FailingBackend;
            impl LogBackend for FailingBackend {
                fn read_raw(&self) -> io::Result<Option<String>> {
                    Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
                }
                fn write_raw(&mut self, _payload: &str) -> io::Result<()> {
                    Ok(())
                }
            }
            let log = ProgressLog::open(Box::new(FailingBackend));
            assert!(log.all().is_empty());
        }

        #[test]
        fn round_trips_entries() {
            let mut source = memory_log();
            source.append(entry("q1", 100, true)).unwrap();
            source.append(entry("q2", 200, false)).unwrap();
            let payload = source.backend.read_raw().unwrap().unwrap();

            let reopened = ProgressLog::open(Box::new(MemoryBackend::with_payload(payload)));
            assert_eq!(reopened.all().len(), 2);
            assert_eq!(reopened.all()[0].question_id, "q1");
            assert_eq!(reopened.all()[1].question_id, "q2");
        }

        #[test]
        fn tolerates_unknown_fields_in_payload() {
            let payload = r#"[{"question_id":"q1","timestamp":5,"is_correct":true,"session_streak":9}]"#;
            let log = ProgressLog::open(Box::new(MemoryBackend::with_payload(payload)));
            assert_eq!(log.all().len(), 1);
            assert_eq!(log.all()[0].question_id, "q1");
        }

        #[test]
        fn oversized_payload_pruned_to_capacity() {
            let entries: Vec<AttemptLogEntry> =
                (0..10).map(|i| entry(&format!("q{}", i), i, false)).collect();
            let payload = serde_json::to_string(&entries).unwrap();
            let log = ProgressLog::with_capacity(
                Box::new(MemoryBackend::with_payload(payload)),
                4,
            );
            assert_eq!(log.all().len(), 4);
            assert_eq!(log.all()[0].question_id, "q6");
        }
    }

    mod append_tests {
        use super::*;

        #[test]
        fn append_preserves_order() {
            let mut log = memory_log();
            log.append(entry("a", 1, true)).unwrap();
            log.append(entry("b", 2, false)).unwrap();
            log.append(entry("c", 3, true)).unwrap();
            let ids: Vec<&str> = log.all().iter().map(|e| e.question_id.as_str()).collect();
            assert_eq!(ids, vec!["a", "b", "c"]);
        }

        #[test]
        fn capacity_drops_oldest() {
            let mut log = ProgressLog::with_capacity(Box::new(MemoryBackend::new()), 3);
            for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
                log.append(entry(id, i as i64, false)).unwrap();
            }
            let ids: Vec<&str> = log.all().iter().map(|e| e.question_id.as_str()).collect();
            assert_eq!(ids, vec!["b", "c", "d"]);
        }

        #[test]
        fn capacity_exact_keeps_all() {
            let mut log = ProgressLog::with_capacity(Box::new(MemoryBackend::new()), 3);
            for (i, id) in ["a", "b", "c"].iter().enumerate() {
                log.append(entry(id, i as i64, false)).unwrap();
            }
            assert_eq!(log.all().len(), 3);
        }

        #[test]
        fn write_failure_reports_but_keeps_entry() {
            struct ReadOnlyBackend;
            impl LogBackend for ReadOnlyBackend {
                fn read_raw(&self) -> io::Result<Option<String>> {
                    Ok(None)
                }
                fn write_raw(&mut self, _payload: &str) -> io::Result<()> {
                    Err(io::Error::new(io::ErrorKind::Other, "quota exceeded"))
                }
            }
            let mut log = ProgressLog::open(Box::new(ReadOnlyBackend));
            let result = log.append(entry("q1", 1, true));
            assert!(matches!(result, Err(QuizError::PersistWrite(_))));
            assert_eq!(log.all().len(), 1);
        }
    }

    mod latest_by_question_tests {
        use super::*;

        #[test]
        fn latest_timestamp_wins() {
            let mut log = memory_log();
            log.append(entry("q1", 100, false)).unwrap();
            log.append(entry("q1", 200, true)).unwrap();
            let latest = log.latest_by_question();
            let e = latest["q1"];
            assert_eq!(e.timestamp, 200);
            assert!(e.is_correct);
        }

        #[test]
        fn out_of_order_timestamps_resolved() {
            let mut log = memory_log();
            log.append(entry("q1", 200, true)).unwrap();
            log.append(entry("q1", 100, false)).unwrap();
            assert_eq!(log.latest_by_question()["q1"].timestamp, 200);
        }

        #[test]
        fn equal_timestamps_later_sequence_wins() {
            let mut log = memory_log();
            log.append(entry("q1", 100, false)).unwrap();
            log.append(entry("q1", 100, true)).unwrap();
            assert!(log.latest_by_question()["q1"].is_correct);
        }

        #[test]
        fn independent_questions_tracked_separately() {
            let mut log = memory_log();
            log.append(entry("q1", 1, true)).unwrap();
            log.append(entry("q2", 2, false)).unwrap();
            let latest = log.latest_by_question();
            assert_eq!(latest.len(), 2);
            assert!(latest["q1"].is_correct);
            assert!(!latest["q2"].is_correct);
        }

        #[test]
        fn empty_log_yields_empty_index() {
            assert!(memory_log().latest_by_question().is_empty());
        }
    }

    mod file_backend_tests {
        use super::*;

        fn temp_path(name: &str) -> PathBuf {
            std::env::temp_dir().join(format!("kakomon-test-{}-{}.json", name, std::process::id()))
        }

        #[test]
        fn missing_file_reads_none() {
            let backend = FileBackend::new(temp_path("missing"));
            assert!(backend.read_raw().unwrap().is_none());
        }

        #[test]
        fn write_then_read_round_trips() {
            let path = temp_path("roundtrip");
            let mut backend = FileBackend::new(&path);
            backend.write_raw("[1,2,3]").unwrap();
            assert_eq!(backend.read_raw().unwrap().unwrap(), "[1,2,3]");
            fs::remove_file(&path).ok();
        }

        #[test]
        fn survives_reopen() {
            let path = temp_path("reopen");
            {
                let mut log = ProgressLog::open(Box::new(FileBackend::new(&path)));
                log.append(entry("q1", 42, true)).unwrap();
            }
            let log = ProgressLog::open(Box::new(FileBackend::new(&path)));
            assert_eq!(log.all().len(), 1);
            assert_eq!(log.all()[0].question_id, "q1");
            fs::remove_file(&path).ok();
        }
    }
}
