use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::QuizError;
use crate::models::{uniq_sorted, Question};

/// Questions with fewer choices than this are rejected at load time.
pub const MIN_CHOICES: usize = 2;

/// Validate and normalize raw question records. Keeps original order.
///
/// Individually malformed records (missing id, missing question text, a
/// non-sequence `choices` field, too few choices) are dropped and counted,
/// never raised: partial failure is tolerated so one bad record can not take
/// down the whole bank. `correct_indices` are normalized to a sorted unique
/// set with out-of-range indices discarded.
pub fn normalize(raw: Vec<Value>) -> (Vec<Question>, usize) {
    let mut questions = Vec::new();
    let mut rejected = 0usize;

    for value in raw {
        match serde_json::from_value::<Question>(value) {
            Ok(mut q)
                if !q.id.trim().is_empty()
                    && !q.question_text.trim().is_empty()
                    && q.choices.len() >= MIN_CHOICES =>
            {
                let valid: Vec<usize> = q
                    .correct_indices
                    .iter()
                    .copied()
                    .filter(|&i| i < q.choices.len())
                    .collect();
                q.correct_indices = uniq_sorted(&valid);
                questions.push(q);
            }
            _ => rejected += 1,
        }
    }

    (questions, rejected)
}

/// Parse a raw JSON document into the active question set. A top level that
/// is not an array is fatal; anything below that degrades per record.
pub fn load_from_str(data: &str) -> Result<(Vec<Question>, usize), QuizError> {
    let value: Value = serde_json::from_str(data).map_err(|e| QuizError::Load {
        reason: e.to_string(),
    })?;
    match value {
        Value::Array(records) => Ok(normalize(records)),
        _ => Err(QuizError::InvalidShape),
    }
}

/// Load the question bank from a JSON file.
pub fn load_from_file(path: &Path) -> Result<(Vec<Question>, usize), QuizError> {
    let data = fs::read_to_string(path).map_err(|e| QuizError::Load {
        reason: format!("{}: {}", path.display(), e),
    })?;
    load_from_str(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_question(id: &str) -> Value {
        json!({
            "id": id,
            "question": format!("What is {}?", id),
            "category": "テクノロジ系 / データベース",
            "source": "令和5年春期 問1",
            "choices": [
                {"text": "a", "overview": "ov", "detail": "dt", "link": null},
                {"text": "b", "overview": "ov", "detail": "dt", "link": "https://example.com"},
                {"text": "c", "overview": "ov", "detail": "dt"},
                {"text": "d", "overview": "ov", "detail": "dt"}
            ],
            "correct_indices": [2, 0]
        })
    }

    mod normalize_tests {
        use super::*;

        #[test]
        fn keeps_well_formed_records_in_order() {
            let (questions, rejected) =
                normalize(vec![raw_question("q1"), raw_question("q2")]);
            assert_eq!(rejected, 0);
            assert_eq!(questions.len(), 2);
            assert_eq!(questions[0].id, "q1");
            assert_eq!(questions[1].id, "q2");
        }

        #[test]
        fn normalizes_correct_indices() {
            let (questions, _) = normalize(vec![raw_question("q1")]);
            assert_eq!(questions[0].correct_indices, vec![0, 2]);
        }

        #[test]
        fn rejects_missing_id() {
            let mut record = raw_question("q1");
            record.as_object_mut().unwrap().remove("id");
            let (questions, rejected) = normalize(vec![record]);
            assert!(questions.is_empty());
            assert_eq!(rejected, 1);
        }

        #[test]
        fn rejects_blank_id_and_question() {
            let mut blank_id = raw_question("q1");
            blank_id["id"] = json!("   ");
            let mut blank_question = raw_question("q2");
            blank_question["question"] = json!("");
            let (questions, rejected) = normalize(vec![blank_id, blank_question]);
            assert!(questions.is_empty());
            assert_eq!(rejected, 2);
        }

        #[test]
        fn rejects_too_few_choices() {
            let mut record = raw_question("q1");
            record["choices"] = json!([{"text": "only one"}]);
            let (questions, rejected) = normalize(vec![record]);
            assert!(questions.is_empty());
            assert_eq!(rejected, 1);
        }

        #[test]
        fn rejects_non_sequence_choices() {
            let mut record = raw_question("q1");
            record["choices"] = json!("not a list");
            let (questions, rejected) = normalize(vec![record]);
            assert!(questions.is_empty());
            assert_eq!(rejected, 1);
        }

        #[test]
        fn out_of_range_correct_indices_discarded() {
            let mut record = raw_question("q1");
            record["correct_indices"] = json!([1, 99]);
            let (questions, _) = normalize(vec![record]);
            assert_eq!(questions[0].correct_indices, vec![1]);
        }

        #[test]
        fn missing_optional_fields_default() {
            let record = json!({
                "id": "q1",
                "question": "bare minimum",
                "choices": [{"text": "a"}, {"text": "b"}]
            });
            let (questions, rejected) = normalize(vec![record]);
            assert_eq!(rejected, 0);
            let q = &questions[0];
            assert!(q.category.is_empty());
            assert!(q.source.is_empty());
            assert!(q.correct_indices.is_empty());
            assert!(q.choices[0].overview.is_empty());
            assert!(q.choices[0].link.is_none());
        }

        #[test]
        fn bad_records_do_not_block_good_ones() {
            let mut bad = raw_question("bad");
            bad.as_object_mut().unwrap().remove("id");
            let (questions, rejected) = normalize(vec![
                raw_question("q1"),
                bad,
                json!("not even an object"),
                raw_question("q2"),
            ]);
            assert_eq!(questions.len(), 2);
            assert_eq!(rejected, 2);
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn mixed_bank_keeps_only_valid_records() {
            let mut records: Vec<Value> = (1..=4).map(|i| raw_question(&format!("q{}", i))).collect();
            let mut missing_id = raw_question("q5");
            missing_id.as_object_mut().unwrap().remove("id");
            records.push(missing_id);
            let mut short = raw_question("q6");
            short["choices"] = json!([{"text": "lonely"}]);
            records.push(short);
            let data = serde_json::to_string(&records).unwrap();

            let (questions, rejected) = load_from_str(&data).unwrap();
            assert_eq!(questions.len(), 4);
            assert_eq!(rejected, 2);
        }

        #[test]
        fn non_array_top_level_is_invalid_shape() {
            let result = load_from_str(r#"{"questions": []}"#);
            assert!(matches!(result, Err(QuizError::InvalidShape)));
        }

        #[test]
        fn unparseable_document_is_load_failure() {
            let result = load_from_str("{nope");
            assert!(matches!(result, Err(QuizError::Load { .. })));
        }

        #[test]
        fn missing_file_is_load_failure() {
            let result = load_from_file(Path::new("/nonexistent/kakomon-questions.json"));
            assert!(matches!(result, Err(QuizError::Load { .. })));
        }
    }
}
