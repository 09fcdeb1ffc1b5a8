//! Per-record outcome classification.
//!
//! Parses a record's content once, evaluates every binding in registry order,
//! and folds the per-query results into a single disposition.

use indexmap::IndexMap;

use crate::error::RecordError;
use crate::record::Outcome;
use crate::runtime::document::ParsedDocument;
use crate::runtime::evaluator::{QueryEvaluator, QueryResult};
use crate::runtime::query_registry::QueryRegistry;

/// Final classification of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDisposition {
    /// Extracted values keyed by query name, in registry order
    Matched(IndexMap<String, String>),
    Unmatched,
    Failed(RecordError),
}

impl RecordDisposition {
    pub fn outcome(&self) -> Outcome {
        match self {
            RecordDisposition::Matched(_) => Outcome::Matched,
            RecordDisposition::Unmatched => Outcome::Unmatched,
            RecordDisposition::Failed(_) => Outcome::Failed,
        }
    }
}

/// Classify a record's content against every query in the registry.
///
/// # Flow
/// 1. Parse content; a parse error fails the record before any query runs
/// 2. Evaluate bindings in order:
///    - value: kept under the binding's name
///    - not found: skipped
///    - evaluation error: record fails, remaining bindings are not evaluated
/// 3. Any kept value means `Matched`, otherwise `Unmatched`
///
/// The parsed document lives only for the duration of this call.
pub fn classify<E>(registry: &QueryRegistry, evaluator: &E, content: &[u8]) -> RecordDisposition
where
    E: QueryEvaluator + ?Sized,
{
    let document = match ParsedDocument::parse(content) {
        Ok(doc) => doc,
        Err(e) => return RecordDisposition::Failed(RecordError::Parse(e)),
    };

    let mut extracted = IndexMap::new();

    for binding in registry.bindings() {
        match evaluator.evaluate(&document, binding) {
            QueryResult::Value(value) => {
                tracing::debug!("Query '{}' matched", binding.name());
                extracted.insert(binding.name().to_string(), value);
            }
            QueryResult::NotFound => {
                tracing::debug!("Query '{}' found nothing", binding.name());
            }
            QueryResult::EvalError(source) => {
                return RecordDisposition::Failed(RecordError::Eval {
                    binding: binding.name().to_string(),
                    source,
                });
            }
        }
    }

    if extracted.is_empty() {
        RecordDisposition::Unmatched
    } else {
        RecordDisposition::Matched(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::runtime::evaluator::JsonPathEvaluator;
    use crate::runtime::query_registry::{Destination, QueryBinding};
    use std::sync::Mutex;

    const DOC: &[u8] = br#"{"data":{"name":"Esteban","age":32}}"#;

    fn registry(bindings: &[(&str, &str)]) -> QueryRegistry {
        QueryRegistry::new(bindings.iter().copied(), Destination::Attribute).unwrap()
    }

    /// Records which bindings were evaluated and answers from a script
    struct RecordingEvaluator {
        calls: Mutex<Vec<String>>,
        fail_on: &'static str,
    }

    impl QueryEvaluator for RecordingEvaluator {
        fn evaluate(&self, _doc: &ParsedDocument, query: &QueryBinding) -> QueryResult {
            self.calls.lock().unwrap().push(query.name().to_string());
            if query.name() == self.fail_on {
                QueryResult::EvalError(EvalError::Engine("boom".to_string()))
            } else {
                QueryResult::Value(query.name().to_uppercase())
            }
        }
    }

    #[test]
    fn test_matched_keeps_only_found_keys() {
        let reg = registry(&[
            ("name", "$.data.name"),
            ("age", "$.data.age"),
            ("xxx", "$.data.xxx"),
        ]);

        let disposition = classify(&reg, &JsonPathEvaluator, DOC);

        let mut expected = IndexMap::new();
        expected.insert("name".to_string(), "Esteban".to_string());
        expected.insert("age".to_string(), "32".to_string());
        assert_eq!(disposition, RecordDisposition::Matched(expected));
    }

    #[test]
    fn test_all_not_found_is_unmatched() {
        let reg = registry(&[("xxx", "$.data.xxx"), ("yyy", "$.data.yyy")]);
        let disposition = classify(&reg, &JsonPathEvaluator, DOC);

        assert_eq!(disposition, RecordDisposition::Unmatched);
        assert_eq!(disposition.outcome(), Outcome::Unmatched);
    }

    #[test]
    fn test_empty_registry_is_unmatched() {
        let reg = registry(&[]);
        assert_eq!(
            classify(&reg, &JsonPathEvaluator, DOC),
            RecordDisposition::Unmatched
        );
    }

    #[test]
    fn test_parse_error_skips_all_queries() {
        let reg = registry(&[("a", "$.a"), ("b", "$.b")]);
        let recorder = RecordingEvaluator {
            calls: Mutex::new(Vec::new()),
            fail_on: "",
        };

        let disposition = classify(&reg, &recorder, b"not json at all");

        assert!(matches!(
            disposition,
            RecordDisposition::Failed(RecordError::Parse(_))
        ));
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_eval_error_stops_remaining_queries() {
        let reg = registry(&[("a", "$.a"), ("b", "$.b"), ("c", "$.c")]);
        let recorder = RecordingEvaluator {
            calls: Mutex::new(Vec::new()),
            fail_on: "b",
        };

        let disposition = classify(&reg, &recorder, DOC);

        match disposition {
            RecordDisposition::Failed(RecordError::Eval { binding, .. }) => {
                assert_eq!(binding, "b");
            }
            other => panic!("expected eval failure, got {:?}", other),
        }
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_eval_error_after_value_still_fails() {
        let reg = registry(&[("name", "$.data.name"), ("bad", "$.data[")]);

        let disposition = classify(&reg, &JsonPathEvaluator, DOC);

        assert_eq!(disposition.outcome(), Outcome::Failed);
    }

    #[test]
    fn test_disposition_is_independent_of_previous_records() {
        let reg = registry(&[("name", "$.data.name")]);

        let first = classify(&reg, &JsonPathEvaluator, b"{oops");
        let second = classify(&reg, &JsonPathEvaluator, DOC);
        let third = classify(&reg, &JsonPathEvaluator, DOC);

        assert_eq!(first.outcome(), Outcome::Failed);
        assert_eq!(second, third);
        assert_eq!(second.outcome(), Outcome::Matched);
    }
}
