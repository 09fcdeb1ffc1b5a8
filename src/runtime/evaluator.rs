//! Query evaluation against parsed documents.
//!
//! Evaluation distinguishes a path that is simply absent from this document
//! (`NotFound`, expected business data) from a query that cannot be answered
//! (`EvalError`, an operator problem).

use serde_json::Value as JsonValue;

use crate::error::EvalError;
use crate::runtime::document::ParsedDocument;
use crate::runtime::query_registry::QueryBinding;

/// Result of evaluating one binding against one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    /// Exactly one value, flattened to a string
    Value(String),
    /// The path selects nothing in this document
    NotFound,
    /// The query could not be evaluated
    EvalError(EvalError),
}

/// Trait for evaluating a query binding against a parsed document
///
/// The router and classifier only depend on this trait, so other query
/// engines (or test doubles) can be plugged in.
///
/// # Example
///
/// ```
/// use pathroute::runtime::{ParsedDocument, QueryBinding, QueryEvaluator, QueryResult};
///
/// struct Always;
///
/// impl QueryEvaluator for Always {
///     fn evaluate(&self, _doc: &ParsedDocument, _query: &QueryBinding) -> QueryResult {
///         QueryResult::Value("x".to_string())
///     }
/// }
/// ```
pub trait QueryEvaluator: Send + Sync {
    fn evaluate(&self, document: &ParsedDocument, query: &QueryBinding) -> QueryResult;
}

/// RFC 9535 JSONPath evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPathEvaluator;

impl QueryEvaluator for JsonPathEvaluator {
    fn evaluate(&self, document: &ParsedDocument, query: &QueryBinding) -> QueryResult {
        let path = match query.compiled() {
            Ok(path) => path,
            Err(e) => return QueryResult::EvalError(e.clone()),
        };

        let nodes = path.query(document.root());
        if nodes.len() > 1 {
            return QueryResult::EvalError(EvalError::Ambiguous {
                expression: query.expression().to_string(),
                count: nodes.len(),
            });
        }

        match nodes.first() {
            None => QueryResult::NotFound,
            Some(value) => match coerce_to_string(value) {
                Ok(s) => QueryResult::Value(s),
                Err(reason) => QueryResult::EvalError(EvalError::Uncoercible {
                    expression: query.expression().to_string(),
                    reason,
                }),
            },
        }
    }
}

/// Flatten a single JSON value to its string form.
///
/// Strings are taken verbatim, numbers and booleans use their JSON text, and
/// arrays and objects become compact JSON. `null` has no string form.
pub fn coerce_to_string(value: &JsonValue) -> Result<String, String> {
    match value {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        JsonValue::Array(_) | JsonValue::Object(_) => {
            serde_json::to_string(value).map_err(|e| e.to_string())
        }
        JsonValue::Null => Err("value is null".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> ParsedDocument {
        ParsedDocument::from(json!({
            "data": {
                "name": "Esteban",
                "age": 32,
                "active": true,
                "ratio": 0.5,
                "nickname": null,
                "tags": ["a", "b"],
                "address": {"city": "Auckland"}
            },
            "items": [{"id": 1}, {"id": 2}, {"id": 3}]
        }))
    }

    fn eval(expression: &str) -> QueryResult {
        JsonPathEvaluator.evaluate(&doc(), &QueryBinding::new("q", expression))
    }

    #[test]
    fn test_string_value() {
        assert_eq!(eval("$.data.name"), QueryResult::Value("Esteban".to_string()));
    }

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(eval("$.data.age"), QueryResult::Value("32".to_string()));
        assert_eq!(eval("$.data.active"), QueryResult::Value("true".to_string()));
        assert_eq!(eval("$.data.ratio"), QueryResult::Value("0.5".to_string()));
    }

    #[test]
    fn test_structured_values_become_json() {
        assert_eq!(
            eval("$.data.tags"),
            QueryResult::Value("[\"a\",\"b\"]".to_string())
        );
        assert_eq!(
            eval("$.data.address"),
            QueryResult::Value("{\"city\":\"Auckland\"}".to_string())
        );
    }

    #[test]
    fn test_structured_values_keep_document_key_order() {
        let doc = ParsedDocument::parse(br#"{"o":{"zeta":1,"alpha":2,"mid":{"b":1,"a":2}}}"#)
            .unwrap();
        let result = JsonPathEvaluator.evaluate(&doc, &QueryBinding::new("o", "$.o"));

        assert_eq!(
            result,
            QueryResult::Value(r#"{"zeta":1,"alpha":2,"mid":{"b":1,"a":2}}"#.to_string())
        );
    }

    #[test]
    fn test_missing_path_is_not_found() {
        assert_eq!(eval("$.data.xxx"), QueryResult::NotFound);
        assert_eq!(eval("$.nothing.here"), QueryResult::NotFound);
        assert_eq!(eval("$.items[10]"), QueryResult::NotFound);
    }

    #[test]
    fn test_single_match_from_filter() {
        assert_eq!(eval("$.items[?@.id == 2].id"), QueryResult::Value("2".to_string()));
    }

    #[test]
    fn test_multiple_values_are_ambiguous() {
        match eval("$.items[*].id") {
            QueryResult::EvalError(EvalError::Ambiguous { count, .. }) => assert_eq!(count, 3),
            other => panic!("expected ambiguous result, got {:?}", other),
        }
    }

    #[test]
    fn test_null_is_uncoercible() {
        assert!(matches!(
            eval("$.data.nickname"),
            QueryResult::EvalError(EvalError::Uncoercible { .. })
        ));
    }

    #[test]
    fn test_invalid_expression() {
        assert!(matches!(
            eval("data.name"),
            QueryResult::EvalError(EvalError::InvalidExpression { .. })
        ));
    }
}
