//! Error taxonomy for the routing core.
//!
//! Configuration problems are fatal before a batch runs. Parse and evaluation
//! problems belong to a single record and are carried to the `failed` sink.

use thiserror::Error;

/// Invalid setup detected while building a registry or loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Content destination can only take a single extracted value
    #[error("destination 'content' supports exactly one query, found {0}")]
    TooManyQueriesForContent(usize),

    #[error("query name '{0}' is defined more than once")]
    DuplicateName(String),

    #[error("query name must not be empty (expression '{0}')")]
    EmptyName(String),

    #[error("batch size must be greater than zero")]
    InvalidBatchSize,

    #[error("failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to parse YAML: {0}")]
    Yaml(String),
}

/// Record content that is not a well-formed JSON document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("content is not valid JSON at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// A query that could not be evaluated against a parsed document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("invalid JSONPath expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// Multi-valued results are rejected rather than truncated
    #[error("expression '{expression}' selected {count} values, expected one")]
    Ambiguous { expression: String, count: usize },

    #[error("value selected by '{expression}' cannot be represented as a string: {reason}")]
    Uncoercible { expression: String, reason: String },

    #[error("query engine failure: {0}")]
    Engine(String),
}

/// Why a record was routed to `failed`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("query '{binding}' failed: {source}")]
    Eval {
        binding: String,
        #[source]
        source: EvalError,
    },
}

/// A record source could not deliver a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("record source unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read record from {path}: {reason}")]
    Read { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{\"a\": }").unwrap_err();
        let parse: ParseError = err.into();

        assert_eq!(parse.line, 1);
        assert!(parse.column > 0);
        assert!(parse.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_record_error_names_binding() {
        let err = RecordError::Eval {
            binding: "json-items".to_string(),
            source: EvalError::Ambiguous {
                expression: "$.items[*]".to_string(),
                count: 3,
            },
        };

        let msg = err.to_string();
        assert!(msg.contains("json-items"));
        assert!(msg.contains("selected 3 values"));
    }
}
