//! # Pathroute: JSONPath Extraction and Routing
//!
//! Pathroute is a record-processing stage for flow-based pipelines. It pulls a
//! bounded batch of records, evaluates a configured set of JSONPath queries
//! against each record's JSON content, writes the extracted values back, and
//! routes every record to exactly one outcome.
//!
//! ## Outcomes
//!
//! - **matched**: at least one query produced a value and none failed
//! - **unmatched**: every query evaluated cleanly but found nothing
//! - **failed**: the content is not valid JSON, or a query could not be
//!   evaluated (invalid expression, several values selected, `null` value)
//!
//! ## Destinations
//!
//! - `attribute`: each extracted value becomes an attribute named after its query
//! - `content` (default): the single query's value replaces the record content
//!
//! ## Example configuration
//!
//! ```yaml
//! destination: attribute
//! batch_size: 50
//! queries:
//!   - name: json-name
//!     path: $.data.name
//!   - name: json-age
//!     path: $.data.age
//! ```

pub mod error;
pub mod flow;
pub mod record;
pub mod serialization;

// Query evaluation and routing runtime
pub mod runtime;

// Re-export key types
pub use error::{ConfigurationError, EvalError, ParseError, RecordError, SourceError};
pub use flow::{CollectingSink, FailedRecord, RecordQueue, RecordSink, RecordSource};
pub use record::{Outcome, Record};
pub use serialization::{NdjsonSink, NdjsonWriter, SerializationError};

pub use runtime::{
    classify, BatchRouter, BatchSummary, Destination, DrainError, JsonPathEvaluator,
    ParsedDocument, QueryBinding, QueryEvaluator, QueryRegistry, QueryResult, RecordDisposition,
    RouterConfig,
};
