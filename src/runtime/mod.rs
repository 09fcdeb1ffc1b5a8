//! Routing runtime: query registry, document parsing, evaluation,
//! classification and batch routing.

pub mod classifier;
pub mod config_loader;
pub mod document;
pub mod evaluator;
pub mod query_registry;
pub mod router;

// Re-export key types
pub use classifier::{classify, RecordDisposition};
pub use config_loader::{QueryDef, RouterConfig};
pub use document::ParsedDocument;
pub use evaluator::{coerce_to_string, JsonPathEvaluator, QueryEvaluator, QueryResult};
pub use query_registry::{Destination, QueryBinding, QueryRegistry};
pub use router::{BatchRouter, BatchSummary, DrainError, DEFAULT_BATCH_SIZE};
