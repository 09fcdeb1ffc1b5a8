//! Batch router: pull, classify, write output, dispatch.
//!
//! One `run` processes a single bounded batch sequentially. Routers hold the
//! registry through `Arc`, so several routers (on several threads) can drain
//! the same source as long as each pull hands out distinct records.

use std::sync::Arc;

use thiserror::Error;

use crate::error::SourceError;
use crate::flow::{RecordSink, RecordSource};
use crate::record::{Outcome, Record};
use crate::runtime::classifier::{classify, RecordDisposition};
use crate::runtime::evaluator::{JsonPathEvaluator, QueryEvaluator};
use crate::runtime::query_registry::{Destination, QueryRegistry};

/// Maximum records taken from the source per run unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Per-run routing counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub pulled: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Records dispatched across all outcomes
    pub fn dispatched(&self) -> usize {
        self.matched + self.unmatched + self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.pulled == 0
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Matched => self.matched += 1,
            Outcome::Unmatched => self.unmatched += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    /// Add another run's counts to this one
    pub fn merge(&mut self, other: &BatchSummary) {
        self.pulled += other.pulled;
        self.matched += other.matched;
        self.unmatched += other.unmatched;
        self.failed += other.failed;
    }
}

/// A source failed partway through [`BatchRouter::drain`].
///
/// Records counted in `completed` were already dispatched to the sink before
/// the failing pull.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record source failed after {} records were routed: {source}", .completed.pulled)]
pub struct DrainError {
    pub completed: BatchSummary,
    #[source]
    pub source: SourceError,
}

/// Drives parse → evaluate → classify → dispatch for a batch of records.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use pathroute::{BatchRouter, CollectingSink, Destination, QueryRegistry, RecordQueue};
///
/// let registry = QueryRegistry::new([("name", "$.data.name")], Destination::Attribute).unwrap();
/// let router = BatchRouter::new(Arc::new(registry));
///
/// let mut queue = RecordQueue::new();
/// queue.enqueue_content(r#"{"data":{"name":"Esteban"}}"#);
/// let mut sink = CollectingSink::new();
///
/// let summary = router.run(&mut queue, &mut sink).unwrap();
/// assert_eq!(summary.matched, 1);
/// assert_eq!(sink.matched()[0].attribute("name"), Some("Esteban"));
/// ```
#[derive(Debug, Clone)]
pub struct BatchRouter<E = JsonPathEvaluator> {
    registry: Arc<QueryRegistry>,
    evaluator: E,
    batch_size: usize,
}

impl BatchRouter<JsonPathEvaluator> {
    /// Create a router using the JSONPath evaluator and the default batch size
    pub fn new(registry: Arc<QueryRegistry>) -> Self {
        Self::with_evaluator(registry, JsonPathEvaluator)
    }
}

impl<E: QueryEvaluator> BatchRouter<E> {
    pub fn with_evaluator(registry: Arc<QueryRegistry>, evaluator: E) -> Self {
        Self {
            registry,
            evaluator,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the per-run pull limit. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn registry(&self) -> &QueryRegistry {
        &self.registry
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Route one batch from `source` into `sink`.
    ///
    /// Every pulled record is dispatched exactly once, whatever happens to
    /// its siblings. An empty pull returns an empty summary.
    ///
    /// # Errors
    /// Returns the source's error if the pull fails; no record has been
    /// touched in that case.
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<BatchSummary, SourceError>
    where
        S: RecordSource + ?Sized,
        K: RecordSink + ?Sized,
    {
        let records = source.pull(self.batch_size)?;
        if records.is_empty() {
            return Ok(BatchSummary::default());
        }

        tracing::debug!("Pulled {} records (limit {})", records.len(), self.batch_size);

        let mut summary = BatchSummary {
            pulled: records.len(),
            ..BatchSummary::default()
        };

        for record in records {
            let outcome = self.route_record(record, sink);
            summary.record(outcome);
        }

        Ok(summary)
    }

    /// Keep running batches until the source returns an empty pull.
    ///
    /// # Errors
    /// Returns [`DrainError`] on the first failing pull, carrying the counts
    /// of every batch dispatched before it.
    pub fn drain<S, K>(&self, source: &mut S, sink: &mut K) -> Result<BatchSummary, DrainError>
    where
        S: RecordSource + ?Sized,
        K: RecordSink + ?Sized,
    {
        let mut total = BatchSummary::default();
        loop {
            let summary = match self.run(source, sink) {
                Ok(summary) => summary,
                Err(err) => {
                    tracing::error!(
                        "Record source failed after {} records were routed: {}",
                        total.pulled,
                        err
                    );
                    return Err(DrainError {
                        completed: total,
                        source: err,
                    });
                }
            };
            if summary.is_empty() {
                return Ok(total);
            }
            total.merge(&summary);
        }
    }

    /// Classify a single record, apply the destination, and dispatch it.
    pub fn route_record<K>(&self, mut record: Record, sink: &mut K) -> Outcome
    where
        K: RecordSink + ?Sized,
    {
        let disposition = classify(&self.registry, &self.evaluator, record.content());
        let outcome = disposition.outcome();

        match disposition {
            RecordDisposition::Matched(extracted) => {
                let matches = extracted.len();
                match self.registry.destination() {
                    Destination::Attribute => record.put_all_attributes(extracted),
                    Destination::Content => {
                        // The registry guarantees at most one query here
                        if let Some((_, value)) = extracted.into_iter().next() {
                            record.replace_content(value.into_bytes());
                        }
                    }
                }
                tracing::info!(
                    "Successfully evaluated JSONPath against {} and found {} matches; routing to '{}'",
                    record,
                    matches,
                    outcome
                );
                sink.dispatch(record, outcome, None);
            }
            RecordDisposition::Unmatched => {
                tracing::info!(
                    "Successfully evaluated JSONPath against {} and found 0 matches; routing to '{}'",
                    record,
                    outcome
                );
                sink.dispatch(record, outcome, None);
            }
            RecordDisposition::Failed(cause) => {
                tracing::error!(
                    "Unable to evaluate JSONPath against {} due to {}; routing to '{}'",
                    record,
                    cause,
                    outcome
                );
                sink.dispatch(record, outcome, Some(&cause));
            }
        }

        outcome
    }
}
