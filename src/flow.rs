//! Interfaces to the surrounding pipeline.
//!
//! The router pulls records from a [`RecordSource`] and hands every record to
//! a [`RecordSink`] under exactly one [`Outcome`].

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use indexmap::IndexMap;

use crate::error::{RecordError, SourceError};
use crate::record::{Outcome, Record};

/// Bounded-pull record source
pub trait RecordSource {
    /// Take up to `max` records. An empty vector means nothing is queued.
    fn pull(&mut self, max: usize) -> Result<Vec<Record>, SourceError>;
}

/// Destination for routed records
pub trait RecordSink {
    /// Take ownership of a routed record.
    ///
    /// `cause` is present exactly when `outcome` is [`Outcome::Failed`].
    fn dispatch(&mut self, record: Record, outcome: Outcome, cause: Option<&RecordError>);
}

/// FIFO queue of pending records, safe to pull from several threads.
///
/// Each record is handed out by exactly one pull.
#[derive(Debug, Default)]
pub struct RecordQueue {
    pending: Mutex<VecDeque<Record>>,
}

impl RecordQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, record: Record) {
        self.lock().push_back(record);
    }

    /// Enqueue a record built from raw content
    pub fn enqueue_content(&self, content: impl Into<Vec<u8>>) {
        self.enqueue(Record::new(content));
    }

    /// Load every regular file in `dir` as one record, in file name order.
    ///
    /// Each record gets a `filename` attribute holding the file's name.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        let read_err = |path: &Path, e: std::io::Error| SourceError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| read_err(dir, e))? {
            let path = entry.map_err(|e| read_err(dir, e))?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let queue = Self::new();
        for path in paths {
            let content = fs::read(&path).map_err(|e| read_err(path.as_path(), e))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            queue.enqueue(Record::with_attributes(content, [("filename", filename)]));
        }

        tracing::debug!("Loaded {} records from {}", queue.len(), dir.display());
        Ok(queue)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn take(&self, max: usize) -> Vec<Record> {
        let mut pending = self.lock();
        let count = max.min(pending.len());
        pending.drain(..count).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Record>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FromIterator<Record> for RecordQueue {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            pending: Mutex::new(iter.into_iter().collect()),
        }
    }
}

impl RecordSource for RecordQueue {
    fn pull(&mut self, max: usize) -> Result<Vec<Record>, SourceError> {
        Ok(self.take(max))
    }
}

impl RecordSource for &RecordQueue {
    fn pull(&mut self, max: usize) -> Result<Vec<Record>, SourceError> {
        Ok(self.take(max))
    }
}

/// A record routed to `failed`, kept with its cause
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRecord {
    pub record: Record,
    pub cause: Option<RecordError>,
}

/// Sink that keeps every dispatched record in memory, grouped by outcome.
#[derive(Debug, Default)]
pub struct CollectingSink {
    matched: Vec<Record>,
    unmatched: Vec<Record>,
    failed: Vec<FailedRecord>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matched(&self) -> &[Record] {
        &self.matched
    }

    pub fn unmatched(&self) -> &[Record] {
        &self.unmatched
    }

    pub fn failed(&self) -> &[FailedRecord] {
        &self.failed
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::Matched => self.matched.len(),
            Outcome::Unmatched => self.unmatched.len(),
            Outcome::Failed => self.failed.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len() + self.failed.len()
    }

    /// Counts per relationship name
    pub fn counts(&self) -> IndexMap<&'static str, usize> {
        Outcome::ALL
            .iter()
            .map(|outcome| (outcome.name(), self.count(*outcome)))
            .collect()
    }

    /// Move everything collected by `other` into this sink
    pub fn absorb(&mut self, other: CollectingSink) {
        self.matched.extend(other.matched);
        self.unmatched.extend(other.unmatched);
        self.failed.extend(other.failed);
    }
}

impl RecordSink for CollectingSink {
    fn dispatch(&mut self, record: Record, outcome: Outcome, cause: Option<&RecordError>) {
        match outcome {
            Outcome::Matched => self.matched.push(record),
            Outcome::Unmatched => self.unmatched.push(record),
            Outcome::Failed => self.failed.push(FailedRecord {
                record,
                cause: cause.cloned(),
            }),
        }
    }
}
