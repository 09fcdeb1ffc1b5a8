//! NDJSON output for routed records.
//!
//! [`NdjsonSink`] writes each outcome to its own stream, one JSON object per
//! record, so downstream tooling can pick up `matched`, `unmatched` and
//! `failed` independently.

use std::borrow::Cow;
use std::io::Write;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::error::RecordError;
use crate::flow::RecordSink;
use crate::record::{Outcome, Record};

/// Error type for serialization operations
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// NDJSON (Newline Delimited JSON) writer
///
/// Writes values as NDJSON, one JSON object per line.
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    /// Create a new NDJSON writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single value as an NDJSON line
    pub fn write<T: Serialize>(&mut self, value: &T) -> Result<(), SerializationError> {
        let json = serde_json::to_string(value)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// One output line describing a routed record
#[derive(Debug, Serialize)]
pub struct RecordLine<'a> {
    pub id: Uuid,
    pub entry_date: DateTime<Utc>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    pub attributes: &'a IndexMap<String, String>,
    /// Content as text; invalid UTF-8 sequences are replaced
    pub content: Cow<'a, str>,
}

impl<'a> RecordLine<'a> {
    pub fn new(record: &'a Record, outcome: Outcome, cause: Option<&RecordError>) -> Self {
        Self {
            id: record.id(),
            entry_date: record.entry_date(),
            outcome,
            cause: cause.map(|c| c.to_string()),
            attributes: record.attributes(),
            content: String::from_utf8_lossy(record.content()),
        }
    }
}

/// Sink writing each outcome to its own NDJSON stream.
///
/// Dispatch cannot fail from the router's point of view; write errors are
/// logged and counted, and the first one is kept for [`NdjsonSink::finish`].
pub struct NdjsonSink<W: Write> {
    matched: NdjsonWriter<W>,
    unmatched: NdjsonWriter<W>,
    failed: NdjsonWriter<W>,
    write_errors: usize,
    first_error: Option<SerializationError>,
}

impl<W: Write> NdjsonSink<W> {
    pub fn new(matched: W, unmatched: W, failed: W) -> Self {
        Self {
            matched: NdjsonWriter::new(matched),
            unmatched: NdjsonWriter::new(unmatched),
            failed: NdjsonWriter::new(failed),
            write_errors: 0,
            first_error: None,
        }
    }

    /// Number of records that could not be written
    pub fn write_errors(&self) -> usize {
        self.write_errors
    }

    /// Flush all streams and report the first write error, if any.
    pub fn finish(mut self) -> Result<(W, W, W), SerializationError> {
        if let Some(err) = self.first_error.take() {
            return Err(err);
        }
        self.matched.flush()?;
        self.unmatched.flush()?;
        self.failed.flush()?;
        Ok((
            self.matched.into_inner(),
            self.unmatched.into_inner(),
            self.failed.into_inner(),
        ))
    }

    fn writer(&mut self, outcome: Outcome) -> &mut NdjsonWriter<W> {
        match outcome {
            Outcome::Matched => &mut self.matched,
            Outcome::Unmatched => &mut self.unmatched,
            Outcome::Failed => &mut self.failed,
        }
    }
}

impl<W: Write> RecordSink for NdjsonSink<W> {
    fn dispatch(&mut self, record: Record, outcome: Outcome, cause: Option<&RecordError>) {
        let line = RecordLine::new(&record, outcome, cause);
        if let Err(e) = self.writer(outcome).write(&line) {
            tracing::error!("Failed to write {} to '{}' output: {}", record, outcome, e);
            self.write_errors += 1;
            if self.first_error.is_none() {
                self.first_error = Some(e);
            }
        }
    }
}
