//! Records flowing through the routing stage.
//!
//! A record wraps raw content bytes with an ordered attribute map and the
//! identity the host pipeline uses to track it.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A unit of data: content bytes plus string attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Unique record ID for tracking
    id: Uuid,

    /// Timestamp when the record entered the pipeline
    entry_date: DateTime<Utc>,

    /// Raw content (before parsing)
    content: Vec<u8>,

    /// Attribute metadata, in insertion order
    attributes: IndexMap<String, String>,
}

impl Record {
    /// Create a new record with no attributes
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            entry_date: Utc::now(),
            content: content.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Create a record with initial attributes
    pub fn with_attributes<I, K, V>(content: impl Into<Vec<u8>>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new(content);
        record.put_all_attributes(attributes);
        record
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn entry_date(&self) -> DateTime<Utc> {
        self.entry_date
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Replace the whole content. The previous bytes are discarded.
    pub fn replace_content(&mut self, content: impl Into<Vec<u8>>) {
        self.content = content.into();
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Set an attribute, overwriting any existing value for the key
    pub fn put_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Set several attributes at once; later pairs win on key clashes
    pub fn put_all_attributes<I, K, V>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in attributes {
            self.put_attribute(key, value);
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record[id={}, size={}]", self.id, self.content.len())
    }
}

/// Relationship a record is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// At least one query produced a value
    Matched,
    /// Every query evaluated cleanly but none found a value
    Unmatched,
    /// Content could not be parsed or a query failed to evaluate
    Failed,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Matched, Outcome::Unmatched, Outcome::Failed];

    /// Relationship name used by sinks and in logs
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Matched => "matched",
            Outcome::Unmatched => "unmatched",
            Outcome::Failed => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
