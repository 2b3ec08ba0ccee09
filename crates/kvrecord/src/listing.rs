//! Listing results and per-record diagnostics.

use std::fmt;

use kvrecord_core::{summarize, Record, RecordId, Summary};

/// Why an indexed record was left out of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The index names the id but the record key is empty.
    Missing,
    /// The record bytes did not decode.
    Corrupt(String),
    /// The record read failed or timed out.
    Unavailable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Missing => f.write_str("missing"),
            SkipReason::Corrupt(reason) => write!(f, "corrupt: {}", reason),
            SkipReason::Unavailable(reason) => write!(f, "unavailable: {}", reason),
        }
    }
}

/// An indexed record that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub id: RecordId,
    pub reason: SkipReason,
}

/// A snapshot of the collection.
///
/// `records` is sorted newest first (ties by id). `skipped` is sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub records: Vec<Record>,
    pub skipped: Vec<SkippedRecord>,
}

impl Listing {
    /// Aggregate statistics over the resolved records.
    pub fn summary(&self) -> Summary {
        summarize(&self.records)
    }

    /// Whether every indexed record resolved.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
