//! Aggregate statistics over a record set.
//!
//! Summaries are never persisted; they are recomputed from a listing.

use serde::Serialize;

use crate::record::Record;
use crate::status::Status;

/// Counts per status and the average score of verified records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub verified_count: usize,
    pub pending_count: usize,
    pub rejected_count: usize,
    /// Mean score of verified records, rounded half up; `0` if none.
    pub average_score: u8,
}

/// Summarize a record set.
pub fn summarize<'a>(records: impl IntoIterator<Item = &'a Record>) -> Summary {
    let mut summary = Summary::default();
    let mut verified_total: u64 = 0;

    for record in records {
        summary.total += 1;
        match record.status {
            Status::Pending => summary.pending_count += 1,
            Status::Rejected => summary.rejected_count += 1,
            Status::Verified => {
                summary.verified_count += 1;
                verified_total += u64::from(record.score.value());
            }
        }
    }

    if summary.verified_count > 0 {
        let count = summary.verified_count as u64;
        // Integer round-half-up; the mean of scores in 0..=100 fits in a u8.
        summary.average_score = ((verified_total + count / 2) / count) as u8;
    }

    summary
}
