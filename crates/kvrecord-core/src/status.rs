//! The per-record status machine.
//!
//! ```text
//!            +--> Verified
//! Pending ---|
//!            +--> Rejected
//! ```
//!
//! Both outcomes are terminal. Self-transitions are rejected so that a
//! retried transition is reported instead of silently re-applied.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Lifecycle state of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl Status {
    /// Wire name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Verified => "verified",
            Status::Rejected => "rejected",
        }
    }

    /// Parse a wire name, mapping anything unrecognized to `Pending`.
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "verified" => Status::Verified,
            "rejected" => Status::Rejected,
            _ => Status::Pending,
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Status::Pending)
    }

    /// Whether `self -> target` is one of the permitted edges.
    pub const fn can_transition_to(self, target: Status) -> bool {
        matches!(
            (self, target),
            (Status::Pending, Status::Verified) | (Status::Pending, Status::Rejected)
        )
    }

    /// Validate `self -> target`, returning the new status.
    pub fn transition(self, target: Status) -> Result<Status, CoreError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(CoreError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deserialize an optional status string, defaulting unknown or missing
/// values to `Pending`.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Status, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(Status::parse_lenient).unwrap_or_default())
}
