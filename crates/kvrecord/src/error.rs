//! Error types for the record store.

use kvrecord_core::{Owner, RecordId, Status};
use thiserror::Error;

/// Errors that can occur during record store operations.
///
/// Every variant maps to one [`ErrorKind`] so callers can tell transient
/// failures from refusals.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A backend call failed or timed out.
    #[error("backend unavailable ({target}): {reason}")]
    BackendUnavailable { target: String, reason: String },

    /// Bytes at `key` do not decode into the expected shape.
    #[error("corrupt data at {key}: {reason}")]
    CorruptData { key: String, reason: String },

    /// No record is stored under this id.
    #[error("record not found: {0}")]
    NotFound(RecordId),

    /// The status machine does not permit this move.
    #[error("invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: RecordId,
        from: Status,
        to: Status,
    },

    /// The actor does not own the record.
    #[error("{actor} may not modify record {id}")]
    Unauthorized { id: RecordId, actor: Owner },

    /// Every generated id was already taken.
    #[error("generated id collided on all {attempts} attempts")]
    CollisionDetected { attempts: u32 },

    /// The payload was rejected before any backend call.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Compare-and-swap on the index kept losing to concurrent writers.
    #[error("index update lost {attempts} consecutive compare-and-swap races")]
    IndexContention { attempts: u32 },

    /// The configuration needs a backend operation this backend lacks.
    #[error("backend does not support {0}")]
    Unsupported(&'static str),
}

/// Coarse classification of a [`RecordError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BackendUnavailable,
    CorruptData,
    NotFound,
    InvalidTransition,
    Unauthorized,
    CollisionDetected,
    InvalidPayload,
    IndexContention,
    Unsupported,
}

impl ErrorKind {
    /// Whether retrying the same call later may succeed.
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::BackendUnavailable
                | ErrorKind::CollisionDetected
                | ErrorKind::IndexContention
        )
    }

    /// Whether the request itself was refused.
    pub const fn is_refusal(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidTransition | ErrorKind::Unauthorized | ErrorKind::InvalidPayload
        )
    }
}

impl RecordError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordError::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            RecordError::CorruptData { .. } => ErrorKind::CorruptData,
            RecordError::NotFound(_) => ErrorKind::NotFound,
            RecordError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            RecordError::Unauthorized { .. } => ErrorKind::Unauthorized,
            RecordError::CollisionDetected { .. } => ErrorKind::CollisionDetected,
            RecordError::InvalidPayload(_) => ErrorKind::InvalidPayload,
            RecordError::IndexContention { .. } => ErrorKind::IndexContention,
            RecordError::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }

    pub(crate) fn unavailable(target: impl Into<String>, reason: impl ToString) -> Self {
        RecordError::BackendUnavailable {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn corrupt(key: impl Into<String>, reason: impl ToString) -> Self {
        RecordError::CorruptData {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, RecordError>;
