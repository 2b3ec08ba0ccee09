//! Error types for kvrecord core.

use thiserror::Error;

use crate::status::Status;

/// Errors raised by the pure data model and the codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid record id: {0:?}")]
    InvalidId(String),

    #[error("invalid owner: {0:?}")]
    InvalidOwner(String),

    #[error("score {0} is outside 0..=100")]
    ScoreOutOfRange(u64),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: Status, to: Status },

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
