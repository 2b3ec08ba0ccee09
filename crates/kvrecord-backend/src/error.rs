//! Error types for the backend module.

use thiserror::Error;

/// Errors that can occur while talking to a key/value backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The backend could not serve the request (network, lock, shutdown).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend does not implement an optional operation.
    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A blocking worker task failed.
    #[error("worker task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
