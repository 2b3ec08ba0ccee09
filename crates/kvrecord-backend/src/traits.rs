//! Backend trait: the abstract interface to a flat key/value service.
//!
//! The record store is built entirely on these calls. A backend offers no
//! multi-key atomicity and no server-side querying; every call may be slow
//! and may fail independently.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{BackendError, Result};

/// Outcome of a compare-and-swap write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// The stored value matched and was replaced.
    Swapped,
    /// The stored value differed; nothing was written.
    Mismatch {
        /// The value currently stored (empty if absent).
        current: Bytes,
    },
}

/// Async interface to a key/value backend.
///
/// Empty bytes signify an absent key, both on read and on write.
///
/// # Required operations
///
/// - [`read`](Backend::read) and [`write`](Backend::write).
///
/// # Optional operations
///
/// - [`compare_and_swap`](Backend::compare_and_swap) for conflict-free index
///   updates on backends that do not serialize writes per key.
/// - [`scan_keys`](Backend::scan_keys) for orphan diagnostics.
/// - [`is_available`](Backend::is_available) as a cheap health check.
///
/// The defaults report `Unsupported` (or available, for the health check).
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Read the value at `key`. Absent keys read as empty bytes.
    async fn read(&self, key: &str) -> Result<Bytes>;

    /// Write `value` at `key`. Returns once the write is acknowledged.
    async fn write(&self, key: &str, value: Bytes) -> Result<()>;

    /// Write `new` at `key` only if the stored value equals `expected`.
    async fn compare_and_swap(&self, key: &str, expected: Bytes, new: Bytes) -> Result<CasOutcome> {
        let _ = (key, expected, new);
        Err(BackendError::Unsupported("compare_and_swap"))
    }

    /// Whether [`compare_and_swap`](Backend::compare_and_swap) is implemented.
    fn supports_compare_and_swap(&self) -> bool {
        false
    }

    /// List every key starting with `prefix`, in ascending order.
    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let _ = prefix;
        Err(BackendError::Unsupported("scan_keys"))
    }

    /// Whether the backend is currently able to serve requests.
    async fn is_available(&self) -> Result<bool> {
        Ok(true)
    }
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    async fn read(&self, key: &str) -> Result<Bytes> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, value: Bytes) -> Result<()> {
        (**self).write(key, value).await
    }

    async fn compare_and_swap(&self, key: &str, expected: Bytes, new: Bytes) -> Result<CasOutcome> {
        (**self).compare_and_swap(key, expected, new).await
    }

    fn supports_compare_and_swap(&self) -> bool {
        (**self).supports_compare_and_swap()
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).scan_keys(prefix).await
    }

    async fn is_available(&self) -> Result<bool> {
        (**self).is_available().await
    }
}
