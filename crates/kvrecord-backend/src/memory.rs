//! In-memory implementation of the Backend trait.
//!
//! Primarily for tests and single-process use. Writes to one key are
//! serialized by the lock, so this backend behaves like a ledger that
//! orders writes per key.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{BackendError, Result};
use crate::traits::{Backend, CasOutcome};

/// In-memory key/value backend.
///
/// All data is lost when the backend is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Bytes>>> {
        self.entries
            .read()
            .map_err(|e| BackendError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Bytes>>> {
        self.entries
            .write()
            .map_err(|e| BackendError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

fn put(entries: &mut BTreeMap<String, Bytes>, key: &str, value: Bytes) {
    if value.is_empty() {
        entries.remove(key);
    } else {
        entries.insert(key.to_string(), value);
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Bytes> {
        let entries = self.read_guard()?;
        Ok(entries.get(key).cloned().unwrap_or_default())
    }

    async fn write(&self, key: &str, value: Bytes) -> Result<()> {
        let mut entries = self.write_guard()?;
        put(&mut entries, key, value);
        Ok(())
    }

    fn supports_compare_and_swap(&self) -> bool {
        true
    }

    async fn compare_and_swap(&self, key: &str, expected: Bytes, new: Bytes) -> Result<CasOutcome> {
        let mut entries = self.write_guard()?;
        let current = entries.get(key).cloned().unwrap_or_default();
        if current != expected {
            return Ok(CasOutcome::Mismatch { current });
        }
        put(&mut entries, key, new);
        Ok(CasOutcome::Swapped)
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.read_guard()?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
