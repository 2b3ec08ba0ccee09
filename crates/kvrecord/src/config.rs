//! Store configuration.

use std::time::Duration;

use kvrecord_core::{Encoding, KeyScheme};

/// How `create` appends a new id to the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexWriteMode {
    /// Read, append, write. Correct only when the backend orders writes to
    /// the same key; otherwise concurrent creates can drop each other's ids.
    #[default]
    LastWriterWins,
    /// Read, append, compare-and-swap against the bytes that were read,
    /// retrying on mismatch. Requires backend CAS support.
    CompareAndSwap { max_attempts: u32 },
}

/// Configuration for a [`RecordStore`](crate::RecordStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend key layout.
    pub keys: KeyScheme,
    /// Byte format of stored values.
    pub encoding: Encoding,
    /// Deadline for each individual backend call.
    pub call_timeout: Duration,
    /// Maximum concurrent record reads while listing.
    pub list_concurrency: usize,
    /// Index append strategy.
    pub index_write: IndexWriteMode,
    /// Id generations tried before giving up on collisions.
    pub max_id_attempts: u32,
    /// Ask the backend whether it is available before listing.
    pub check_availability: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            keys: KeyScheme::default(),
            encoding: Encoding::default(),
            call_timeout: Duration::from_secs(30),
            list_concurrency: 8,
            index_write: IndexWriteMode::default(),
            max_id_attempts: 3,
            check_availability: true,
        }
    }
}

impl StoreConfig {
    pub fn with_keys(mut self, keys: KeyScheme) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Values below 1 are raised to 1.
    pub fn with_list_concurrency(mut self, limit: usize) -> Self {
        self.list_concurrency = limit.max(1);
        self
    }

    pub fn with_index_write(mut self, mode: IndexWriteMode) -> Self {
        self.index_write = mode;
        self
    }

    pub fn with_max_id_attempts(mut self, attempts: u32) -> Self {
        self.max_id_attempts = attempts.max(1);
        self
    }

    pub fn with_availability_check(mut self, enabled: bool) -> Self {
        self.check_availability = enabled;
        self
    }
}
