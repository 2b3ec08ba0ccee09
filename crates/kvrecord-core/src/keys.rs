//! Key scheme: where records and the index live in the flat backend
//! namespace.

use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// Record key prefix used by the deployed ledger layout.
pub const DEFAULT_RECORD_PREFIX: &str = "captcha_";

/// Index key used by the deployed ledger layout.
pub const DEFAULT_INDEX_KEY: &str = "captcha_keys";

/// Mapping from logical entries to backend keys.
///
/// Record keys are `record_prefix + id`. The index key may itself start
/// with the record prefix (it does in the default layout), so
/// [`KeyScheme::id_from_key`] always excludes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyScheme {
    pub record_prefix: String,
    pub index_key: String,
}

impl KeyScheme {
    pub fn new(record_prefix: impl Into<String>, index_key: impl Into<String>) -> Self {
        Self {
            record_prefix: record_prefix.into(),
            index_key: index_key.into(),
        }
    }

    /// The backend key holding the record `id`.
    pub fn record_key(&self, id: &RecordId) -> String {
        format!("{}{}", self.record_prefix, id)
    }

    /// Whether `id` would map onto the index key. Such an id never names a
    /// record.
    pub fn is_reserved(&self, id: &RecordId) -> bool {
        self.index_key
            .strip_prefix(&self.record_prefix)
            .is_some_and(|suffix| suffix == id.as_str())
    }

    /// Recover a record id from a backend key, if the key names a record.
    pub fn id_from_key(&self, key: &str) -> Option<RecordId> {
        if key == self.index_key {
            return None;
        }
        key.strip_prefix(&self.record_prefix)
            .and_then(|suffix| RecordId::new(suffix).ok())
    }
}

impl Default for KeyScheme {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_PREFIX, DEFAULT_INDEX_KEY)
    }
}
