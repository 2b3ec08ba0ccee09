//! Index: the set of every known record id.
//!
//! The backend has no query support, so the index is the only way to
//! discover records. It only ever grows.

use std::collections::HashSet;

use crate::types::RecordId;

/// Insertion-ordered set of record ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    ids: Vec<RecordId>,
    seen: HashSet<RecordId>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a sequence, keeping the first occurrence of
    /// each id.
    pub fn from_ids(ids: impl IntoIterator<Item = RecordId>) -> Self {
        let mut index = Self::new();
        for id in ids {
            index.insert(id);
        }
        index
    }

    /// Append `id`. Returns `false` if it was already present.
    pub fn insert(&mut self, id: RecordId) -> bool {
        if !self.seen.insert(id.clone()) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.ids.iter()
    }

    pub fn as_slice(&self) -> &[RecordId] {
        &self.ids
    }

    pub fn into_ids(self) -> Vec<RecordId> {
        self.ids
    }
}

impl FromIterator<RecordId> for Index {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}
