//! Shared reconciliation table.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::observability::metrics;
use crate::reconcile::record::ProcessingRecord;

/// A concurrent map from record identity to [`ProcessingRecord`].
///
/// Both producers (action loop, subscription listener) write through
/// [`upsert_merge`](Self::upsert_merge); the janitor reads a snapshot and
/// deletes from the live map. Per-key atomicity comes from the map's entry
/// API, so concurrent upserts for one identity cannot interleave while
/// different identities proceed independently.
#[derive(Clone, Default)]
pub struct ReconcileTable {
    inner: Arc<DashMap<String, ProcessingRecord>>,
}

impl ReconcileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the record, or merge it into the existing entry for its
    /// identity. At most one logical entry per identity survives however
    /// many producers write concurrently.
    pub fn upsert_merge(&self, incoming: ProcessingRecord) {
        let identity = incoming.identity();
        match self.inner.entry(identity) {
            Entry::Occupied(mut entry) => entry.get_mut().merge(&incoming),
            Entry::Vacant(entry) => {
                entry.insert(incoming);
            }
        }
        metrics::record_table_size(self.inner.len());
    }

    /// Point-in-time copy of all entries. The snapshot is read-only; any
    /// deletion must go through [`remove`](Self::remove) so it targets the
    /// live map.
    pub fn snapshot(&self) -> Vec<(String, ProcessingRecord)> {
        self.inner
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Remove an entry from the live map by identity.
    pub fn remove(&self, identity: &str) -> Option<ProcessingRecord> {
        let removed = self.inner.remove(identity).map(|(_, record)| record);
        metrics::record_table_size(self.inner.len());
        removed
    }

    /// Clone of the entry for an identity, if present.
    pub fn get(&self, identity: &str) -> Option<ProcessingRecord> {
        self.inner.get(identity).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
