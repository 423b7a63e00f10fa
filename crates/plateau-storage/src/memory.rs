//! In-memory implementation of [`RoadNetworkStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests and one-off
//! conversions. It keeps each snapshot encoded exactly as the SQLite backend
//! does, so both backends share the same validation and hash checks.

use std::collections::BTreeMap;

use crate::data::RoadNetworkStorage;
use crate::error::StorageError;
use crate::traits::RoadNetworkStore;
use crate::types::{EncodedSnapshot, SnapshotSummary};

/// In-memory snapshot store keyed by name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    snapshots: BTreeMap<String, EncodedSnapshot>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn get(&self, name: &str) -> Result<&EncodedSnapshot, StorageError> {
        self.snapshots
            .get(name)
            .ok_or_else(|| StorageError::SnapshotNotFound(name.to_string()))
    }

    /// Replaces the stored content of `name` without updating its hash.
    #[cfg(test)]
    fn tamper(&mut self, name: &str, json: String) {
        if let Some(snapshot) = self.snapshots.get_mut(name) {
            snapshot.json = json;
        }
    }
}

impl RoadNetworkStore for InMemoryStore {
    fn save(&mut self, name: &str, storage: &RoadNetworkStorage) -> Result<SnapshotSummary, StorageError> {
        let encoded = EncodedSnapshot::encode(storage)?;
        let summary = encoded.summary(name);
        self.snapshots.insert(name.to_string(), encoded);
        tracing::info!("saved snapshot '{}' ({})", name, summary.record_counts);
        Ok(summary)
    }

    fn load(&self, name: &str) -> Result<RoadNetworkStorage, StorageError> {
        let snapshot = self.get(name)?;
        EncodedSnapshot::decode(name, &snapshot.json, &snapshot.hash)
    }

    fn delete(&mut self, name: &str) -> Result<(), StorageError> {
        self.snapshots
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::SnapshotNotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<SnapshotSummary>, StorageError> {
        Ok(self
            .snapshots
            .iter()
            .map(|(name, snapshot)| snapshot.summary(name))
            .collect())
    }
}
