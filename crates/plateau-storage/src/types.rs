//! Storage-layer types for snapshot identity and metadata.
//!
//! Snapshots are named: a name only exists once a storage has been saved,
//! so naming is a storage concern and lives here rather than in plateau-core.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use plateau_core::ObjectKind;

use crate::data::RoadNetworkStorage;
use crate::error::StorageError;
use crate::hash::hash_storage;

/// Number of stored records per kind. Kinds without records are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordCounts(BTreeMap<ObjectKind, usize>);

impl RecordCounts {
    pub fn of(storage: &RoadNetworkStorage) -> Self {
        let mut counts = RecordCounts::default();
        for kind in ObjectKind::ALL {
            counts.set(kind, storage.len_of(kind));
        }
        counts
    }

    pub fn get(&self, kind: ObjectKind) -> usize {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn set(&mut self, kind: ObjectKind, count: usize) {
        if count == 0 {
            self.0.remove(&kind);
        } else {
            self.0.insert(kind, count);
        }
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectKind, usize)> + '_ {
        self.0.iter().map(|(&kind, &count)| (kind, count))
    }
}

impl fmt::Display for RecordCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("empty");
        }
        let mut first = true;
        for (kind, count) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", count, kind)?;
            first = false;
        }
        Ok(())
    }
}

/// Summary of a stored snapshot (for listing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    /// Snapshot name.
    pub name: String,
    /// Hex blake3 hash of the stored content.
    pub hash: String,
    /// Records per kind.
    pub record_counts: RecordCounts,
}

/// A storage encoded for persistence, with the metadata every backend keeps.
#[derive(Debug, Clone)]
pub(crate) struct EncodedSnapshot {
    pub json: String,
    pub hash: String,
    pub counts: RecordCounts,
}

impl EncodedSnapshot {
    /// Validates and encodes `storage`. Invalid storage is never persisted.
    pub fn encode(storage: &RoadNetworkStorage) -> Result<Self, StorageError> {
        storage.validate()?;
        Ok(EncodedSnapshot {
            json: storage.to_json()?,
            hash: hash_storage(storage)?.to_hex().to_string(),
            counts: RecordCounts::of(storage),
        })
    }

    /// Decodes stored content, checking it against the hash recorded at
    /// save time.
    pub fn decode(name: &str, json: &str, expected_hash: &str) -> Result<RoadNetworkStorage, StorageError> {
        let storage = RoadNetworkStorage::from_json(json)?;
        let actual = hash_storage(&storage)?.to_hex().to_string();
        if actual != expected_hash {
            return Err(StorageError::HashMismatch {
                name: name.to_string(),
                expected: expected_hash.to_string(),
                actual,
            });
        }
        storage.validate()?;
        Ok(storage)
    }

    pub fn summary(&self, name: &str) -> SnapshotSummary {
        SnapshotSummary {
            name: name.to_string(),
            hash: self.hash.clone(),
            record_counts: self.counts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RoadNetworkDataLink, RoadNetworkDataNode};
    use plateau_core::RnId;

    #[test]
    fn test_counts_skip_empty_kinds() {
        let mut storage = RoadNetworkStorage::default();
        storage
            .primitive_data_storage
            .nodes
            .write_new(vec![RoadNetworkDataNode::default(); 2])
            .unwrap();
        let counts = RecordCounts::of(&storage);
        assert_eq!(counts.get(ObjectKind::Node), 2);
        assert_eq!(counts.get(ObjectKind::Link), 0);
        assert_eq!(counts.total(), 2);
        assert_eq!(counts.to_string(), "2 Node");
        assert_eq!(serde_json::to_string(&counts).unwrap(), r#"{"Node":2}"#);
        assert_eq!(RecordCounts::default().to_string(), "empty");
    }

    #[test]
    fn test_encode_rejects_dangling_ids() {
        let mut storage = RoadNetworkStorage::default();
        storage
            .primitive_data_storage
            .links
            .write_new(vec![RoadNetworkDataLink {
                prev_node: RnId::new(0),
                ..RoadNetworkDataLink::default()
            }])
            .unwrap();
        let err = EncodedSnapshot::encode(&storage).unwrap_err();
        assert!(matches!(err, StorageError::DanglingId { .. }));
    }

    #[test]
    fn test_decode_detects_tampering() {
        let storage = RoadNetworkStorage::default();
        let encoded = EncodedSnapshot::encode(&storage).unwrap();
        let back = EncodedSnapshot::decode("s", &encoded.json, &encoded.hash).unwrap();
        assert_eq!(back, storage);

        let err = EncodedSnapshot::decode("s", &encoded.json, "00").unwrap_err();
        assert!(matches!(err, StorageError::HashMismatch { ref name, .. } if name == "s"));
    }
}
