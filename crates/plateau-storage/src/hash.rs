//! Deterministic content hashing for storage snapshots using blake3.
//!
//! Records hold only `Vec`s, scalars and strings, so `serde_json::to_vec`
//! yields the same bytes for the same content. The whole-storage hash
//! composes the per-kind hashes in [`ObjectKind::ALL`] order, which lets a
//! caller tell which kinds changed between two snapshots.

use plateau_core::ObjectKind;
use serde::Serialize;

use crate::data::{PrimitiveDataStorage, RoadNetworkStorage};
use crate::error::StorageError;

fn hash_json<T: Serialize + ?Sized>(value: &T) -> Result<blake3::Hash, StorageError> {
    let bytes = serde_json::to_vec(value)?;
    Ok(blake3::hash(&bytes))
}

/// Hash of the records of one kind.
pub fn hash_kind(data: &PrimitiveDataStorage, kind: ObjectKind) -> Result<blake3::Hash, StorageError> {
    match kind {
        ObjectKind::Point => hash_json(&data.points),
        ObjectKind::LineString => hash_json(&data.line_strings),
        ObjectKind::Link => hash_json(&data.links),
        ObjectKind::Lane => hash_json(&data.lanes),
        ObjectKind::Track => hash_json(&data.tracks),
        ObjectKind::Block => hash_json(&data.blocks),
        ObjectKind::Node => hash_json(&data.nodes),
        ObjectKind::Way => hash_json(&data.ways),
    }
}

/// Hash of a whole storage snapshot.
pub fn hash_storage(storage: &RoadNetworkStorage) -> Result<blake3::Hash, StorageError> {
    let mut hasher = blake3::Hasher::new();
    for kind in ObjectKind::ALL {
        let kind_hash = hash_kind(&storage.primitive_data_storage, kind)?;
        hasher.update(kind.name().as_bytes());
        hasher.update(kind_hash.as_bytes());
    }
    Ok(hasher.finalize())
}
