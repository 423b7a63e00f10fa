//! The [`RoadNetworkStore`] trait defining the storage contract for
//! road-network snapshots.
//!
//! A snapshot is one [`RoadNetworkStorage`] saved under a name. Backends
//! implement the four snapshot operations; saving and loading whole models
//! are provided on top of them through a [`RoadNetworkSerializer`].
//!
//! All backends (InMemoryStore, SqliteStore) implement this trait and are
//! interchangeable.

use plateau_core::RoadNetworkModel;

use crate::data::RoadNetworkStorage;
use crate::error::StorageError;
use crate::serializer::RoadNetworkSerializer;
use crate::types::SnapshotSummary;

/// The storage contract for road-network snapshots.
///
/// The trait is synchronous; a store is owned by one caller at a time.
pub trait RoadNetworkStore {
    /// Saves `storage` under `name`, replacing any snapshot with that name.
    ///
    /// Storage with dangling identifiers is rejected before anything is
    /// written.
    fn save(&mut self, name: &str, storage: &RoadNetworkStorage) -> Result<SnapshotSummary, StorageError>;

    /// Loads the snapshot saved under `name`.
    ///
    /// Fails with [`StorageError::HashMismatch`] if the stored content no
    /// longer matches the hash recorded when it was saved.
    fn load(&self, name: &str) -> Result<RoadNetworkStorage, StorageError>;

    /// Deletes the snapshot saved under `name`.
    fn delete(&mut self, name: &str) -> Result<(), StorageError>;

    /// Lists all snapshots, ordered by name.
    fn list(&self) -> Result<Vec<SnapshotSummary>, StorageError>;

    // -------------------------------------------------------------------
    // High-level convenience methods
    // -------------------------------------------------------------------

    /// Serializes `model` and saves it under `name`.
    fn save_model(
        &mut self,
        name: &str,
        model: &RoadNetworkModel,
        serializer: &RoadNetworkSerializer,
    ) -> Result<SnapshotSummary, StorageError> {
        let storage = serializer.serialize(model)?;
        self.save(name, &storage)
    }

    /// Loads the snapshot saved under `name` and rebuilds its model.
    fn load_model(
        &self,
        name: &str,
        serializer: &RoadNetworkSerializer,
    ) -> Result<RoadNetworkModel, StorageError> {
        let storage = self.load(name)?;
        Ok(serializer.deserialize(&storage)?)
    }
}
