//! Serialization of road-network graphs into flat, identifier-based storage.
//!
//! [`RoadNetworkSerializer`] turns a [`RoadNetworkModel`](plateau_core::RoadNetworkModel)
//! into a [`RoadNetworkStorage`] and back. Every reachable object of each of
//! the eight kinds gets one storage record; object references become typed
//! [`RnId`](plateau_core::RnId)s equal to the record's position.
//!
//! # Architecture
//!
//! One call runs in two phases over a [`ReferenceTable`](table):
//! - **Collect**: for each kind, find every distinct reachable object,
//!   allocate a blank counterpart and register the object/id converter.
//! - **Convert**: one pass copies every mapped field through the
//!   [`MemberReference`] of its type, translating references with the
//!   registered converters.
//!
//! # Modules
//!
//! - [`error`]: MappingError, SerializeError and StorageError
//! - [`data`]: storage records, primitive storage and the storage root
//! - [`member`]: declared storage-field to domain-field mappings
//! - [`converter`]: object/identifier value converters and their registry
//! - [`collect`]: reachability walk over the domain graph
//! - [`convert`]: field-by-field graph rewriting
//! - [`table`]: per-call reference table
//! - [`serializer`]: the serialize/deserialize facade
//! - [`validate`]: identifier validity checks on stored data
//! - [`hash`]: blake3 content hashing of storage snapshots
//! - [`traits`]: RoadNetworkStore trait definition
//! - [`memory`]: InMemoryStore implementation
//! - [`schema`]: SQL schema and migration setup
//! - [`sqlite`]: SqliteStore implementation

pub mod collect;
pub mod convert;
pub mod converter;
pub mod data;
pub mod error;
pub mod hash;
pub mod member;
pub mod memory;
pub mod schema;
pub mod serializer;
pub mod sqlite;
pub mod table;
pub mod traits;
pub mod types;
pub mod validate;

// Re-export key types for ergonomic use.
pub use data::{
    PrimitiveDataStorage, PrimitiveStorage, RoadNetworkDataBlock, RoadNetworkDataLane,
    RoadNetworkDataLineString, RoadNetworkDataLink, RoadNetworkDataNode, RoadNetworkDataPoint,
    RoadNetworkDataTrack, RoadNetworkDataWay, RoadNetworkStorage, SerializeData,
};
pub use error::{MappingError, SerializeError, StorageError};
pub use hash::hash_storage;
pub use member::{MemberBuilder, MemberPair, MemberReference};
pub use memory::InMemoryStore;
pub use serializer::RoadNetworkSerializer;
pub use sqlite::SqliteStore;
pub use traits::RoadNetworkStore;
pub use types::{RecordCounts, SnapshotSummary};
