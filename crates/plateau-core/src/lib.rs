//! Road-network domain model for the PLATEAU city toolkit.
//!
//! The road network is a graph of interlinked objects of eight kinds
//! (points, line strings, ways, lanes, blocks, links, tracks and nodes).
//! Objects are shared through [`RnRef`] handles whose identity is the
//! allocation itself, so the same lane reached through two links is the
//! same lane.
//!
//! # Modules
//!
//! - [`id`]: typed storage identifiers ([`RnId`])
//! - [`handle`]: shared object handles with pointer identity
//! - [`fields`]: static field declarations used instead of reflection
//! - [`kind`]: the closed set of object kinds and a tagged handle over them
//! - [`model`]: the eight domain object types and [`RoadNetworkModel`]
//! - [`vector`]: plain 3D vector
//! - [`error`]: field access errors

pub mod error;
pub mod fields;
pub mod handle;
pub mod id;
pub mod kind;
pub mod model;
pub mod vector;

// Re-export commonly used types
pub use error::FieldError;
pub use fields::{FieldDecl, FieldSlot, FieldType, FieldValue, Fields, PrimitiveData, Schema};
pub use handle::{ObjectKey, RnRef, RnWeak};
pub use id::RnId;
pub use kind::{DomainObject, ObjectKind, ObjectRef};
pub use model::{
    RoadNetworkBlock, RoadNetworkLane, RoadNetworkLineString, RoadNetworkLink, RoadNetworkModel,
    RoadNetworkNode, RoadNetworkPoint, RoadNetworkTrack, RoadNetworkWay,
};
pub use vector::Vector3;
