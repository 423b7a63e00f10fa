//! Error types for plateau-storage.
//!
//! [`MappingError`] is raised while a member reference is being declared,
//! before any data is touched. [`SerializeError`] aborts a whole
//! serialize/deserialize call. [`StorageError`] covers persistence and
//! integrity of stored snapshots.

use plateau_core::{FieldError, FieldType, ObjectKind};
use thiserror::Error;

/// Errors in a storage-field to domain-field mapping declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A mapped storage field is not declared on the storage record.
    #[error("{storage_type} has no field '{field}'")]
    UnknownStorageField {
        storage_type: &'static str,
        field: &'static str,
    },

    /// The counterpart of a storage field does not exist on the domain type.
    #[error("{storage_type}.{storage_field}: {domain_type} has no field '{domain_field}'")]
    UnknownDomainField {
        storage_type: &'static str,
        storage_field: &'static str,
        domain_type: &'static str,
        domain_field: &'static str,
    },

    /// A storage field was mapped more than once.
    #[error("{storage_type}.{field} is mapped more than once")]
    DuplicateField {
        storage_type: &'static str,
        field: &'static str,
    },

    /// The two fields of a pair can never be converted into each other.
    #[error(
        "{storage_type}.{storage_field} ({storage_ty}) is not convertible to \
         {domain_type}.{domain_field} ({domain_ty})"
    )]
    Incompatible {
        storage_type: &'static str,
        storage_field: &'static str,
        storage_ty: FieldType,
        domain_type: &'static str,
        domain_field: &'static str,
        domain_ty: FieldType,
    },

    /// A replacement mapping was declared for a different pair of types.
    #[error("mapping for {kind} must pair {expected_storage} with {expected_domain}, got {storage_type} with {domain_type}")]
    WrongTypes {
        kind: ObjectKind,
        expected_storage: &'static str,
        expected_domain: &'static str,
        storage_type: &'static str,
        domain_type: &'static str,
    },
}

/// Errors that abort a serialize or deserialize call.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("member mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// No conversion rule applies to a mapped field.
    #[error("{type_name}.{field}: cannot convert {src_ty} to {dst_ty}")]
    Incompatible {
        type_name: &'static str,
        field: &'static str,
        src_ty: FieldType,
        dst_ty: FieldType,
    },

    /// Arrays are declarable but never converted element-wise.
    #[error("{type_name}.{field}: {ty} is not supported for serialization")]
    Unsupported {
        type_name: &'static str,
        field: &'static str,
        ty: FieldType,
    },

    /// A converter received a value of the wrong shape.
    #[error("converter for {expected} received a {found} value")]
    UnexpectedValue {
        expected: FieldType,
        found: &'static str,
    },

    /// No converter is registered for the given field type.
    #[error("no converter registered for {ty}")]
    NoConverter { ty: FieldType },

    /// An identifier does not name an allocated record of its kind.
    #[error("unknown {kind} identifier {id}")]
    UnknownId { kind: ObjectKind, id: i32 },

    /// A referenced object was never collected.
    #[error("{kind} object was not collected from the model")]
    UnknownObject { kind: ObjectKind },

    /// A mapped source field could not be read.
    #[error("{type_name} did not return a value for '{field}'")]
    MissingValue {
        type_name: &'static str,
        field: &'static str,
    },

    /// More records of one kind than identifiers can address.
    #[error("too many {kind} records for the identifier range")]
    TooManyRecords { kind: ObjectKind },

    /// A custom collection order was not a permutation of all kinds.
    #[error("invalid collection order: {reason}")]
    InvalidOrder { reason: String },

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Errors produced by storage validation and persistence backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLite reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// No snapshot is stored under the given name.
    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),

    /// A record field holds an identifier outside its target storage.
    #[error("{record_type}[{index}].{field}: {kind} identifier {id} is out of range ({len} records)")]
    DanglingId {
        record_type: &'static str,
        index: usize,
        field: &'static str,
        kind: ObjectKind,
        id: i32,
        len: usize,
    },

    /// A coordinate or float field is NaN or infinite and cannot be stored.
    #[error("{record_type}[{index}].{field}: value {value} is not finite")]
    NonFiniteValue {
        record_type: &'static str,
        index: usize,
        field: &'static str,
        value: String,
    },

    /// Stored content does not match its recorded hash.
    #[error("snapshot '{name}' is corrupt: expected hash {expected}, found {actual}")]
    HashMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}
