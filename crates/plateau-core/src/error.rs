//! Error types for field access on domain objects and storage records.

use thiserror::Error;

/// Errors produced when reading or writing a declared field by name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The type declares no field with this name.
    #[error("{type_name} has no field '{field}'")]
    UnknownField {
        type_name: &'static str,
        field: String,
    },

    /// The value handed to a field does not match the field's declared type.
    #[error("{type_name}.{field}: expected {expected} value, found {found}")]
    ValueMismatch {
        type_name: &'static str,
        field: String,
        expected: String,
        found: &'static str,
    },

    /// A null reference was written into a list that only holds live objects.
    #[error("{type_name}.{field}: null reference in a non-nullable list")]
    NullInList {
        type_name: &'static str,
        field: String,
    },
}
