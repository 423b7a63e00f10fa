//! Declared mappings between storage-record fields and domain-object fields.
//!
//! A [`MemberReference`] lists, for one storage record type, which of its
//! fields carries which field of the paired domain type. It is built once
//! through [`MemberBuilder`], validated against both schemas at that point,
//! and can be flipped with [`MemberReference::reversed`] for the opposite
//! direction.

use std::collections::HashSet;

use plateau_core::{FieldDecl, Fields, Schema};

use crate::data::SerializeData;
use crate::error::MappingError;

/// One mapped field: read `src`, write `dst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberPair {
    pub src: FieldDecl,
    pub dst: FieldDecl,
}

/// Field mapping between a source type and a destination type.
///
/// As built, the source is the domain type and the destination is the
/// storage record type (the serialize direction).
#[derive(Debug, Clone)]
pub struct MemberReference {
    src_type: &'static Schema,
    dst_type: &'static Schema,
    pairs: Vec<MemberPair>,
}

impl MemberReference {
    /// Builds the mapping declared by the record type `D`.
    pub fn create<D: SerializeData>() -> Result<Self, MappingError> {
        let builder = MemberReference::builder(D::schema(), <D::Object as Fields>::schema());
        D::declare_members(builder).build()
    }

    /// Starts a mapping declaration between a storage record schema and a
    /// domain object schema.
    pub fn builder(storage: &'static Schema, domain: &'static Schema) -> MemberBuilder {
        MemberBuilder {
            storage,
            domain,
            entries: Vec::new(),
        }
    }

    pub fn src_type(&self) -> &'static Schema {
        self.src_type
    }

    pub fn dst_type(&self) -> &'static Schema {
        self.dst_type
    }

    pub fn pairs(&self) -> &[MemberPair] {
        &self.pairs
    }

    /// The same mapping with source and destination swapped.
    pub fn reversed(&self) -> Self {
        MemberReference {
            src_type: self.dst_type,
            dst_type: self.src_type,
            pairs: self
                .pairs
                .iter()
                .map(|p| MemberPair {
                    src: p.dst,
                    dst: p.src,
                })
                .collect(),
        }
    }
}

/// Collects `(storage field, domain field)` declarations for one record type.
#[derive(Debug, Clone)]
pub struct MemberBuilder {
    storage: &'static Schema,
    domain: &'static Schema,
    entries: Vec<(&'static str, &'static str)>,
}

impl MemberBuilder {
    /// Maps `storage_field` on the record to `domain_field` on the object.
    pub fn map(mut self, storage_field: &'static str, domain_field: &'static str) -> Self {
        self.entries.push((storage_field, domain_field));
        self
    }

    /// Maps a field that has the same name on both sides.
    pub fn same(self, field: &'static str) -> Self {
        self.map(field, field)
    }

    /// Validates every declaration and produces the mapping.
    pub fn build(self) -> Result<MemberReference, MappingError> {
        let storage_type = self.storage.type_name;
        let domain_type = self.domain.type_name;
        let mut seen = HashSet::new();
        let mut pairs = Vec::with_capacity(self.entries.len());

        for (storage_field, domain_field) in self.entries {
            if !seen.insert(storage_field) {
                return Err(MappingError::DuplicateField {
                    storage_type,
                    field: storage_field,
                });
            }
            let dst = *self
                .storage
                .field(storage_field)
                .ok_or(MappingError::UnknownStorageField {
                    storage_type,
                    field: storage_field,
                })?;
            let src = *self
                .domain
                .field(domain_field)
                .ok_or(MappingError::UnknownDomainField {
                    storage_type,
                    storage_field,
                    domain_type,
                    domain_field,
                })?;
            if !src.ty.is_convertible_to(dst.ty) {
                return Err(MappingError::Incompatible {
                    storage_type,
                    storage_field,
                    storage_ty: dst.ty,
                    domain_type,
                    domain_field,
                    domain_ty: src.ty,
                });
            }
            pairs.push(MemberPair { src, dst });
        }

        Ok(MemberReference {
            src_type: self.domain,
            dst_type: self.storage,
            pairs,
        })
    }
}
