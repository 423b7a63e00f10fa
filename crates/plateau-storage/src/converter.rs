//! Value converters between object references and storage identifiers.
//!
//! During serialization each kind registers an [`ObjectToIdConverter`];
//! during deserialization an [`IdToObjectConverter`]. The
//! [`ConverterRegistry`] selects one by the declared type of the source
//! field.

use std::collections::HashMap;
use std::rc::Rc;

use plateau_core::{DomainObject, FieldType, FieldValue, ObjectKey, PrimitiveData, RnId, RnRef};

use crate::data::SerializeData;
use crate::error::SerializeError;

/// Converts a single field value.
pub trait ValueConverter {
    fn convert(&self, value: FieldValue) -> Result<FieldValue, SerializeError>;
}

/// Converter lookup used by the graph rewriter.
pub trait DataConverter {
    /// Whether a converter is registered for values of type `ty`.
    fn contains(&self, ty: FieldType) -> bool;

    /// Converts `value`, declared as `ty`, with the registered converter.
    fn convert(&self, ty: FieldType, value: FieldValue) -> Result<FieldValue, SerializeError>;
}

/// Maps collected objects of one kind to their record identifiers.
pub struct ObjectToIdConverter<D: SerializeData> {
    table: HashMap<ObjectKey, RnId<D>>,
}

impl<D: SerializeData> ObjectToIdConverter<D> {
    pub fn new(table: HashMap<ObjectKey, RnId<D>>) -> Self {
        ObjectToIdConverter { table }
    }
}

impl<D: SerializeData> ValueConverter for ObjectToIdConverter<D> {
    fn convert(&self, value: FieldValue) -> Result<FieldValue, SerializeError> {
        let kind = <D as PrimitiveData>::KIND;
        match value {
            FieldValue::Object(None) => Ok(FieldValue::id(RnId::<D>::invalid())),
            FieldValue::Object(Some(object)) if object.kind() == kind => self
                .table
                .get(&object.key())
                .map(|&id| FieldValue::id(id))
                .ok_or(SerializeError::UnknownObject { kind }),
            other => Err(SerializeError::UnexpectedValue {
                expected: FieldType::Ref(kind),
                found: other.variant_name(),
            }),
        }
    }
}

/// Maps record identifiers of one kind back to restored objects.
pub struct IdToObjectConverter<D: SerializeData> {
    objects: Vec<RnRef<D::Object>>,
}

impl<D: SerializeData> IdToObjectConverter<D> {
    pub fn new(objects: Vec<RnRef<D::Object>>) -> Self {
        IdToObjectConverter { objects }
    }
}

impl<D: SerializeData> ValueConverter for IdToObjectConverter<D> {
    fn convert(&self, value: FieldValue) -> Result<FieldValue, SerializeError> {
        let kind = <D as PrimitiveData>::KIND;
        match value {
            FieldValue::Id(k, raw) if k == kind => {
                let id = RnId::<D>::new(raw);
                if id.is_null() {
                    return Ok(FieldValue::Object(None));
                }
                // Negative ids other than the sentinel have no index.
                id.index()
                    .and_then(|i| self.objects.get(i))
                    .map(|h| FieldValue::Object(Some(D::Object::into_object(h.clone()))))
                    .ok_or(SerializeError::UnknownId { kind, id: raw })
            }
            other => Err(SerializeError::UnexpectedValue {
                expected: FieldType::Id(kind),
                found: other.variant_name(),
            }),
        }
    }
}

/// Converters keyed by the declared type of the field they read.
#[derive(Default)]
pub struct ConverterRegistry {
    converters: HashMap<FieldType, Rc<dyn ValueConverter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `converter` for every type in `types`, replacing any
    /// previous registration.
    pub fn add_converter(&mut self, types: &[FieldType], converter: impl ValueConverter + 'static) {
        let converter: Rc<dyn ValueConverter> = Rc::new(converter);
        for &ty in types {
            self.converters.insert(ty, Rc::clone(&converter));
        }
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl DataConverter for ConverterRegistry {
    fn contains(&self, ty: FieldType) -> bool {
        self.converters.contains_key(&ty)
    }

    fn convert(&self, ty: FieldType, value: FieldValue) -> Result<FieldValue, SerializeError> {
        let converter = self
            .converters
            .get(&ty)
            .ok_or(SerializeError::NoConverter { ty })?;
        converter.convert(value)
    }
}
