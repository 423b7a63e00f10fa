//! Validity checks on stored data: identifiers resolve and numbers are
//! finite.

use plateau_core::{FieldType, FieldValue, ObjectKind, PrimitiveData};

use crate::data::{PrimitiveDataStorage, PrimitiveStorage, RoadNetworkStorage};
use crate::error::StorageError;

impl RoadNetworkStorage {
    /// Checks that every identifier in every record is either the null
    /// sentinel or the position of an existing record of its kind, and that
    /// every coordinate and float field is finite. Non-finite numbers have no
    /// JSON form, so a storage holding one could be saved but never loaded.
    pub fn validate(&self) -> Result<(), StorageError> {
        let data = &self.primitive_data_storage;
        check(&data.points, data)?;
        check(&data.line_strings, data)?;
        check(&data.links, data)?;
        check(&data.lanes, data)?;
        check(&data.tracks, data)?;
        check(&data.blocks, data)?;
        check(&data.nodes, data)?;
        check(&data.ways, data)?;
        Ok(())
    }
}

fn check<D: PrimitiveData>(
    records: &PrimitiveStorage<D>,
    data: &PrimitiveDataStorage,
) -> Result<(), StorageError> {
    let schema = D::schema();
    for (index, record) in records.data_list().iter().enumerate() {
        for decl in schema.fields.iter() {
            let Some(value) = record.get_field(decl.name) else {
                continue;
            };
            if matches!(decl.ty, FieldType::Vector3 | FieldType::Float) {
                check_finite(&value).map_err(|value| StorageError::NonFiniteValue {
                    record_type: schema.type_name,
                    index,
                    field: decl.name,
                    value,
                })?;
                continue;
            }
            if !decl.ty.holds_ids() {
                continue;
            }
            check_value(&value, data).map_err(|(kind, id)| StorageError::DanglingId {
                record_type: schema.type_name,
                index,
                field: decl.name,
                kind,
                id,
                len: data.len_of(kind),
            })?;
        }
    }
    Ok(())
}

fn check_value(
    value: &FieldValue,
    data: &PrimitiveDataStorage,
) -> Result<(), (ObjectKind, i32)> {
    match *value {
        FieldValue::Id(kind, raw) => {
            let resolves = usize::try_from(raw).is_ok_and(|i| i < data.len_of(kind));
            if raw == -1 || resolves {
                Ok(())
            } else {
                Err((kind, raw))
            }
        }
        FieldValue::List(ref items) => items.iter().try_for_each(|item| check_value(item, data)),
        _ => Ok(()),
    }
}

fn check_finite(value: &FieldValue) -> Result<(), String> {
    match *value {
        FieldValue::Vector3(v) if !v.is_finite() => Err(v.to_string()),
        FieldValue::Float(f) if !f.is_finite() => Err(f.to_string()),
        _ => Ok(()),
    }
}
