//! Field-by-field rewriting of one object into another.
//!
//! For every mapped pair the source field's value is read and written to the
//! destination field according to the first rule that applies:
//!
//! 1. identical declared types: copied unchanged;
//! 2. a converter is registered for the source type: converted;
//! 3. array to array: rejected as unsupported;
//! 4. list to list: each element converted with the element converter;
//! 5. anything else: rejected as incompatible.

use plateau_core::{FieldType, FieldValue, Fields};

use crate::converter::DataConverter;
use crate::error::SerializeError;
use crate::member::{MemberPair, MemberReference};

/// Writes every mapped field of `src` into `dst`.
pub fn convert(
    src: &dyn Fields,
    dst: &mut dyn Fields,
    member: &MemberReference,
    converter: &dyn DataConverter,
) -> Result<(), SerializeError> {
    for pair in member.pairs() {
        let value = src
            .get_field(pair.src.name)
            .ok_or(SerializeError::MissingValue {
                type_name: member.src_type().type_name,
                field: pair.src.name,
            })?;
        let value = convert_value(pair, member, value, converter)?;
        dst.set_field(pair.dst.name, value)?;
    }
    Ok(())
}

fn convert_value(
    pair: &MemberPair,
    member: &MemberReference,
    value: FieldValue,
    converter: &dyn DataConverter,
) -> Result<FieldValue, SerializeError> {
    let (src_ty, dst_ty) = (pair.src.ty, pair.dst.ty);

    if src_ty == dst_ty {
        return Ok(value);
    }
    if converter.contains(src_ty) {
        return converter.convert(src_ty, value);
    }
    match (src_ty, dst_ty) {
        (FieldType::Array(_), FieldType::Array(_)) => Err(SerializeError::Unsupported {
            type_name: member.src_type().type_name,
            field: pair.src.name,
            ty: src_ty,
        }),
        (FieldType::List(elem), FieldType::List(_)) => match value {
            FieldValue::List(items) => items
                .into_iter()
                .map(|item| converter.convert(*elem, item))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::List),
            other => Err(SerializeError::UnexpectedValue {
                expected: src_ty,
                found: other.variant_name(),
            }),
        },
        _ => Err(SerializeError::Incompatible {
            type_name: member.src_type().type_name,
            field: pair.src.name,
            src_ty,
            dst_ty,
        }),
    }
}
