//! Static field declarations for domain objects and storage records.
//!
//! Every serializable type publishes a [`Schema`]: the ordered list of its
//! fields with their [`FieldType`]. Values travel between objects as
//! [`FieldValue`]s through the [`Fields`] trait, which each type implements
//! explicitly. This is the whole of the "reflection" the serializer needs:
//! field lookup by name and a tagged value.

use std::fmt;

use crate::error::FieldError;
use crate::handle::{RnRef, RnWeak};
use crate::id::RnId;
use crate::kind::{DomainObject, ObjectKind, ObjectRef};
use crate::vector::Vector3;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Vector3,
    Text,
    /// Strong, nullable reference to a domain object.
    Ref(ObjectKind),
    /// Weak back-reference to a domain object.
    WeakRef(ObjectKind),
    /// Typed identifier of a storage record.
    Id(ObjectKind),
    /// Ordered, growable sequence.
    List(&'static FieldType),
    /// Fixed-size array. Declarable, but never converted element-wise.
    Array(&'static FieldType),
}

impl FieldType {
    /// Element type of a list or array.
    pub fn element(self) -> Option<FieldType> {
        match self {
            FieldType::List(elem) | FieldType::Array(elem) => Some(*elem),
            _ => None,
        }
    }

    /// Kind referenced by a reference or identifier type.
    pub fn referenced_kind(self) -> Option<ObjectKind> {
        match self {
            FieldType::Ref(kind) | FieldType::WeakRef(kind) | FieldType::Id(kind) => Some(kind),
            _ => None,
        }
    }

    /// True for reference types, or sequences of them, on the domain side.
    pub fn holds_references(self) -> bool {
        match self {
            FieldType::Ref(_) | FieldType::WeakRef(_) => true,
            FieldType::List(elem) | FieldType::Array(elem) => elem.holds_references(),
            _ => false,
        }
    }

    /// True for identifier types, or sequences of them, on the storage side.
    pub fn holds_ids(self) -> bool {
        match self {
            FieldType::Id(_) => true,
            FieldType::List(elem) | FieldType::Array(elem) => elem.holds_ids(),
            _ => false,
        }
    }

    /// Structural compatibility between a field and its dual field.
    ///
    /// Identical types are compatible; a reference and an identifier of the
    /// same kind are compatible in either direction; two sequences are
    /// compatible when their elements are.
    pub fn is_convertible_to(self, other: FieldType) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (FieldType::Ref(a) | FieldType::WeakRef(a), FieldType::Id(b))
            | (FieldType::Id(a), FieldType::Ref(b) | FieldType::WeakRef(b)) => a == b,
            (FieldType::List(a), FieldType::List(b)) | (FieldType::Array(a), FieldType::Array(b)) => {
                a.is_convertible_to(*b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => f.write_str("bool"),
            FieldType::Int => f.write_str("int"),
            FieldType::Float => f.write_str("float"),
            FieldType::Vector3 => f.write_str("Vector3"),
            FieldType::Text => f.write_str("text"),
            FieldType::Ref(kind) => write!(f, "Ref<{}>", kind),
            FieldType::WeakRef(kind) => write!(f, "WeakRef<{}>", kind),
            FieldType::Id(kind) => write!(f, "RnId<{}>", kind),
            FieldType::List(elem) => write!(f, "List<{}>", elem),
            FieldType::Array(elem) => write!(f, "[{}]", elem),
        }
    }
}

/// One declared field: name and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldDecl {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        FieldDecl { name, ty }
    }
}

/// The declared field table of one type.
#[derive(Debug)]
pub struct Schema {
    pub type_name: &'static str,
    pub fields: &'static [FieldDecl],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A field value in transit.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vector3(Vector3),
    Text(String),
    /// A strong or weak reference; `None` is null.
    Object(Option<ObjectRef>),
    /// A raw identifier of a record of the given kind.
    Id(ObjectKind, i32),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Short name of the variant, for error messages.
    pub fn variant_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Vector3(_) => "Vector3",
            FieldValue::Text(_) => "text",
            FieldValue::Object(_) => "object reference",
            FieldValue::Id(..) => "identifier",
            FieldValue::List(_) => "list",
        }
    }

    pub fn object<T: DomainObject>(handle: Option<&RnRef<T>>) -> Self {
        FieldValue::Object(handle.map(|h| T::into_object(h.clone())))
    }

    pub fn weak<T: DomainObject>(handle: &RnWeak<T>) -> Self {
        FieldValue::Object(handle.upgrade().map(T::into_object))
    }

    pub fn objects<T: DomainObject>(handles: &[RnRef<T>]) -> Self {
        FieldValue::List(handles.iter().map(|h| Self::object(Some(h))).collect())
    }

    pub fn weaks<T: DomainObject>(handles: &[RnWeak<T>]) -> Self {
        FieldValue::List(handles.iter().map(Self::weak).collect())
    }

    pub fn id<D: PrimitiveData>(id: RnId<D>) -> Self {
        FieldValue::Id(D::KIND, id.raw())
    }

    pub fn ids<D: PrimitiveData>(ids: &[RnId<D>]) -> Self {
        FieldValue::List(ids.iter().map(|&id| Self::id(id)).collect())
    }
}

/// Field access by name.
///
/// `get_field` returns `None` for an undeclared name; `set_field` rejects
/// undeclared names and values of the wrong shape.
pub trait Fields {
    fn schema() -> &'static Schema
    where
        Self: Sized;

    /// Schema of the concrete type behind a trait object.
    fn type_schema(&self) -> &'static Schema;

    fn get_field(&self, name: &str) -> Option<FieldValue>;

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError>;
}

/// A storage record type, tagged with the kind of domain object it stores.
pub trait PrimitiveData: Fields + Default + Clone + 'static {
    const KIND: ObjectKind;
}

/// Unpacks a [`FieldValue`] into a concrete field type, producing errors
/// that name the owning type and field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSlot<'a> {
    type_name: &'static str,
    field: &'a str,
}

impl<'a> FieldSlot<'a> {
    pub fn new(schema: &'static Schema, field: &'a str) -> Self {
        FieldSlot {
            type_name: schema.type_name,
            field,
        }
    }

    pub fn unknown(&self) -> FieldError {
        FieldError::UnknownField {
            type_name: self.type_name,
            field: self.field.to_string(),
        }
    }

    fn mismatch(&self, expected: impl fmt::Display, found: &FieldValue) -> FieldError {
        FieldError::ValueMismatch {
            type_name: self.type_name,
            field: self.field.to_string(),
            expected: expected.to_string(),
            found: found.variant_name(),
        }
    }

    pub fn bool(&self, value: FieldValue) -> Result<bool, FieldError> {
        match value {
            FieldValue::Bool(b) => Ok(b),
            other => Err(self.mismatch(FieldType::Bool, &other)),
        }
    }

    pub fn int(&self, value: FieldValue) -> Result<i32, FieldError> {
        match value {
            FieldValue::Int(i) => Ok(i),
            other => Err(self.mismatch(FieldType::Int, &other)),
        }
    }

    pub fn float(&self, value: FieldValue) -> Result<f32, FieldError> {
        match value {
            FieldValue::Float(v) => Ok(v),
            other => Err(self.mismatch(FieldType::Float, &other)),
        }
    }

    pub fn vector3(&self, value: FieldValue) -> Result<Vector3, FieldError> {
        match value {
            FieldValue::Vector3(v) => Ok(v),
            other => Err(self.mismatch(FieldType::Vector3, &other)),
        }
    }

    pub fn text(&self, value: FieldValue) -> Result<String, FieldError> {
        match value {
            FieldValue::Text(s) => Ok(s),
            other => Err(self.mismatch(FieldType::Text, &other)),
        }
    }

    pub fn object<T: DomainObject>(&self, value: FieldValue) -> Result<Option<RnRef<T>>, FieldError> {
        match value {
            FieldValue::Object(None) => Ok(None),
            FieldValue::Object(Some(ref object)) => match T::from_object(object) {
                Some(handle) => Ok(Some(handle.clone())),
                None => Err(self.mismatch(FieldType::Ref(T::KIND), &value)),
            },
            other => Err(self.mismatch(FieldType::Ref(T::KIND), &other)),
        }
    }

    pub fn weak<T: DomainObject>(&self, value: FieldValue) -> Result<RnWeak<T>, FieldError> {
        Ok(self
            .object::<T>(value)?
            .map(|handle| handle.downgrade())
            .unwrap_or_default())
    }

    pub fn objects<T: DomainObject>(&self, value: FieldValue) -> Result<Vec<RnRef<T>>, FieldError> {
        self.list(value, FieldType::Ref(T::KIND))?
            .into_iter()
            .map(|item| {
                self.object::<T>(item)?.ok_or_else(|| FieldError::NullInList {
                    type_name: self.type_name,
                    field: self.field.to_string(),
                })
            })
            .collect()
    }

    pub fn weaks<T: DomainObject>(&self, value: FieldValue) -> Result<Vec<RnWeak<T>>, FieldError> {
        self.list(value, FieldType::WeakRef(T::KIND))?
            .into_iter()
            .map(|item| self.weak::<T>(item))
            .collect()
    }

    pub fn id<D: PrimitiveData>(&self, value: FieldValue) -> Result<RnId<D>, FieldError> {
        match value {
            FieldValue::Id(kind, raw) if kind == D::KIND => Ok(RnId::new(raw)),
            other => Err(self.mismatch(FieldType::Id(D::KIND), &other)),
        }
    }

    pub fn ids<D: PrimitiveData>(&self, value: FieldValue) -> Result<Vec<RnId<D>>, FieldError> {
        self.list(value, FieldType::Id(D::KIND))?
            .into_iter()
            .map(|item| self.id::<D>(item))
            .collect()
    }

    fn list(&self, value: FieldValue, elem: FieldType) -> Result<Vec<FieldValue>, FieldError> {
        match value {
            FieldValue::List(items) => Ok(items),
            other => Err(self.mismatch(format_args!("List<{}>", elem), &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINT_LIST: FieldType = FieldType::List(&FieldType::Ref(ObjectKind::Point));
    const POINT_IDS: FieldType = FieldType::List(&FieldType::Id(ObjectKind::Point));

    #[test]
    fn reference_and_id_of_same_kind_convert() {
        assert!(FieldType::Ref(ObjectKind::Node).is_convertible_to(FieldType::Id(ObjectKind::Node)));
        assert!(FieldType::Id(ObjectKind::Link).is_convertible_to(FieldType::WeakRef(ObjectKind::Link)));
        assert!(!FieldType::Ref(ObjectKind::Node).is_convertible_to(FieldType::Id(ObjectKind::Link)));
        assert!(!FieldType::Int.is_convertible_to(FieldType::Float));
    }

    #[test]
    fn sequences_convert_element_wise() {
        assert!(POINT_LIST.is_convertible_to(POINT_IDS));
        assert!(!POINT_LIST.is_convertible_to(FieldType::Array(&FieldType::Id(ObjectKind::Point))));
        assert!(FieldType::Array(&FieldType::Ref(ObjectKind::Point))
            .is_convertible_to(FieldType::Array(&FieldType::Id(ObjectKind::Point))));
    }

    #[test]
    fn display_names_types() {
        assert_eq!(POINT_LIST.to_string(), "List<Ref<Point>>");
        assert_eq!(FieldType::Id(ObjectKind::Lane).to_string(), "RnId<Lane>");
        assert_eq!(FieldType::Array(&FieldType::Int).to_string(), "[int]");
    }

    #[test]
    fn reference_queries() {
        assert!(POINT_LIST.holds_references());
        assert!(!POINT_LIST.holds_ids());
        assert!(POINT_IDS.holds_ids());
        assert_eq!(POINT_LIST.element(), Some(FieldType::Ref(ObjectKind::Point)));
        assert_eq!(FieldType::WeakRef(ObjectKind::Link).referenced_kind(), Some(ObjectKind::Link));
        assert_eq!(FieldType::Text.referenced_kind(), None);
    }
}
