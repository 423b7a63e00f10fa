//! Storage records and their containers.
//!
//! Each domain object kind has a flat record type whose reference fields are
//! [`RnId`]s. All records of one kind live in a [`PrimitiveStorage`], and a
//! record's position in it is its identifier.

use serde::{Deserialize, Serialize};

use plateau_core::{
    DomainObject, FieldDecl, FieldError, FieldSlot, FieldType, FieldValue, Fields, ObjectKind,
    PrimitiveData, RnId, RoadNetworkBlock, RoadNetworkLane, RoadNetworkLineString,
    RoadNetworkLink, RoadNetworkNode, RoadNetworkPoint, RoadNetworkTrack, RoadNetworkWay, Schema,
    Vector3,
};

use crate::error::{SerializeError, StorageError};
use crate::member::MemberBuilder;

/// Pairs a storage record type with the domain object it stores.
///
/// `declare_members` lists which storage field holds which domain field.
pub trait SerializeData: PrimitiveData {
    type Object: DomainObject;

    fn declare_members(members: MemberBuilder) -> MemberBuilder;

    fn storage(data: &PrimitiveDataStorage) -> &PrimitiveStorage<Self>;

    fn storage_mut(data: &mut PrimitiveDataStorage) -> &mut PrimitiveStorage<Self>;
}

/// Dense, index-addressed sequence of records of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimitiveStorage<T> {
    data_list: Vec<T>,
}

impl<T> Default for PrimitiveStorage<T> {
    fn default() -> Self {
        PrimitiveStorage {
            data_list: Vec::new(),
        }
    }
}

impl<T> PrimitiveStorage<T> {
    pub fn data_list(&self) -> &[T] {
        &self.data_list
    }

    pub fn len(&self) -> usize {
        self.data_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_list.is_empty()
    }

    pub fn get(&self, id: RnId<T>) -> Option<&T> {
        id.index().and_then(|i| self.data_list.get(i))
    }

    /// Records paired with their identifiers.
    pub fn iter(&self) -> impl Iterator<Item = (RnId<T>, &T)> {
        self.data_list
            .iter()
            .enumerate()
            .map(|(i, record)| (RnId::new(i as i32), record))
    }
}

impl<T: PrimitiveData> PrimitiveStorage<T> {
    /// Appends records and returns their new identifiers.
    pub fn write_new(&mut self, records: Vec<T>) -> Result<Vec<RnId<T>>, SerializeError> {
        let start = self.data_list.len();
        let ids = (start..start + records.len())
            .map(|i| RnId::from_index(i).ok_or(SerializeError::TooManyRecords { kind: T::KIND }))
            .collect::<Result<Vec<_>, _>>()?;
        self.data_list.extend(records);
        Ok(ids)
    }
}

/// One primitive storage per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveDataStorage {
    pub points: PrimitiveStorage<RoadNetworkDataPoint>,
    pub line_strings: PrimitiveStorage<RoadNetworkDataLineString>,
    pub links: PrimitiveStorage<RoadNetworkDataLink>,
    pub lanes: PrimitiveStorage<RoadNetworkDataLane>,
    pub tracks: PrimitiveStorage<RoadNetworkDataTrack>,
    pub blocks: PrimitiveStorage<RoadNetworkDataBlock>,
    pub nodes: PrimitiveStorage<RoadNetworkDataNode>,
    pub ways: PrimitiveStorage<RoadNetworkDataWay>,
}

impl PrimitiveDataStorage {
    /// Number of records stored for `kind`.
    pub fn len_of(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Point => self.points.len(),
            ObjectKind::LineString => self.line_strings.len(),
            ObjectKind::Link => self.links.len(),
            ObjectKind::Lane => self.lanes.len(),
            ObjectKind::Track => self.tracks.len(),
            ObjectKind::Block => self.blocks.len(),
            ObjectKind::Node => self.nodes.len(),
            ObjectKind::Way => self.ways.len(),
        }
    }
}

/// Root container of a serialized road network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadNetworkStorage {
    pub primitive_data_storage: PrimitiveDataStorage,
}

impl RoadNetworkStorage {
    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len_of(&self, kind: ObjectKind) -> usize {
        self.primitive_data_storage.len_of(kind)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadNetworkDataPoint {
    pub vertex: Vector3,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadNetworkDataLineString {
    pub points: Vec<RnId<RoadNetworkDataPoint>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadNetworkDataWay {
    pub line_string: RnId<RoadNetworkDataLineString>,
    pub is_reversed: bool,
    pub is_reverse_normal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadNetworkDataLane {
    pub parent_link: RnId<RoadNetworkDataLink>,
    pub left_way: RnId<RoadNetworkDataWay>,
    pub right_way: RnId<RoadNetworkDataWay>,
    pub prev_border: RnId<RoadNetworkDataWay>,
    pub next_border: RnId<RoadNetworkDataWay>,
    pub attributes: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadNetworkDataBlock {
    pub lane_type: i32,
    pub parent_link: RnId<RoadNetworkDataLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadNetworkDataLink {
    pub name: String,
    pub prev_node: RnId<RoadNetworkDataNode>,
    pub next_node: RnId<RoadNetworkDataNode>,
    pub main_lanes: Vec<RnId<RoadNetworkDataLane>>,
    pub blocks: Vec<RnId<RoadNetworkDataBlock>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadNetworkDataTrack {
    pub from_lane: RnId<RoadNetworkDataLane>,
    pub to_lane: RnId<RoadNetworkDataLane>,
    pub way: RnId<RoadNetworkDataWay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadNetworkDataNode {
    pub center: Vector3,
    pub tracks: Vec<RnId<RoadNetworkDataTrack>>,
    pub links: Vec<RnId<RoadNetworkDataLink>>,
    pub lanes: Vec<RnId<RoadNetworkDataLane>>,
}

/// Conversion between a record field and [`FieldValue`].
trait RecordValue: Sized {
    fn to_value(&self) -> FieldValue;
    fn from_value(slot: &FieldSlot<'_>, value: FieldValue) -> Result<Self, FieldError>;
}

impl RecordValue for bool {
    fn to_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }
    fn from_value(slot: &FieldSlot<'_>, value: FieldValue) -> Result<Self, FieldError> {
        slot.bool(value)
    }
}

impl RecordValue for i32 {
    fn to_value(&self) -> FieldValue {
        FieldValue::Int(*self)
    }
    fn from_value(slot: &FieldSlot<'_>, value: FieldValue) -> Result<Self, FieldError> {
        slot.int(value)
    }
}

impl RecordValue for String {
    fn to_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }
    fn from_value(slot: &FieldSlot<'_>, value: FieldValue) -> Result<Self, FieldError> {
        slot.text(value)
    }
}

impl RecordValue for Vector3 {
    fn to_value(&self) -> FieldValue {
        FieldValue::Vector3(*self)
    }
    fn from_value(slot: &FieldSlot<'_>, value: FieldValue) -> Result<Self, FieldError> {
        slot.vector3(value)
    }
}

impl<D: PrimitiveData> RecordValue for RnId<D> {
    fn to_value(&self) -> FieldValue {
        FieldValue::id(*self)
    }
    fn from_value(slot: &FieldSlot<'_>, value: FieldValue) -> Result<Self, FieldError> {
        slot.id(value)
    }
}

impl<D: PrimitiveData> RecordValue for Vec<RnId<D>> {
    fn to_value(&self) -> FieldValue {
        FieldValue::ids(self)
    }
    fn from_value(slot: &FieldSlot<'_>, value: FieldValue) -> Result<Self, FieldError> {
        slot.ids(value)
    }
}

/// Implements [`PrimitiveData`], [`Fields`] and [`SerializeData`] for a
/// record, declaring each field's type and its domain counterpart.
macro_rules! storage_record {
    (
        $record:ident => $object:ty, $kind:ident, $storage:ident {
            $($field:ident: $ty:expr => $domain:literal),* $(,)?
        }
    ) => {
        impl PrimitiveData for $record {
            const KIND: ObjectKind = ObjectKind::$kind;
        }

        impl Fields for $record {
            fn schema() -> &'static Schema {
                static SCHEMA: Schema = Schema {
                    type_name: stringify!($record),
                    fields: &[$(FieldDecl::new(stringify!($field), $ty)),*],
                };
                &SCHEMA
            }

            fn type_schema(&self) -> &'static Schema {
                Self::schema()
            }

            fn get_field(&self, name: &str) -> Option<FieldValue> {
                match name {
                    $(stringify!($field) => Some(self.$field.to_value()),)*
                    _ => None,
                }
            }

            fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
                let slot = FieldSlot::new(Self::schema(), name);
                match name {
                    $(stringify!($field) => self.$field = RecordValue::from_value(&slot, value)?,)*
                    _ => return Err(slot.unknown()),
                }
                Ok(())
            }
        }

        impl SerializeData for $record {
            type Object = $object;

            fn declare_members(members: MemberBuilder) -> MemberBuilder {
                members$(.map(stringify!($field), $domain))*
            }

            fn storage(data: &PrimitiveDataStorage) -> &PrimitiveStorage<Self> {
                &data.$storage
            }

            fn storage_mut(data: &mut PrimitiveDataStorage) -> &mut PrimitiveStorage<Self> {
                &mut data.$storage
            }
        }
    };
}

storage_record!(RoadNetworkDataPoint => RoadNetworkPoint, Point, points {
    vertex: FieldType::Vector3 => "vertex",
});

storage_record!(RoadNetworkDataLineString => RoadNetworkLineString, LineString, line_strings {
    points: FieldType::List(&FieldType::Id(ObjectKind::Point)) => "points",
});

storage_record!(RoadNetworkDataWay => RoadNetworkWay, Way, ways {
    line_string: FieldType::Id(ObjectKind::LineString) => "line_string",
    is_reversed: FieldType::Bool => "is_reversed",
    is_reverse_normal: FieldType::Bool => "is_reverse_normal",
});

storage_record!(RoadNetworkDataLane => RoadNetworkLane, Lane, lanes {
    parent_link: FieldType::Id(ObjectKind::Link) => "parent_link",
    left_way: FieldType::Id(ObjectKind::Way) => "left_way",
    right_way: FieldType::Id(ObjectKind::Way) => "right_way",
    prev_border: FieldType::Id(ObjectKind::Way) => "prev_border",
    next_border: FieldType::Id(ObjectKind::Way) => "next_border",
    attributes: FieldType::Int => "attributes",
});

storage_record!(RoadNetworkDataBlock => RoadNetworkBlock, Block, blocks {
    lane_type: FieldType::Int => "lane_type",
    parent_link: FieldType::Id(ObjectKind::Link) => "parent_link",
});

storage_record!(RoadNetworkDataLink => RoadNetworkLink, Link, links {
    name: FieldType::Text => "name",
    prev_node: FieldType::Id(ObjectKind::Node) => "prev_node",
    next_node: FieldType::Id(ObjectKind::Node) => "next_node",
    main_lanes: FieldType::List(&FieldType::Id(ObjectKind::Lane)) => "main_lanes",
    blocks: FieldType::List(&FieldType::Id(ObjectKind::Block)) => "blocks",
});

storage_record!(RoadNetworkDataTrack => RoadNetworkTrack, Track, tracks {
    from_lane: FieldType::Id(ObjectKind::Lane) => "from_lane",
    to_lane: FieldType::Id(ObjectKind::Lane) => "to_lane",
    way: FieldType::Id(ObjectKind::Way) => "way",
});

storage_record!(RoadNetworkDataNode => RoadNetworkNode, Node, nodes {
    center: FieldType::Vector3 => "center",
    tracks: FieldType::List(&FieldType::Id(ObjectKind::Track)) => "tracks",
    links: FieldType::List(&FieldType::Id(ObjectKind::Link)) => "links",
    lanes: FieldType::List(&FieldType::Id(ObjectKind::Lane)) => "lanes",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_new_returns_positions() {
        let mut storage = PrimitiveStorage::<RoadNetworkDataPoint>::default();
        let first = storage.write_new(vec![RoadNetworkDataPoint::default(); 2]).unwrap();
        let second = storage.write_new(vec![RoadNetworkDataPoint::default()]).unwrap();
        assert_eq!(first, vec![RnId::new(0), RnId::new(1)]);
        assert_eq!(second, vec![RnId::new(2)]);
        assert_eq!(storage.len(), 3);
        assert!(storage.get(RnId::new(2)).is_some());
        assert!(storage.get(RnId::new(3)).is_none());
        assert!(storage.get(RnId::invalid()).is_none());
    }

    #[test]
    fn record_fields_follow_schema() {
        let link = RoadNetworkDataLink {
            name: "a".into(),
            prev_node: RnId::new(0),
            next_node: RnId::new(1),
            main_lanes: vec![RnId::new(4)],
            blocks: vec![],
        };
        assert_eq!(
            link.get_field("prev_node"),
            Some(FieldValue::Id(ObjectKind::Node, 0))
        );
        assert_eq!(
            link.get_field("main_lanes"),
            Some(FieldValue::List(vec![FieldValue::Id(ObjectKind::Lane, 4)]))
        );
        assert_eq!(RoadNetworkDataLink::schema().fields.len(), 5);
        assert_eq!(RoadNetworkDataLink::schema().type_name, "RoadNetworkDataLink");
    }

    #[test]
    fn set_field_checks_identifier_kind() {
        let mut way = RoadNetworkDataWay::default();
        way.set_field("line_string", FieldValue::Id(ObjectKind::LineString, 3))
            .unwrap();
        assert_eq!(way.line_string, RnId::new(3));

        let err = way
            .set_field("line_string", FieldValue::Id(ObjectKind::Point, 3))
            .unwrap_err();
        assert!(matches!(err, FieldError::ValueMismatch { .. }));
    }

    #[test]
    fn storage_json_uses_plain_integers() {
        let mut storage = RoadNetworkStorage::default();
        storage
            .primitive_data_storage
            .ways
            .write_new(vec![RoadNetworkDataWay::default()])
            .unwrap();
        let json = storage.to_json().unwrap();
        assert!(json.contains("\"line_string\":-1"));
        let back = RoadNetworkStorage::from_json(&json).unwrap();
        assert_eq!(back, storage);
        assert_eq!(back.len_of(ObjectKind::Way), 1);
    }
}
