//! Serialize/deserialize facade over the reference table.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use plateau_core::{
    Fields, FieldType, ObjectKind, PrimitiveData, RnId, RnRef, RoadNetworkModel, Schema,
};

use crate::collect::{collect_instances, ReachableObjects};
use crate::converter::{IdToObjectConverter, ObjectToIdConverter};
use crate::data::{
    PrimitiveDataStorage, RoadNetworkDataBlock, RoadNetworkDataLane, RoadNetworkDataLineString,
    RoadNetworkDataLink, RoadNetworkDataNode, RoadNetworkDataPoint, RoadNetworkDataTrack,
    RoadNetworkDataWay, RoadNetworkStorage, SerializeData,
};
use crate::error::{MappingError, SerializeError};
use crate::member::MemberReference;
use crate::table::{DeserializeStorage, ReferenceTable, SerializeStorage};

/// Order in which [`RoadNetworkSerializer::serialize`] collects kinds.
pub const SERIALIZE_ORDER: [ObjectKind; 8] = ObjectKind::ALL;

/// Order in which [`RoadNetworkSerializer::deserialize`] allocates kinds.
pub const DESERIALIZE_ORDER: [ObjectKind; 8] = [
    ObjectKind::Point,
    ObjectKind::Track,
    ObjectKind::Node,
    ObjectKind::Link,
    ObjectKind::LineString,
    ObjectKind::Block,
    ObjectKind::Way,
    ObjectKind::Lane,
];

/// Both orientations of one kind's mapping.
#[derive(Debug, Clone)]
struct Members {
    serialize: MemberReference,
    deserialize: MemberReference,
}

impl Members {
    fn new(serialize: MemberReference) -> Self {
        let deserialize = serialize.reversed();
        Members {
            serialize,
            deserialize,
        }
    }
}

/// Converts between a [`RoadNetworkModel`] and a [`RoadNetworkStorage`].
///
/// Member references for all eight kinds are built and validated once by
/// [`RoadNetworkSerializer::new`]. Each call works on its own reference
/// table and either returns a complete result or an error; nothing partial
/// escapes.
#[derive(Debug, Clone)]
pub struct RoadNetworkSerializer {
    members: HashMap<ObjectKind, Members>,
}

impl RoadNetworkSerializer {
    pub fn new() -> Result<Self, SerializeError> {
        let mut members = HashMap::with_capacity(ObjectKind::ALL.len());
        members.insert(ObjectKind::Point, Members::new(MemberReference::create::<RoadNetworkDataPoint>()?));
        members.insert(
            ObjectKind::LineString,
            Members::new(MemberReference::create::<RoadNetworkDataLineString>()?),
        );
        members.insert(ObjectKind::Link, Members::new(MemberReference::create::<RoadNetworkDataLink>()?));
        members.insert(ObjectKind::Lane, Members::new(MemberReference::create::<RoadNetworkDataLane>()?));
        members.insert(ObjectKind::Track, Members::new(MemberReference::create::<RoadNetworkDataTrack>()?));
        members.insert(ObjectKind::Block, Members::new(MemberReference::create::<RoadNetworkDataBlock>()?));
        members.insert(ObjectKind::Node, Members::new(MemberReference::create::<RoadNetworkDataNode>()?));
        members.insert(ObjectKind::Way, Members::new(MemberReference::create::<RoadNetworkDataWay>()?));
        Ok(RoadNetworkSerializer { members })
    }

    /// Replaces the mapping used for `kind`.
    ///
    /// The mapping must pair that kind's domain type (source) with its
    /// storage record type (destination). Fields left out of the mapping are
    /// not persisted.
    pub fn with_member(mut self, kind: ObjectKind, member: MemberReference) -> Result<Self, MappingError> {
        let (storage, domain) = schemas_of(kind);
        if !std::ptr::eq(member.src_type(), domain) || !std::ptr::eq(member.dst_type(), storage) {
            return Err(MappingError::WrongTypes {
                kind,
                expected_storage: storage.type_name,
                expected_domain: domain.type_name,
                storage_type: member.dst_type().type_name,
                domain_type: member.src_type().type_name,
            });
        }
        self.members.insert(kind, Members::new(member));
        Ok(self)
    }

    /// Mapping used for `kind` in the serialize direction.
    pub fn member(&self, kind: ObjectKind) -> Option<&MemberReference> {
        self.members.get(&kind).map(|m| &m.serialize)
    }

    fn members(&self, kind: ObjectKind) -> Result<&Members, SerializeError> {
        self.members.get(&kind).ok_or(SerializeError::InvalidOrder {
            reason: format!("no mapping registered for {}", kind),
        })
    }

    /// Flattens every object reachable from the model.
    pub fn serialize(&self, model: &RoadNetworkModel) -> Result<RoadNetworkStorage, SerializeError> {
        self.serialize_in_order(model, &SERIALIZE_ORDER)
    }

    /// Like [`serialize`](Self::serialize), collecting kinds in `order`.
    ///
    /// `order` must name each of the eight kinds exactly once. The result
    /// does not depend on the order.
    pub fn serialize_in_order(
        &self,
        model: &RoadNetworkModel,
        order: &[ObjectKind],
    ) -> Result<RoadNetworkStorage, SerializeError> {
        check_order(order)?;

        let mut table = ReferenceTable::new();
        for &kind in order {
            match kind {
                ObjectKind::Point => self.collect_for_serialize::<RoadNetworkDataPoint>(model, &mut table)?,
                ObjectKind::LineString => {
                    self.collect_for_serialize::<RoadNetworkDataLineString>(model, &mut table)?
                }
                ObjectKind::Link => self.collect_for_serialize::<RoadNetworkDataLink>(model, &mut table)?,
                ObjectKind::Lane => self.collect_for_serialize::<RoadNetworkDataLane>(model, &mut table)?,
                ObjectKind::Track => self.collect_for_serialize::<RoadNetworkDataTrack>(model, &mut table)?,
                ObjectKind::Block => self.collect_for_serialize::<RoadNetworkDataBlock>(model, &mut table)?,
                ObjectKind::Node => self.collect_for_serialize::<RoadNetworkDataNode>(model, &mut table)?,
                ObjectKind::Way => self.collect_for_serialize::<RoadNetworkDataWay>(model, &mut table)?,
            }
        }
        table.convert_all()?;

        let mut data = PrimitiveDataStorage::default();
        table.commit(&mut data)?;
        Ok(RoadNetworkStorage {
            primitive_data_storage: data,
        })
    }

    /// Rebuilds the object graph stored in `storage`.
    ///
    /// Every stored link and node becomes a root of the returned model; all
    /// other objects hang off them. Records that no link or node reaches are
    /// dropped with a warning.
    pub fn deserialize(&self, storage: &RoadNetworkStorage) -> Result<RoadNetworkModel, SerializeError> {
        let data = &storage.primitive_data_storage;
        let mut model = RoadNetworkModel::new();
        let mut table = ReferenceTable::new();

        for kind in DESERIALIZE_ORDER {
            match kind {
                ObjectKind::Point => {
                    self.collect_for_deserialize::<RoadNetworkDataPoint>(data, &mut table)?;
                }
                ObjectKind::LineString => {
                    self.collect_for_deserialize::<RoadNetworkDataLineString>(data, &mut table)?;
                }
                ObjectKind::Link => {
                    model.links = self.collect_for_deserialize::<RoadNetworkDataLink>(data, &mut table)?;
                }
                ObjectKind::Lane => {
                    self.collect_for_deserialize::<RoadNetworkDataLane>(data, &mut table)?;
                }
                ObjectKind::Track => {
                    self.collect_for_deserialize::<RoadNetworkDataTrack>(data, &mut table)?;
                }
                ObjectKind::Block => {
                    self.collect_for_deserialize::<RoadNetworkDataBlock>(data, &mut table)?;
                }
                ObjectKind::Node => {
                    model.nodes = self.collect_for_deserialize::<RoadNetworkDataNode>(data, &mut table)?;
                }
                ObjectKind::Way => {
                    self.collect_for_deserialize::<RoadNetworkDataWay>(data, &mut table)?;
                }
            }
        }
        table.convert_all()?;
        drop(table);

        report_unreachable(&model, data);
        Ok(model)
    }

    fn collect_for_serialize<D: SerializeData>(
        &self,
        model: &RoadNetworkModel,
        table: &mut ReferenceTable<'_>,
    ) -> Result<(), SerializeError> {
        let kind = <D as PrimitiveData>::KIND;
        let sources = collect_instances::<D::Object>(model);

        let mut ids = HashMap::with_capacity(sources.len());
        for (index, source) in sources.iter().enumerate() {
            let id = RnId::<D>::from_index(index).ok_or(SerializeError::TooManyRecords { kind })?;
            ids.insert(source.key(), id);
        }
        tracing::debug!("collected {} {} object(s)", sources.len(), kind);

        table.add_converter(
            &[FieldType::Ref(kind), FieldType::WeakRef(kind)],
            ObjectToIdConverter::<D>::new(ids),
        );
        table.add_storage(SerializeStorage::<D>::new(
            sources,
            self.members(kind)?.serialize.clone(),
        ));
        Ok(())
    }

    fn collect_for_deserialize<'a, D: SerializeData>(
        &self,
        data: &'a PrimitiveDataStorage,
        table: &mut ReferenceTable<'a>,
    ) -> Result<Vec<RnRef<D::Object>>, SerializeError> {
        let kind = <D as PrimitiveData>::KIND;
        let records = D::storage(data).data_list();
        let objects: Vec<RnRef<D::Object>> =
            records.iter().map(|_| RnRef::default()).collect();
        tracing::debug!("allocated {} {} object(s)", objects.len(), kind);

        table.add_converter(&[FieldType::Id(kind)], IdToObjectConverter::<D>::new(objects.clone()));
        table.add_storage(DeserializeStorage::<D>::new(
            records,
            objects.clone(),
            self.members(kind)?.deserialize.clone(),
        ));
        Ok(objects)
    }
}

/// Storage and domain schemas paired for `kind`.
fn schemas_of(kind: ObjectKind) -> (&'static Schema, &'static Schema) {
    fn pair<D: SerializeData>() -> (&'static Schema, &'static Schema) {
        (D::schema(), <D::Object as Fields>::schema())
    }
    match kind {
        ObjectKind::Point => pair::<RoadNetworkDataPoint>(),
        ObjectKind::LineString => pair::<RoadNetworkDataLineString>(),
        ObjectKind::Link => pair::<RoadNetworkDataLink>(),
        ObjectKind::Lane => pair::<RoadNetworkDataLane>(),
        ObjectKind::Track => pair::<RoadNetworkDataTrack>(),
        ObjectKind::Block => pair::<RoadNetworkDataBlock>(),
        ObjectKind::Node => pair::<RoadNetworkDataNode>(),
        ObjectKind::Way => pair::<RoadNetworkDataWay>(),
    }
}

fn check_order(order: &[ObjectKind]) -> Result<(), SerializeError> {
    let mut seen = BTreeSet::new();
    for &kind in order {
        if !seen.insert(kind) {
            return Err(SerializeError::InvalidOrder {
                reason: format!("{} appears more than once", kind),
            });
        }
    }
    let missing: Vec<&str> = ObjectKind::ALL
        .iter()
        .filter(|k| !seen.contains(k))
        .map(|k| k.name())
        .collect();
    if !missing.is_empty() {
        return Err(SerializeError::InvalidOrder {
            reason: format!("missing {}", missing.join(", ")),
        });
    }
    Ok(())
}

/// Warns about stored records that the restored roots do not reach.
fn report_unreachable(model: &RoadNetworkModel, data: &PrimitiveDataStorage) {
    let mut reached: BTreeMap<ObjectKind, usize> = BTreeMap::new();
    for object in ReachableObjects::new(model) {
        *reached.entry(object.kind()).or_default() += 1;
    }
    for kind in ObjectKind::ALL {
        let stored = data.len_of(kind);
        let found = reached.get(&kind).copied().unwrap_or(0);
        if found < stored {
            tracing::warn!(
                "{} of {} {} record(s) are not reachable from any link or node and were dropped",
                stored - found,
                stored,
                kind
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plateau_core::{
        RoadNetworkLane, RoadNetworkLineString, RoadNetworkLink, RoadNetworkWay, Vector3,
    };

    fn serializer() -> RoadNetworkSerializer {
        RoadNetworkSerializer::new().unwrap()
    }

    #[test]
    fn every_kind_has_a_mapping() {
        let s = serializer();
        for kind in ObjectKind::ALL {
            let member = s.member(kind).unwrap();
            let (storage, domain) = schemas_of(kind);
            assert!(std::ptr::eq(member.src_type(), domain));
            assert!(std::ptr::eq(member.dst_type(), storage));
        }
    }

    #[test]
    fn empty_model_gives_empty_storage() {
        let storage = serializer().serialize(&RoadNetworkModel::new()).unwrap();
        assert_eq!(storage, RoadNetworkStorage::default());
        let model = serializer().deserialize(&storage).unwrap();
        assert!(model.links.is_empty() && model.nodes.is_empty());
    }

    #[test]
    fn invalid_orders_are_rejected() {
        let model = RoadNetworkModel::new();
        let err = serializer()
            .serialize_in_order(&model, &ObjectKind::ALL[..7])
            .unwrap_err();
        assert!(err.to_string().contains("missing Way"));

        let mut order = ObjectKind::ALL.to_vec();
        order[7] = ObjectKind::Point;
        let err = serializer().serialize_in_order(&model, &order).unwrap_err();
        assert!(err.to_string().contains("Point appears more than once"));
    }

    #[test]
    fn replacement_mapping_must_match_kind() {
        let wrong = MemberReference::create::<RoadNetworkDataNode>().unwrap();
        let err = serializer().with_member(ObjectKind::Link, wrong).unwrap_err();
        assert!(matches!(
            err,
            MappingError::WrongTypes {
                kind: ObjectKind::Link,
                storage_type: "RoadNetworkDataNode",
                ..
            }
        ));

        // Reversed orientation is rejected too.
        let reversed = MemberReference::create::<RoadNetworkDataLink>().unwrap().reversed();
        assert!(serializer().with_member(ObjectKind::Link, reversed).is_err());
    }

    #[test]
    fn partial_mapping_drops_unmapped_fields() {
        let member = MemberReference::builder(RoadNetworkDataLink::schema(), RoadNetworkLink::schema())
            .same("prev_node")
            .same("next_node")
            .build()
            .unwrap();
        let s = serializer().with_member(ObjectKind::Link, member).unwrap();

        let mut model = RoadNetworkModel::new();
        let a = model.add_node(Vector3::ZERO);
        let b = model.add_node(Vector3::ZERO);
        let link = model.add_link("kept out");
        model.connect(&link, &a, &b);

        let storage = s.serialize(&model).unwrap();
        let record = &storage.primitive_data_storage.links.data_list()[0];
        assert_eq!(record.name, "");
        assert_eq!(record.next_node, RnId::new(1));
    }

    #[test]
    fn dangling_identifier_aborts_deserialize() {
        let mut storage = RoadNetworkStorage::default();
        storage
            .primitive_data_storage
            .links
            .write_new(vec![RoadNetworkDataLink {
                prev_node: RnId::new(3),
                ..RoadNetworkDataLink::default()
            }])
            .unwrap();
        let err = serializer().deserialize(&storage).unwrap_err();
        assert!(matches!(err, SerializeError::UnknownId { kind: ObjectKind::Node, id: 3 }));
    }

    #[test]
    fn null_inside_strong_list_is_rejected() {
        let mut storage = RoadNetworkStorage::default();
        storage
            .primitive_data_storage
            .links
            .write_new(vec![RoadNetworkDataLink {
                main_lanes: vec![RnId::invalid()],
                ..RoadNetworkDataLink::default()
            }])
            .unwrap();
        let err = serializer().deserialize(&storage).unwrap_err();
        assert!(matches!(err, SerializeError::Field(_)));
    }

    #[test]
    fn unreferenced_records_are_dropped() {
        let mut storage = RoadNetworkStorage::default();
        storage
            .primitive_data_storage
            .points
            .write_new(vec![RoadNetworkDataPoint::default()])
            .unwrap();
        let model = serializer().deserialize(&storage).unwrap();
        assert!(model.links.is_empty());
        assert_eq!(ReachableObjects::new(&model).count(), 0);
    }

    #[test]
    fn lane_borders_and_parent_survive() {
        let mut model = RoadNetworkModel::new();
        let a = model.add_node(Vector3::ZERO);
        let b = model.add_node(Vector3::new(5.0, 0.0, 0.0));
        let link = model.add_link("avenue");
        model.connect(&link, &a, &b);
        let line = RnRef::new(RoadNetworkLineString::from_vertices([
            Vector3::ZERO,
            Vector3::new(5.0, 0.0, 0.0),
        ]));
        let way = RnRef::new(RoadNetworkWay::new(line));
        link.add_lane(RoadNetworkLane {
            left_way: Some(way.clone()),
            right_way: Some(way),
            attributes: 0b101,
            ..RoadNetworkLane::default()
        });

        let s = serializer();
        let storage = s.serialize(&model).unwrap();
        assert_eq!(storage.len_of(ObjectKind::Way), 1);
        assert_eq!(storage.len_of(ObjectKind::Point), 2);

        let back = s.deserialize(&storage).unwrap();
        let link = back.links[0].borrow();
        let lane = link.main_lanes[0].borrow();
        assert_eq!(lane.attributes, 0b101);
        assert!(lane.parent_link.upgrade().is_some_and(|p| p.ptr_eq(&back.links[0])));
        let (left, right) = (lane.left_way.as_ref().unwrap(), lane.right_way.as_ref().unwrap());
        assert!(left.ptr_eq(right));
        assert_eq!(
            left.borrow().line_string.as_ref().unwrap().borrow().points.len(),
            2
        );
    }
}
