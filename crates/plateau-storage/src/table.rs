//! Per-call working set of a serialize or deserialize run.
//!
//! The table is filled kind by kind: each kind contributes one storage (the
//! pairs of objects and records to rewrite) and one converter. Only once all
//! kinds are registered does [`ReferenceTable::convert_all`] rewrite every
//! pair, so every reference resolves regardless of registration order.

use plateau_core::{FieldType, ObjectKind, PrimitiveData, RnRef};

use crate::convert::convert;
use crate::converter::{ConverterRegistry, DataConverter, ValueConverter};
use crate::data::{PrimitiveDataStorage, SerializeData};
use crate::error::SerializeError;
use crate::member::MemberReference;

/// One kind's pairs of source and destination objects.
pub(crate) trait DataStorage {
    fn kind(&self) -> ObjectKind;

    fn len(&self) -> usize;

    /// Rewrites every destination from its source.
    fn convert_all(&mut self, converter: &dyn DataConverter) -> Result<(), SerializeError>;

    /// Moves converted records into `target`. Restored domain objects are
    /// already in place, so the deserialize direction has nothing to move.
    fn commit(self: Box<Self>, _target: &mut PrimitiveDataStorage) -> Result<(), SerializeError> {
        Ok(())
    }
}

/// Domain objects of one kind and the blank records they serialize into.
pub(crate) struct SerializeStorage<D: SerializeData> {
    sources: Vec<RnRef<D::Object>>,
    records: Vec<D>,
    member: MemberReference,
}

impl<D: SerializeData> SerializeStorage<D> {
    pub(crate) fn new(sources: Vec<RnRef<D::Object>>, member: MemberReference) -> Self {
        let records = vec![D::default(); sources.len()];
        SerializeStorage {
            sources,
            records,
            member,
        }
    }
}

impl<D: SerializeData> DataStorage for SerializeStorage<D> {
    fn kind(&self) -> ObjectKind {
        <D as PrimitiveData>::KIND
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn convert_all(&mut self, converter: &dyn DataConverter) -> Result<(), SerializeError> {
        for (source, record) in self.sources.iter().zip(self.records.iter_mut()) {
            convert(&*source.borrow(), record, &self.member, converter)?;
        }
        Ok(())
    }

    fn commit(self: Box<Self>, target: &mut PrimitiveDataStorage) -> Result<(), SerializeError> {
        D::storage_mut(target).write_new(self.records)?;
        Ok(())
    }
}

/// Stored records of one kind and the fresh objects they restore.
pub(crate) struct DeserializeStorage<'a, D: SerializeData> {
    records: &'a [D],
    objects: Vec<RnRef<D::Object>>,
    member: MemberReference,
}

impl<'a, D: SerializeData> DeserializeStorage<'a, D> {
    pub(crate) fn new(
        records: &'a [D],
        objects: Vec<RnRef<D::Object>>,
        member: MemberReference,
    ) -> Self {
        DeserializeStorage {
            records,
            objects,
            member,
        }
    }
}

impl<D: SerializeData> DataStorage for DeserializeStorage<'_, D> {
    fn kind(&self) -> ObjectKind {
        <D as PrimitiveData>::KIND
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn convert_all(&mut self, converter: &dyn DataConverter) -> Result<(), SerializeError> {
        for (record, object) in self.records.iter().zip(&self.objects) {
            convert(record, &mut *object.borrow_mut(), &self.member, converter)?;
        }
        Ok(())
    }
}

/// Storages and converters of all kinds for a single call.
pub struct ReferenceTable<'a> {
    converters: ConverterRegistry,
    storages: Vec<Box<dyn DataStorage + 'a>>,
}

impl<'a> ReferenceTable<'a> {
    pub(crate) fn new() -> Self {
        ReferenceTable {
            converters: ConverterRegistry::new(),
            storages: Vec::new(),
        }
    }

    pub(crate) fn add_storage(&mut self, storage: impl DataStorage + 'a) {
        self.storages.push(Box::new(storage));
    }

    pub(crate) fn add_converter(&mut self, types: &[FieldType], converter: impl ValueConverter + 'static) {
        self.converters.add_converter(types, converter);
    }

    /// Kinds registered so far, in registration order.
    pub fn kinds(&self) -> Vec<ObjectKind> {
        self.storages.iter().map(|s| s.kind()).collect()
    }

    /// Runs the rewrite pass over every registered storage. Stops at the
    /// first failure.
    pub fn convert_all(&mut self) -> Result<(), SerializeError> {
        for storage in &mut self.storages {
            storage.convert_all(&self.converters)?;
            tracing::debug!("converted {} {} record(s)", storage.len(), storage.kind());
        }
        Ok(())
    }

    /// Moves every converted record into `target`.
    pub(crate) fn commit(self, target: &mut PrimitiveDataStorage) -> Result<(), SerializeError> {
        for storage in self.storages {
            storage.commit(target)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use plateau_core::{RnId, RoadNetworkPoint, Vector3};

    use crate::converter::ObjectToIdConverter;
    use crate::data::{RoadNetworkDataLineString, RoadNetworkDataPoint};

    fn point_storage(points: &[RnRef<RoadNetworkPoint>]) -> SerializeStorage<RoadNetworkDataPoint> {
        let member = MemberReference::create::<RoadNetworkDataPoint>().unwrap();
        SerializeStorage::new(points.to_vec(), member)
    }

    /// Storage whose conversion always fails, standing in for a record type
    /// whose mapping cannot be resolved at run time. Records whether it was
    /// ever committed.
    struct Failing {
        committed: Rc<Cell<bool>>,
    }

    impl DataStorage for Failing {
        fn kind(&self) -> ObjectKind {
            ObjectKind::Way
        }

        fn len(&self) -> usize {
            1
        }

        fn convert_all(&mut self, _converter: &dyn DataConverter) -> Result<(), SerializeError> {
            Err(SerializeError::Unsupported {
                type_name: "RoadNetworkWay",
                field: "line_string",
                ty: FieldType::Array(&FieldType::Ref(ObjectKind::LineString)),
            })
        }

        fn commit(self: Box<Self>, target: &mut PrimitiveDataStorage) -> Result<(), SerializeError> {
            self.committed.set(true);
            target.ways.write_new(vec![Default::default()])?;
            Ok(())
        }
    }

    /// Same sequence the serializer runs: rewrite everything, then commit.
    fn run(mut table: ReferenceTable<'_>, target: &mut PrimitiveDataStorage) -> Result<(), SerializeError> {
        table.convert_all()?;
        table.commit(target)
    }

    fn prefilled() -> PrimitiveDataStorage {
        let mut target = PrimitiveDataStorage::default();
        target
            .points
            .write_new(vec![RoadNetworkDataPoint {
                vertex: Vector3::new(9.0, 9.0, 9.0),
            }])
            .unwrap();
        target
            .line_strings
            .write_new(vec![RoadNetworkDataLineString {
                points: vec![RnId::new(0)],
            }])
            .unwrap();
        target
    }

    #[test]
    fn commit_moves_converted_records() {
        let points = vec![
            RnRef::new(RoadNetworkPoint::new(Vector3::new(1.0, 2.0, 3.0))),
            RnRef::new(RoadNetworkPoint::new(Vector3::new(4.0, 5.0, 6.0))),
        ];
        let mut table = ReferenceTable::new();
        table.add_storage(point_storage(&points));

        let mut target = prefilled();
        run(table, &mut target).unwrap();
        assert_eq!(target.points.len(), 3);
        assert_eq!(
            target.points.get(RnId::new(2)).map(|p| p.vertex),
            Some(Vector3::new(4.0, 5.0, 6.0))
        );
    }

    #[test]
    fn failed_pass_leaves_target_untouched() {
        let points = vec![RnRef::new(RoadNetworkPoint::new(Vector3::new(1.0, 0.0, 0.0)))];
        let committed = Rc::new(Cell::new(false));
        let mut table = ReferenceTable::new();
        table.add_storage(point_storage(&points));
        table.add_storage(Failing {
            committed: Rc::clone(&committed),
        });
        table.add_converter(
            &[FieldType::Ref(ObjectKind::Point)],
            ObjectToIdConverter::<RoadNetworkDataPoint>::new(HashMap::new()),
        );
        assert_eq!(table.kinds(), vec![ObjectKind::Point, ObjectKind::Way]);

        let mut target = prefilled();
        let before = target.clone();
        let err = run(table, &mut target).unwrap_err();
        assert!(matches!(err, SerializeError::Unsupported { field: "line_string", .. }));
        assert!(!committed.get());
        assert_eq!(target, before);
        assert_eq!(target.points.len(), 1);
        assert!(target.ways.is_empty());
    }
}
