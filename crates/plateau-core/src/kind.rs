//! The eight kinds of road-network object and a tagged handle over them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fields::Fields;
use crate::handle::{ObjectKey, RnRef};
use crate::model::{
    RoadNetworkBlock, RoadNetworkLane, RoadNetworkLineString, RoadNetworkLink, RoadNetworkNode,
    RoadNetworkPoint, RoadNetworkTrack, RoadNetworkWay,
};

/// Kind of a road-network object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Point,
    LineString,
    Link,
    Lane,
    Track,
    Block,
    Node,
    Way,
}

impl ObjectKind {
    /// All kinds, in the order the serializer collects them.
    pub const ALL: [ObjectKind; 8] = [
        ObjectKind::Point,
        ObjectKind::LineString,
        ObjectKind::Link,
        ObjectKind::Lane,
        ObjectKind::Track,
        ObjectKind::Block,
        ObjectKind::Node,
        ObjectKind::Way,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Point => "Point",
            ObjectKind::LineString => "LineString",
            ObjectKind::Link => "Link",
            ObjectKind::Lane => "Lane",
            ObjectKind::Track => "Track",
            ObjectKind::Block => "Block",
            ObjectKind::Node => "Node",
            ObjectKind::Way => "Way",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A domain object type that can sit behind an [`ObjectRef`].
pub trait DomainObject: Fields + Default + 'static {
    const KIND: ObjectKind;

    fn into_object(handle: RnRef<Self>) -> ObjectRef;

    fn from_object(object: &ObjectRef) -> Option<&RnRef<Self>>;
}

macro_rules! object_kinds {
    ($($kind:ident => $ty:ty),* $(,)?) => {
        /// Handle to a domain object of any kind.
        ///
        /// Equality is identity of the underlying object.
        #[derive(Clone, PartialEq, Eq)]
        pub enum ObjectRef {
            $($kind(RnRef<$ty>),)*
        }

        impl ObjectRef {
            pub fn kind(&self) -> ObjectKind {
                match self {
                    $(ObjectRef::$kind(_) => ObjectKind::$kind,)*
                }
            }

            pub fn key(&self) -> ObjectKey {
                match self {
                    $(ObjectRef::$kind(h) => h.key(),)*
                }
            }

            /// Runs `f` with the object borrowed as a [`Fields`] trait object.
            pub fn with_fields<R>(&self, f: impl FnOnce(&dyn Fields) -> R) -> R {
                match self {
                    $(ObjectRef::$kind(h) => f(&*h.borrow()),)*
                }
            }

            /// Runs `f` with the object mutably borrowed.
            pub fn with_fields_mut<R>(&self, f: impl FnOnce(&mut dyn Fields) -> R) -> R {
                match self {
                    $(ObjectRef::$kind(h) => f(&mut *h.borrow_mut()),)*
                }
            }
        }

        $(
            impl DomainObject for $ty {
                const KIND: ObjectKind = ObjectKind::$kind;

                fn into_object(handle: RnRef<Self>) -> ObjectRef {
                    ObjectRef::$kind(handle)
                }

                fn from_object(object: &ObjectRef) -> Option<&RnRef<Self>> {
                    match object {
                        ObjectRef::$kind(h) => Some(h),
                        _ => None,
                    }
                }
            }
        )*
    };
}

object_kinds! {
    Point => RoadNetworkPoint,
    LineString => RoadNetworkLineString,
    Link => RoadNetworkLink,
    Lane => RoadNetworkLane,
    Track => RoadNetworkTrack,
    Block => RoadNetworkBlock,
    Node => RoadNetworkNode,
    Way => RoadNetworkWay,
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.kind(), self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ref_round_trips_through_kind() {
        let lane = RnRef::new(RoadNetworkLane::default());
        let object = RoadNetworkLane::into_object(lane.clone());
        assert_eq!(object.kind(), ObjectKind::Lane);
        assert_eq!(object.key(), lane.key());
        assert_eq!(RoadNetworkLane::from_object(&object), Some(&lane));
        assert!(RoadNetworkLink::from_object(&object).is_none());
    }

    #[test]
    fn with_fields_exposes_schema() {
        let object = RoadNetworkPoint::into_object(RnRef::default());
        let name = object.with_fields(|f| f.type_schema().type_name);
        assert_eq!(name, "RoadNetworkPoint");
    }

    #[test]
    fn kinds_are_distinct_and_complete() {
        let mut kinds = ObjectKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), 8);
    }
}
