//! Reachability walk over a road-network model.
//!
//! [`ReachableObjects`] yields every distinct object reachable from the
//! model's roots through any reference field, strong or weak, including
//! references held in lists. Order is depth-first pre-order following
//! field declaration order, so it is stable for a given graph.

use indexmap::IndexSet;
use smallvec::SmallVec;

use plateau_core::{DomainObject, FieldValue, ObjectKey, ObjectRef, RnRef, RoadNetworkModel};

/// Depth-first iterator over distinct reachable objects.
pub struct ReachableObjects {
    stack: Vec<ObjectRef>,
    visited: IndexSet<ObjectKey>,
}

impl ReachableObjects {
    pub fn new(model: &RoadNetworkModel) -> Self {
        Self::from_roots(model.roots())
    }

    pub fn from_roots(roots: impl IntoIterator<Item = ObjectRef>) -> Self {
        let mut stack: Vec<ObjectRef> = roots.into_iter().collect();
        stack.reverse();
        ReachableObjects {
            stack,
            visited: IndexSet::new(),
        }
    }
}

impl Iterator for ReachableObjects {
    type Item = ObjectRef;

    fn next(&mut self) -> Option<ObjectRef> {
        while let Some(object) = self.stack.pop() {
            if !self.visited.insert(object.key()) {
                continue;
            }
            let children = references_of(&object);
            self.stack.extend(children.into_iter().rev());
            return Some(object);
        }
        None
    }
}

/// Every object directly referenced by `object`, in field order.
///
/// Null and dangling references are skipped; duplicates are kept.
pub fn references_of(object: &ObjectRef) -> SmallVec<[ObjectRef; 8]> {
    object.with_fields(|fields| {
        let mut out = SmallVec::new();
        for decl in fields.type_schema().fields {
            if !decl.ty.holds_references() {
                continue;
            }
            if let Some(value) = fields.get_field(decl.name) {
                push_objects(value, &mut out);
            }
        }
        out
    })
}

fn push_objects(value: FieldValue, out: &mut SmallVec<[ObjectRef; 8]>) {
    match value {
        FieldValue::Object(Some(object)) => out.push(object),
        FieldValue::List(items) => {
            for item in items {
                push_objects(item, out);
            }
        }
        _ => {}
    }
}

/// Every distinct reachable instance of `T`, in discovery order.
pub fn collect_instances<T: DomainObject>(model: &RoadNetworkModel) -> Vec<RnRef<T>> {
    ReachableObjects::new(model)
        .filter_map(|object| T::from_object(&object).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plateau_core::{
        ObjectKind, RoadNetworkLane, RoadNetworkLineString, RoadNetworkLink, RoadNetworkNode,
        RoadNetworkPoint, RoadNetworkWay, Vector3,
    };

    #[test]
    fn shared_objects_are_collected_once() {
        let mut model = RoadNetworkModel::new();
        let a = model.add_node(Vector3::ZERO);
        let b = model.add_node(Vector3::new(1.0, 0.0, 0.0));
        let link = model.add_link("l");
        model.connect(&link, &a, &b);

        // Both lanes share one border way.
        let line = RnRef::new(RoadNetworkLineString::from_vertices([
            Vector3::ZERO,
            Vector3::new(1.0, 0.0, 0.0),
        ]));
        let shared = RnRef::new(RoadNetworkWay::new(line));
        for _ in 0..2 {
            link.add_lane(RoadNetworkLane {
                left_way: Some(shared.clone()),
                ..RoadNetworkLane::default()
            });
        }

        assert_eq!(collect_instances::<RoadNetworkLink>(&model).len(), 1);
        assert_eq!(collect_instances::<RoadNetworkNode>(&model).len(), 2);
        assert_eq!(collect_instances::<RoadNetworkLane>(&model).len(), 2);
        assert_eq!(collect_instances::<RoadNetworkWay>(&model), vec![shared]);
        assert_eq!(collect_instances::<RoadNetworkPoint>(&model).len(), 2);
    }

    #[test]
    fn discovery_order_follows_roots_and_fields() {
        let mut model = RoadNetworkModel::new();
        let a = model.add_node(Vector3::ZERO);
        let b = model.add_node(Vector3::ZERO);
        let link = model.add_link("l");
        // Reverse direction: next_node is visited after prev_node.
        model.connect(&link, &b, &a);

        let kinds: Vec<ObjectKind> = ReachableObjects::new(&model).map(|o| o.kind()).collect();
        assert_eq!(kinds, vec![ObjectKind::Link, ObjectKind::Node, ObjectKind::Node]);
        assert_eq!(collect_instances::<RoadNetworkNode>(&model), vec![b, a]);
    }

    #[test]
    fn objects_reachable_only_through_weak_references_are_found() {
        let mut model = RoadNetworkModel::new();
        let node = model.add_node(Vector3::ZERO);
        // The link is not a root; only the node's weak back-reference reaches it.
        let hidden = RnRef::new(RoadNetworkLink::default());
        node.borrow_mut().links.push(hidden.downgrade());

        assert_eq!(collect_instances::<RoadNetworkLink>(&model), vec![hidden]);
    }

    #[test]
    fn cycles_terminate() {
        let mut model = RoadNetworkModel::new();
        let node = model.add_node(Vector3::ZERO);
        let link = model.add_link("loop");
        model.connect(&link, &node, &node);
        let lane = link.add_lane(RoadNetworkLane::default());
        node.borrow_mut().lanes.push(lane);

        assert_eq!(ReachableObjects::new(&model).count(), 3);
    }
}
