//! End-to-end serialize/deserialize behaviour over whole road networks.

use plateau_core::{
    ObjectKind, RnId, RnRef, RoadNetworkLane, RoadNetworkLineString, RoadNetworkLink,
    RoadNetworkModel, RoadNetworkNode, RoadNetworkWay, Vector3,
};
use plateau_storage::{
    InMemoryStore, RoadNetworkDataLink, RoadNetworkDataNode, RoadNetworkSerializer, RoadNetworkStorage,
    RoadNetworkStore, SerializeError, SqliteStore,
};
use proptest::prelude::*;

fn serializer() -> RoadNetworkSerializer {
    RoadNetworkSerializer::new().unwrap()
}

fn way(from: Vector3, to: Vector3) -> RnRef<RoadNetworkWay> {
    RnRef::new(RoadNetworkWay::new(RnRef::new(RoadNetworkLineString::from_vertices([
        from, to,
    ]))))
}

#[test]
fn two_nodes_one_link() {
    let mut model = RoadNetworkModel::new();
    let a = model.add_node(Vector3::new(0.0, 0.0, 0.0));
    let b = model.add_node(Vector3::new(100.0, 0.0, 0.0));
    let link = model.add_link("A-B");
    model.connect(&link, &a, &b);

    let s = serializer();
    let storage = s.serialize(&model).unwrap();
    let data = &storage.primitive_data_storage;
    assert_eq!(data.nodes.len(), 2);
    assert_eq!(data.links.len(), 1);
    let record = &data.links.data_list()[0];
    assert_eq!(record.prev_node, RnId::new(0));
    assert_eq!(record.next_node, RnId::new(1));
    assert_eq!(data.nodes.data_list()[1].links, vec![RnId::new(0)]);

    let back = s.deserialize(&storage).unwrap();
    assert_eq!(back.nodes.len(), 2);
    let link = back.links[0].borrow();
    assert!(link.prev_node.as_ref().unwrap().ptr_eq(&back.nodes[0]));
    assert!(link.next_node.as_ref().unwrap().ptr_eq(&back.nodes[1]));
    assert_eq!(back.nodes[1].borrow().center, Vector3::new(100.0, 0.0, 0.0));
    let first = back.nodes[0].borrow();
    assert!(first.links[0].upgrade().unwrap().ptr_eq(&back.links[0]));
}

#[test]
fn shared_objects_are_stored_once_and_restored_shared() {
    let mut model = RoadNetworkModel::new();
    let a = model.add_node(Vector3::ZERO);
    let b = model.add_node(Vector3::new(10.0, 0.0, 0.0));
    let link = model.add_link("shared border");
    model.connect(&link, &a, &b);

    let centre = way(Vector3::ZERO, Vector3::new(10.0, 0.0, 0.0));
    let left = link.add_lane(RoadNetworkLane {
        right_way: Some(centre.clone()),
        ..RoadNetworkLane::default()
    });
    let right = link.add_lane(RoadNetworkLane {
        left_way: Some(centre.clone()),
        ..RoadNetworkLane::default()
    });
    // The lanes are also reachable through the node.
    a.borrow_mut().lanes.push(left.clone());
    b.add_track(&left, &right, Some(centre));

    let s = serializer();
    let storage = s.serialize(&model).unwrap();
    assert_eq!(storage.len_of(ObjectKind::Way), 1);
    assert_eq!(storage.len_of(ObjectKind::Lane), 2);
    assert_eq!(storage.len_of(ObjectKind::LineString), 1);
    storage.validate().unwrap();

    let back = s.deserialize(&storage).unwrap();
    let link = back.links[0].borrow();
    let (l, r) = (&link.main_lanes[0], &link.main_lanes[1]);
    assert!(back.nodes[0].borrow().lanes[0].ptr_eq(l));

    let l_way = l.borrow().right_way.clone().unwrap();
    let r_way = r.borrow().left_way.clone().unwrap();
    assert!(l_way.ptr_eq(&r_way));

    let node_b = back.nodes[1].borrow();
    let track = node_b.tracks[0].borrow();
    assert!(track.from_lane.as_ref().unwrap().ptr_eq(l));
    assert!(track.to_lane.as_ref().unwrap().ptr_eq(r));
    assert!(track.way.as_ref().unwrap().ptr_eq(&l_way));
}

#[test]
fn cycles_round_trip() {
    let mut model = RoadNetworkModel::new();
    let hub = model.add_node(Vector3::ZERO);
    let loop_link = model.add_link("loop");
    model.connect(&loop_link, &hub, &hub);
    let lane = loop_link.add_lane(RoadNetworkLane::default());
    hub.add_track(&lane, &lane, None);

    let s = serializer();
    let storage = s.serialize(&model).unwrap();
    let back = s.deserialize(&storage).unwrap();

    let link = &back.links[0];
    let node = &back.nodes[0];
    assert!(link.borrow().prev_node.as_ref().unwrap().ptr_eq(node));
    assert!(link.borrow().next_node.as_ref().unwrap().ptr_eq(node));
    let lane = link.borrow().main_lanes[0].clone();
    assert!(lane.borrow().parent_link.upgrade().unwrap().ptr_eq(link));
    let track = node.borrow().tracks[0].clone();
    assert!(track.borrow().from_lane.as_ref().unwrap().ptr_eq(&lane));
    assert!(track.borrow().way.is_none());
}

#[test]
fn null_references_become_invalid_ids() {
    let mut model = RoadNetworkModel::new();
    let link = model.add_link("dead end");
    link.add_lane(RoadNetworkLane::default());

    let storage = serializer().serialize(&model).unwrap();
    let data = &storage.primitive_data_storage;
    let record = &data.links.data_list()[0];
    assert!(!record.prev_node.is_valid());
    assert!(!record.next_node.is_valid());
    let lane = &data.lanes.data_list()[0];
    assert!(!lane.left_way.is_valid());
    assert_eq!(lane.parent_link, RnId::new(0));

    let json = storage.to_json().unwrap();
    assert!(json.contains("\"prev_node\":-1"));
    let back = serializer().deserialize(&storage).unwrap();
    assert!(back.links[0].borrow().prev_node.is_none());
}

#[test]
fn dropped_parent_reads_as_null() {
    let mut model = RoadNetworkModel::new();
    let node = model.add_node(Vector3::ZERO);
    {
        let temp = RnRef::new(RoadNetworkLink::default());
        node.borrow_mut().links.push(temp.downgrade());
    }
    let storage = serializer().serialize(&model).unwrap();
    assert_eq!(storage.len_of(ObjectKind::Link), 0);
    assert_eq!(
        storage.primitive_data_storage.nodes.data_list()[0].links,
        vec![RnId::invalid()]
    );
}

#[test]
fn unknown_identifier_aborts_without_output() {
    let mut storage = RoadNetworkStorage::default();
    storage
        .primitive_data_storage
        .links
        .write_new(vec![RoadNetworkDataLink {
            name: "broken".into(),
            next_node: RnId::new(5),
            ..RoadNetworkDataLink::default()
        }])
        .unwrap();
    assert!(storage.validate().is_err());
    let result = serializer().deserialize(&storage);
    assert!(matches!(
        result,
        Err(SerializeError::UnknownId {
            kind: ObjectKind::Node,
            id: 5
        })
    ));
}

#[test]
fn malformed_negative_identifier_is_not_read_as_null() {
    let mut storage = RoadNetworkStorage::default();
    let data = &mut storage.primitive_data_storage;
    data.nodes
        .write_new(vec![RoadNetworkDataNode::default()])
        .unwrap();
    data.links
        .write_new(vec![RoadNetworkDataLink {
            name: "corrupt".into(),
            prev_node: RnId::new(-7),
            next_node: RnId::new(0),
            ..RoadNetworkDataLink::default()
        }])
        .unwrap();

    assert!(storage.validate().is_err());
    let result = serializer().deserialize(&storage);
    assert!(matches!(
        result,
        Err(SerializeError::UnknownId {
            kind: ObjectKind::Node,
            id: -7
        })
    ));
}

#[test]
fn stores_agree_on_content() {
    let mut model = RoadNetworkModel::new();
    let a = model.add_node(Vector3::new(1.0, 1.0, 0.0));
    let b = model.add_node(Vector3::new(2.0, 2.0, 0.0));
    let link = model.add_link("diagonal");
    model.connect(&link, &a, &b);
    link.add_lane(RoadNetworkLane {
        left_way: Some(way(Vector3::new(1.0, 1.0, 0.0), Vector3::new(2.0, 2.0, 0.0))),
        ..RoadNetworkLane::default()
    });

    let s = serializer();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("network.db");
    let mut sqlite = SqliteStore::new(path.to_str().unwrap()).unwrap();
    let mut memory = InMemoryStore::new();

    let on_disk = sqlite.save_model("v1", &model, &s).unwrap();
    let in_memory = memory.save_model("v1", &model, &s).unwrap();
    assert_eq!(on_disk, in_memory);

    // Reopen to make sure the snapshot really reached the file.
    drop(sqlite);
    let sqlite = SqliteStore::new(path.to_str().unwrap()).unwrap();
    assert_eq!(sqlite.load("v1").unwrap(), memory.load("v1").unwrap());

    let back = sqlite.load_model("v1", &s).unwrap();
    let lane = back.links[0].borrow().main_lanes[0].clone();
    let left = lane.borrow().left_way.clone().unwrap();
    let points = left.borrow().line_string.clone().unwrap().borrow().points.len();
    assert_eq!(points, 2);
}

// ---------------------------------------------------------------------------
// Properties over generated networks
// ---------------------------------------------------------------------------

/// Shape of a generated network: node count, and per link its end nodes,
/// lane count and whether its lanes share one border way.
#[derive(Debug, Clone)]
struct NetworkShape {
    nodes: usize,
    links: Vec<(usize, usize, usize, bool)>,
    tracks: bool,
}

fn network_shape() -> impl Strategy<Value = NetworkShape> {
    (1usize..6).prop_flat_map(|nodes| {
        (
            Just(nodes),
            prop::collection::vec((0..nodes, 0..nodes, 0usize..3, any::<bool>()), 0..6),
            any::<bool>(),
        )
            .prop_map(|(nodes, links, tracks)| NetworkShape { nodes, links, tracks })
    })
}

fn build(shape: &NetworkShape) -> RoadNetworkModel {
    let mut model = RoadNetworkModel::new();
    let nodes: Vec<RnRef<RoadNetworkNode>> = (0..shape.nodes)
        .map(|i| model.add_node(Vector3::new(i as f32, 0.0, 0.0)))
        .collect();

    for (i, &(prev, next, lanes, shared)) in shape.links.iter().enumerate() {
        let link = model.add_link(&format!("link {}", i));
        model.connect(&link, &nodes[prev], &nodes[next]);
        let border = way(nodes[prev].borrow().center, nodes[next].borrow().center);
        let mut made = Vec::new();
        for _ in 0..lanes {
            let lane_way = if shared {
                border.clone()
            } else {
                way(nodes[prev].borrow().center, nodes[next].borrow().center)
            };
            made.push(link.add_lane(RoadNetworkLane {
                left_way: Some(lane_way),
                attributes: i as i32,
                ..RoadNetworkLane::default()
            }));
        }
        link.add_block(i as i32);
        if shape.tracks {
            if let (Some(first), Some(last)) = (made.first(), made.last()) {
                nodes[next].add_track(first, last, Some(border.clone()));
                nodes[next].borrow_mut().lanes.push(first.clone());
            }
        }
    }
    model
}

fn permutation() -> impl Strategy<Value = Vec<ObjectKind>> {
    Just(ObjectKind::ALL.to_vec()).prop_shuffle()
}

proptest! {
    #[test]
    fn collection_order_does_not_change_storage(shape in network_shape(), order in permutation()) {
        let model = build(&shape);
        let s = serializer();
        let fixed = s.serialize(&model).unwrap();
        let shuffled = s.serialize_in_order(&model, &order).unwrap();
        prop_assert_eq!(fixed, shuffled);
    }

    #[test]
    fn round_trip_preserves_storage(shape in network_shape()) {
        let model = build(&shape);
        let s = serializer();
        let storage = s.serialize(&model).unwrap();
        prop_assert!(storage.validate().is_ok());

        let back = s.deserialize(&storage).unwrap();
        prop_assert_eq!(back.links.len(), shape.links.len());
        prop_assert_eq!(back.nodes.len(), shape.nodes);
        let again = s.serialize(&back).unwrap();
        prop_assert_eq!(again, storage);
    }
}
