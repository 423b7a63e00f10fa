//! Road-network domain objects and the [`RoadNetworkModel`] root.
//!
//! Strong references point "down" the network (link to lanes, lane to ways,
//! way to line string, line string to points, node to tracks). References
//! back to a link (`parent_link`, `RoadNetworkNode::links`) are weak, so the
//! strong graph stays acyclic and the model frees itself on drop while the
//! logical graph keeps its cycles.

use crate::error::FieldError;
use crate::fields::{FieldDecl, FieldSlot, FieldType, FieldValue, Fields, Schema};
use crate::handle::{RnRef, RnWeak};
use crate::kind::{ObjectKind, ObjectRef};
use crate::vector::Vector3;

/// A vertex of the network.
#[derive(Debug, Clone, Default)]
pub struct RoadNetworkPoint {
    pub vertex: Vector3,
}

/// An ordered run of points.
#[derive(Debug, Clone, Default)]
pub struct RoadNetworkLineString {
    pub points: Vec<RnRef<RoadNetworkPoint>>,
}

/// A directed view onto a line string, used as a lane side or border.
#[derive(Debug, Clone, Default)]
pub struct RoadNetworkWay {
    pub line_string: Option<RnRef<RoadNetworkLineString>>,
    pub is_reversed: bool,
    pub is_reverse_normal: bool,
}

/// A lane of a link, bounded by ways on both sides and at both ends.
#[derive(Debug, Clone, Default)]
pub struct RoadNetworkLane {
    pub parent_link: RnWeak<RoadNetworkLink>,
    pub left_way: Option<RnRef<RoadNetworkWay>>,
    pub right_way: Option<RnRef<RoadNetworkWay>>,
    pub prev_border: Option<RnRef<RoadNetworkWay>>,
    pub next_border: Option<RnRef<RoadNetworkWay>>,
    /// Lane attribute flags as stored by the importer.
    pub attributes: i32,
}

/// A non-driving strip of a link (sidewalk, median).
#[derive(Debug, Clone, Default)]
pub struct RoadNetworkBlock {
    pub lane_type: i32,
    pub parent_link: RnWeak<RoadNetworkLink>,
}

/// A road segment between two nodes.
#[derive(Debug, Clone, Default)]
pub struct RoadNetworkLink {
    pub name: String,
    pub prev_node: Option<RnRef<RoadNetworkNode>>,
    pub next_node: Option<RnRef<RoadNetworkNode>>,
    pub main_lanes: Vec<RnRef<RoadNetworkLane>>,
    pub blocks: Vec<RnRef<RoadNetworkBlock>>,
}

/// A path through a node from one lane to another.
#[derive(Debug, Clone, Default)]
pub struct RoadNetworkTrack {
    pub from_lane: Option<RnRef<RoadNetworkLane>>,
    pub to_lane: Option<RnRef<RoadNetworkLane>>,
    pub way: Option<RnRef<RoadNetworkWay>>,
}

/// An intersection or dead end joining links.
#[derive(Debug, Clone, Default)]
pub struct RoadNetworkNode {
    pub center: Vector3,
    pub tracks: Vec<RnRef<RoadNetworkTrack>>,
    pub links: Vec<RnWeak<RoadNetworkLink>>,
    pub lanes: Vec<RnRef<RoadNetworkLane>>,
}

// ---------------------------------------------------------------------------
// Field tables
// ---------------------------------------------------------------------------

const fn reference(kind: ObjectKind) -> FieldType {
    FieldType::Ref(kind)
}

static POINT_SCHEMA: Schema = Schema {
    type_name: "RoadNetworkPoint",
    fields: &[FieldDecl::new("vertex", FieldType::Vector3)],
};

static LINE_STRING_SCHEMA: Schema = Schema {
    type_name: "RoadNetworkLineString",
    fields: &[FieldDecl::new(
        "points",
        FieldType::List(&FieldType::Ref(ObjectKind::Point)),
    )],
};

static WAY_SCHEMA: Schema = Schema {
    type_name: "RoadNetworkWay",
    fields: &[
        FieldDecl::new("line_string", reference(ObjectKind::LineString)),
        FieldDecl::new("is_reversed", FieldType::Bool),
        FieldDecl::new("is_reverse_normal", FieldType::Bool),
    ],
};

static LANE_SCHEMA: Schema = Schema {
    type_name: "RoadNetworkLane",
    fields: &[
        FieldDecl::new("parent_link", FieldType::WeakRef(ObjectKind::Link)),
        FieldDecl::new("left_way", reference(ObjectKind::Way)),
        FieldDecl::new("right_way", reference(ObjectKind::Way)),
        FieldDecl::new("prev_border", reference(ObjectKind::Way)),
        FieldDecl::new("next_border", reference(ObjectKind::Way)),
        FieldDecl::new("attributes", FieldType::Int),
    ],
};

static BLOCK_SCHEMA: Schema = Schema {
    type_name: "RoadNetworkBlock",
    fields: &[
        FieldDecl::new("lane_type", FieldType::Int),
        FieldDecl::new("parent_link", FieldType::WeakRef(ObjectKind::Link)),
    ],
};

static LINK_SCHEMA: Schema = Schema {
    type_name: "RoadNetworkLink",
    fields: &[
        FieldDecl::new("name", FieldType::Text),
        FieldDecl::new("prev_node", reference(ObjectKind::Node)),
        FieldDecl::new("next_node", reference(ObjectKind::Node)),
        FieldDecl::new(
            "main_lanes",
            FieldType::List(&FieldType::Ref(ObjectKind::Lane)),
        ),
        FieldDecl::new("blocks", FieldType::List(&FieldType::Ref(ObjectKind::Block))),
    ],
};

static TRACK_SCHEMA: Schema = Schema {
    type_name: "RoadNetworkTrack",
    fields: &[
        FieldDecl::new("from_lane", reference(ObjectKind::Lane)),
        FieldDecl::new("to_lane", reference(ObjectKind::Lane)),
        FieldDecl::new("way", reference(ObjectKind::Way)),
    ],
};

static NODE_SCHEMA: Schema = Schema {
    type_name: "RoadNetworkNode",
    fields: &[
        FieldDecl::new("center", FieldType::Vector3),
        FieldDecl::new("tracks", FieldType::List(&FieldType::Ref(ObjectKind::Track))),
        FieldDecl::new(
            "links",
            FieldType::List(&FieldType::WeakRef(ObjectKind::Link)),
        ),
        FieldDecl::new("lanes", FieldType::List(&FieldType::Ref(ObjectKind::Lane))),
    ],
};

impl Fields for RoadNetworkPoint {
    fn schema() -> &'static Schema {
        &POINT_SCHEMA
    }

    fn type_schema(&self) -> &'static Schema {
        &POINT_SCHEMA
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "vertex" => Some(FieldValue::Vector3(self.vertex)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        let slot = FieldSlot::new(&POINT_SCHEMA, name);
        match name {
            "vertex" => self.vertex = slot.vector3(value)?,
            _ => return Err(slot.unknown()),
        }
        Ok(())
    }
}

impl Fields for RoadNetworkLineString {
    fn schema() -> &'static Schema {
        &LINE_STRING_SCHEMA
    }

    fn type_schema(&self) -> &'static Schema {
        &LINE_STRING_SCHEMA
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "points" => Some(FieldValue::objects(&self.points)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        let slot = FieldSlot::new(&LINE_STRING_SCHEMA, name);
        match name {
            "points" => self.points = slot.objects(value)?,
            _ => return Err(slot.unknown()),
        }
        Ok(())
    }
}

impl Fields for RoadNetworkWay {
    fn schema() -> &'static Schema {
        &WAY_SCHEMA
    }

    fn type_schema(&self) -> &'static Schema {
        &WAY_SCHEMA
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "line_string" => Some(FieldValue::object(self.line_string.as_ref())),
            "is_reversed" => Some(FieldValue::Bool(self.is_reversed)),
            "is_reverse_normal" => Some(FieldValue::Bool(self.is_reverse_normal)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        let slot = FieldSlot::new(&WAY_SCHEMA, name);
        match name {
            "line_string" => self.line_string = slot.object(value)?,
            "is_reversed" => self.is_reversed = slot.bool(value)?,
            "is_reverse_normal" => self.is_reverse_normal = slot.bool(value)?,
            _ => return Err(slot.unknown()),
        }
        Ok(())
    }
}

impl Fields for RoadNetworkLane {
    fn schema() -> &'static Schema {
        &LANE_SCHEMA
    }

    fn type_schema(&self) -> &'static Schema {
        &LANE_SCHEMA
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "parent_link" => Some(FieldValue::weak(&self.parent_link)),
            "left_way" => Some(FieldValue::object(self.left_way.as_ref())),
            "right_way" => Some(FieldValue::object(self.right_way.as_ref())),
            "prev_border" => Some(FieldValue::object(self.prev_border.as_ref())),
            "next_border" => Some(FieldValue::object(self.next_border.as_ref())),
            "attributes" => Some(FieldValue::Int(self.attributes)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        let slot = FieldSlot::new(&LANE_SCHEMA, name);
        match name {
            "parent_link" => self.parent_link = slot.weak(value)?,
            "left_way" => self.left_way = slot.object(value)?,
            "right_way" => self.right_way = slot.object(value)?,
            "prev_border" => self.prev_border = slot.object(value)?,
            "next_border" => self.next_border = slot.object(value)?,
            "attributes" => self.attributes = slot.int(value)?,
            _ => return Err(slot.unknown()),
        }
        Ok(())
    }
}

impl Fields for RoadNetworkBlock {
    fn schema() -> &'static Schema {
        &BLOCK_SCHEMA
    }

    fn type_schema(&self) -> &'static Schema {
        &BLOCK_SCHEMA
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "lane_type" => Some(FieldValue::Int(self.lane_type)),
            "parent_link" => Some(FieldValue::weak(&self.parent_link)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        let slot = FieldSlot::new(&BLOCK_SCHEMA, name);
        match name {
            "lane_type" => self.lane_type = slot.int(value)?,
            "parent_link" => self.parent_link = slot.weak(value)?,
            _ => return Err(slot.unknown()),
        }
        Ok(())
    }
}

impl Fields for RoadNetworkLink {
    fn schema() -> &'static Schema {
        &LINK_SCHEMA
    }

    fn type_schema(&self) -> &'static Schema {
        &LINK_SCHEMA
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "name" => Some(FieldValue::Text(self.name.clone())),
            "prev_node" => Some(FieldValue::object(self.prev_node.as_ref())),
            "next_node" => Some(FieldValue::object(self.next_node.as_ref())),
            "main_lanes" => Some(FieldValue::objects(&self.main_lanes)),
            "blocks" => Some(FieldValue::objects(&self.blocks)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        let slot = FieldSlot::new(&LINK_SCHEMA, name);
        match name {
            "name" => self.name = slot.text(value)?,
            "prev_node" => self.prev_node = slot.object(value)?,
            "next_node" => self.next_node = slot.object(value)?,
            "main_lanes" => self.main_lanes = slot.objects(value)?,
            "blocks" => self.blocks = slot.objects(value)?,
            _ => return Err(slot.unknown()),
        }
        Ok(())
    }
}

impl Fields for RoadNetworkTrack {
    fn schema() -> &'static Schema {
        &TRACK_SCHEMA
    }

    fn type_schema(&self) -> &'static Schema {
        &TRACK_SCHEMA
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "from_lane" => Some(FieldValue::object(self.from_lane.as_ref())),
            "to_lane" => Some(FieldValue::object(self.to_lane.as_ref())),
            "way" => Some(FieldValue::object(self.way.as_ref())),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        let slot = FieldSlot::new(&TRACK_SCHEMA, name);
        match name {
            "from_lane" => self.from_lane = slot.object(value)?,
            "to_lane" => self.to_lane = slot.object(value)?,
            "way" => self.way = slot.object(value)?,
            _ => return Err(slot.unknown()),
        }
        Ok(())
    }
}

impl Fields for RoadNetworkNode {
    fn schema() -> &'static Schema {
        &NODE_SCHEMA
    }

    fn type_schema(&self) -> &'static Schema {
        &NODE_SCHEMA
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "center" => Some(FieldValue::Vector3(self.center)),
            "tracks" => Some(FieldValue::objects(&self.tracks)),
            "links" => Some(FieldValue::weaks(&self.links)),
            "lanes" => Some(FieldValue::objects(&self.lanes)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        let slot = FieldSlot::new(&NODE_SCHEMA, name);
        match name {
            "center" => self.center = slot.vector3(value)?,
            "tracks" => self.tracks = slot.objects(value)?,
            "links" => self.links = slot.weaks(value)?,
            "lanes" => self.lanes = slot.objects(value)?,
            _ => return Err(slot.unknown()),
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Construction helpers
// ---------------------------------------------------------------------------

impl RoadNetworkPoint {
    pub fn new(vertex: Vector3) -> Self {
        RoadNetworkPoint { vertex }
    }
}

impl RoadNetworkLineString {
    /// Builds a line string with one fresh point per vertex.
    pub fn from_vertices(vertices: impl IntoIterator<Item = Vector3>) -> Self {
        RoadNetworkLineString {
            points: vertices
                .into_iter()
                .map(|v| RnRef::new(RoadNetworkPoint::new(v)))
                .collect(),
        }
    }
}

impl RoadNetworkWay {
    pub fn new(line_string: RnRef<RoadNetworkLineString>) -> Self {
        RoadNetworkWay {
            line_string: Some(line_string),
            is_reversed: false,
            is_reverse_normal: false,
        }
    }
}

impl RnRef<RoadNetworkLink> {
    /// Appends a lane to this link and points the lane back at it.
    pub fn add_lane(&self, mut lane: RoadNetworkLane) -> RnRef<RoadNetworkLane> {
        lane.parent_link = self.downgrade();
        let lane = RnRef::new(lane);
        self.borrow_mut().main_lanes.push(lane.clone());
        lane
    }

    /// Appends a block of the given lane type to this link.
    pub fn add_block(&self, lane_type: i32) -> RnRef<RoadNetworkBlock> {
        let block = RnRef::new(RoadNetworkBlock {
            lane_type,
            parent_link: self.downgrade(),
        });
        self.borrow_mut().blocks.push(block.clone());
        block
    }
}

impl RnRef<RoadNetworkNode> {
    /// Adds a track from one lane to another through this node.
    pub fn add_track(
        &self,
        from_lane: &RnRef<RoadNetworkLane>,
        to_lane: &RnRef<RoadNetworkLane>,
        way: Option<RnRef<RoadNetworkWay>>,
    ) -> RnRef<RoadNetworkTrack> {
        let track = RnRef::new(RoadNetworkTrack {
            from_lane: Some(from_lane.clone()),
            to_lane: Some(to_lane.clone()),
            way,
        });
        self.borrow_mut().tracks.push(track.clone());
        track
    }
}

/// Root of a road network: every link and node of the network.
///
/// All other objects are reached through the links and nodes.
#[derive(Debug, Clone, Default)]
pub struct RoadNetworkModel {
    pub links: Vec<RnRef<RoadNetworkLink>>,
    pub nodes: Vec<RnRef<RoadNetworkNode>>,
}

impl RoadNetworkModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_link(&mut self, name: &str) -> RnRef<RoadNetworkLink> {
        let link = RnRef::new(RoadNetworkLink {
            name: name.to_string(),
            ..RoadNetworkLink::default()
        });
        self.links.push(link.clone());
        link
    }

    pub fn add_node(&mut self, center: Vector3) -> RnRef<RoadNetworkNode> {
        let node = RnRef::new(RoadNetworkNode {
            center,
            ..RoadNetworkNode::default()
        });
        self.nodes.push(node.clone());
        node
    }

    /// Connects `link` from `prev` to `next` and registers the link with
    /// both nodes.
    pub fn connect(
        &self,
        link: &RnRef<RoadNetworkLink>,
        prev: &RnRef<RoadNetworkNode>,
        next: &RnRef<RoadNetworkNode>,
    ) {
        {
            let mut l = link.borrow_mut();
            l.prev_node = Some(prev.clone());
            l.next_node = Some(next.clone());
        }
        prev.borrow_mut().links.push(link.downgrade());
        if !prev.ptr_eq(next) {
            next.borrow_mut().links.push(link.downgrade());
        }
    }

    /// Root objects of the graph: links first, then nodes.
    pub fn roots(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        self.links
            .iter()
            .cloned()
            .map(ObjectRef::Link)
            .chain(self.nodes.iter().cloned().map(ObjectRef::Node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_model() -> (RoadNetworkModel, RnRef<RoadNetworkLink>) {
        let mut model = RoadNetworkModel::new();
        let a = model.add_node(Vector3::new(0.0, 0.0, 0.0));
        let b = model.add_node(Vector3::new(10.0, 0.0, 0.0));
        let link = model.add_link("main street");
        model.connect(&link, &a, &b);
        (model, link)
    }

    #[test]
    fn connect_sets_both_ends_and_back_references() {
        let (model, link) = two_node_model();
        let l = link.borrow();
        assert_eq!(l.prev_node.as_ref(), Some(&model.nodes[0]));
        assert_eq!(l.next_node.as_ref(), Some(&model.nodes[1]));
        for node in &model.nodes {
            let n = node.borrow();
            assert_eq!(n.links.len(), 1);
            assert_eq!(n.links[0].upgrade().as_ref(), Some(&link));
        }
    }

    #[test]
    fn add_lane_points_back_at_link() {
        let (_model, link) = two_node_model();
        let lane = link.add_lane(RoadNetworkLane::default());
        assert_eq!(lane.borrow().parent_link.upgrade(), Some(link.clone()));
        assert_eq!(link.borrow().main_lanes, vec![lane]);
    }

    #[test]
    fn get_field_returns_declared_fields_only() {
        let (_model, link) = two_node_model();
        let l = link.borrow();
        for decl in RoadNetworkLink::schema().fields {
            assert!(l.get_field(decl.name).is_some(), "missing {}", decl.name);
        }
        assert!(l.get_field("target_tran").is_none());
    }

    #[test]
    fn set_field_rejects_wrong_value_shape() {
        let mut way = RoadNetworkWay::default();
        let err = way.set_field("is_reversed", FieldValue::Int(1)).unwrap_err();
        assert!(matches!(err, FieldError::ValueMismatch { .. }));
        assert_eq!(
            err.to_string(),
            "RoadNetworkWay.is_reversed: expected bool value, found int"
        );

        let err = way.set_field("missing", FieldValue::Bool(true)).unwrap_err();
        assert!(matches!(err, FieldError::UnknownField { .. }));
    }

    #[test]
    fn set_field_rejects_null_in_strong_list() {
        let mut line = RoadNetworkLineString::default();
        let err = line
            .set_field("points", FieldValue::List(vec![FieldValue::Object(None)]))
            .unwrap_err();
        assert!(matches!(err, FieldError::NullInList { .. }));
    }

    #[test]
    fn weak_list_accepts_null() {
        let mut node = RoadNetworkNode::default();
        node.set_field("links", FieldValue::List(vec![FieldValue::Object(None)]))
            .unwrap();
        assert_eq!(node.links.len(), 1);
        assert!(node.links[0].is_null());
    }

    #[test]
    fn dropping_model_releases_objects() {
        let (model, link) = two_node_model();
        let lane = link.add_lane(RoadNetworkLane::default());
        let weak_lane = lane.downgrade();
        drop(lane);
        drop(link);
        drop(model);
        assert!(weak_lane.is_null());
    }

    #[test]
    fn roots_lists_links_then_nodes() {
        let (model, _link) = two_node_model();
        let kinds: Vec<ObjectKind> = model.roots().map(|r| r.kind()).collect();
        assert_eq!(kinds, vec![ObjectKind::Link, ObjectKind::Node, ObjectKind::Node]);
    }
}
