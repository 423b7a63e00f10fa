//! Scene hierarchy of named objects.
//!
//! The hierarchy is a forest stored in a `StableGraph` with edges from
//! parent to child. Ids stay valid when other objects are removed, so a
//! caller can hold on to selections across edits.

use std::fmt;

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::attributes::CityObject;
use crate::error::GranularityError;
use crate::instanced::InstancedCityModel;
use crate::mesh::SceneMesh;

/// Identifier of an object in a [`SceneHierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub u32);

impl From<NodeIndex<u32>> for SceneId {
    fn from(idx: NodeIndex<u32>) -> Self {
        SceneId(idx.index() as u32)
    }
}

impl From<SceneId> for NodeIndex<u32> {
    fn from(id: SceneId) -> Self {
        NodeIndex::new(id.0 as usize)
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SceneId({})", self.0)
    }
}

/// One object in the scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    /// Inactive objects are skipped by mesh conversion unless asked for.
    pub active: bool,
    pub mesh: Option<SceneMesh>,
    /// City objects whose attributes this scene object carries.
    pub city_objects: Vec<CityObject>,
    /// Import metadata, present on the root of an imported city model.
    pub instanced: Option<InstancedCityModel>,
}

impl SceneObject {
    pub fn new(name: &str) -> Self {
        SceneObject {
            name: name.to_string(),
            active: true,
            ..SceneObject::default()
        }
    }

    pub fn with_mesh(mut self, mesh: SceneMesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_city_object(mut self, city_object: CityObject) -> Self {
        self.city_objects.push(city_object);
        self
    }

    pub fn with_instanced(mut self, instanced: InstancedCityModel) -> Self {
        self.instanced = Some(instanced);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// A forest of scene objects.
#[derive(Debug, Clone, Default)]
pub struct SceneHierarchy {
    graph: StableGraph<SceneObject, (), Directed, u32>,
    roots: Vec<SceneId>,
}

impl SceneHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level object.
    pub fn add_root(&mut self, object: SceneObject) -> SceneId {
        let id = SceneId::from(self.graph.add_node(object));
        self.roots.push(id);
        id
    }

    /// Adds `object` as the last child of `parent`.
    pub fn add_child(&mut self, parent: SceneId, object: SceneObject) -> Result<SceneId, GranularityError> {
        self.check(parent)?;
        let idx = self.graph.add_node(object);
        self.graph.add_edge(parent.into(), idx, ());
        Ok(idx.into())
    }

    /// Adds `object` under `parent`, or as a root when there is no parent.
    pub fn add_under(
        &mut self,
        parent: Option<SceneId>,
        object: SceneObject,
    ) -> Result<SceneId, GranularityError> {
        match parent {
            Some(parent) => self.add_child(parent, object),
            None => Ok(self.add_root(object)),
        }
    }

    pub fn contains(&self, id: SceneId) -> bool {
        self.graph.contains_node(id.into())
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn get(&self, id: SceneId) -> Option<&SceneObject> {
        self.graph.node_weight(id.into())
    }

    pub fn get_mut(&mut self, id: SceneId) -> Option<&mut SceneObject> {
        self.graph.node_weight_mut(id.into())
    }

    /// Looks up an object, failing on a stale or foreign id.
    pub fn object(&self, id: SceneId) -> Result<&SceneObject, GranularityError> {
        self.get(id).ok_or(GranularityError::UnknownObject(id))
    }

    fn check(&self, id: SceneId) -> Result<(), GranularityError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(GranularityError::UnknownObject(id))
        }
    }

    pub fn roots(&self) -> &[SceneId] {
        &self.roots
    }

    pub fn parent(&self, id: SceneId) -> Option<SceneId> {
        self.graph
            .edges_directed(id.into(), Direction::Incoming)
            .next()
            .map(|e| e.source().into())
    }

    /// Children in the order they were added.
    pub fn children(&self, id: SceneId) -> SmallVec<[SceneId; 8]> {
        let mut children: SmallVec<[SceneId; 8]> = self
            .graph
            .edges_directed(id.into(), Direction::Outgoing)
            .map(|e| SceneId::from(e.target()))
            .collect();
        // petgraph yields the most recently added edge first.
        children.reverse();
        children
    }

    /// Proper ancestors, nearest first.
    pub fn ancestors(&self, id: SceneId) -> impl Iterator<Item = SceneId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// True when `ancestor` is `id` itself or one of its ancestors.
    pub fn is_child_of(&self, id: SceneId, ancestor: SceneId) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Number of ancestors; roots have depth 0.
    pub fn depth(&self, id: SceneId) -> usize {
        self.ancestors(id).count()
    }

    /// `id` and everything below it, in pre-order.
    pub fn descendants(&self, id: SceneId) -> Vec<SceneId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).into_iter().rev());
        }
        out
    }

    /// Path of names from the root down to `id`, joined with `/`.
    pub fn path(&self, id: SceneId) -> Option<String> {
        let mut names = vec![self.get(id)?.name.as_str()];
        for a in self.ancestors(id) {
            names.push(self.get(a)?.name.as_str());
        }
        names.reverse();
        Some(names.join("/"))
    }

    /// Removes `id` and all its descendants, returning the removed objects
    /// in pre-order.
    pub fn remove_subtree(&mut self, id: SceneId) -> Result<Vec<SceneObject>, GranularityError> {
        self.check(id)?;
        let doomed = self.descendants(id);
        self.roots.retain(|r| *r != id);
        Ok(doomed
            .into_iter()
            .filter_map(|d| self.graph.remove_node(d.into()))
            .collect())
    }
}
