//! Mesh data on scene objects and the engine-neutral mesh model that the
//! granularity backend consumes.

use serde::{Deserialize, Serialize};

use plateau_core::Vector3;

use crate::error::GranularityError;
use crate::hierarchy::{SceneHierarchy, SceneId, SceneObject};

/// Double-precision vertex used by the mesh model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3d {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3d { x, y, z }
    }

    /// Narrows back to scene precision.
    pub fn to_vector3(self) -> Vector3 {
        Vector3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl From<Vector3> for Vector3d {
    fn from(v: Vector3) -> Self {
        Vector3d::new(v.x.into(), v.y.into(), v.z.into())
    }
}

/// Triangle mesh attached to a scene object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneMesh {
    pub vertices: Vec<Vector3>,
    /// Three indices per triangle.
    pub triangles: Vec<u32>,
}

impl SceneMesh {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }
}

/// Mesh in the model the backend understands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMesh {
    pub vertices: Vec<Vector3d>,
    pub indices: Vec<u32>,
}

impl From<&SceneMesh> for ModelMesh {
    fn from(mesh: &SceneMesh) -> Self {
        ModelMesh {
            vertices: mesh.vertices.iter().copied().map(Vector3d::from).collect(),
            indices: mesh.triangles.clone(),
        }
    }
}

impl From<&ModelMesh> for SceneMesh {
    fn from(mesh: &ModelMesh) -> Self {
        SceneMesh {
            vertices: mesh.vertices.iter().map(|v| v.to_vector3()).collect(),
            triangles: mesh.indices.clone(),
        }
    }
}

/// A node of the mesh model tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshNode {
    pub name: String,
    /// GML ids of the city objects this node stands for.
    pub gml_ids: Vec<String>,
    pub mesh: Option<ModelMesh>,
    pub children: Vec<MeshNode>,
}

impl MeshNode {
    pub fn new(name: &str) -> Self {
        MeshNode {
            name: name.to_string(),
            ..MeshNode::default()
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MeshNode::node_count).sum::<usize>()
    }
}

/// Forest of mesh nodes exchanged with the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshModel {
    pub roots: Vec<MeshNode>,
}

impl MeshModel {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(MeshNode::node_count).sum()
    }
}

/// Turns selected scene objects into a [`MeshModel`].
pub trait MeshModelConverter: Send + Sync {
    fn convert(&self, hierarchy: &SceneHierarchy, sources: &[SceneId]) -> Result<MeshModel, GranularityError>;
}

/// Copies the selected subtrees one to one.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyMeshConverter {
    /// Also export objects that are switched off in the scene.
    pub include_inactive: bool,
}

impl HierarchyMeshConverter {
    fn node(&self, hierarchy: &SceneHierarchy, id: SceneId) -> Result<Option<MeshNode>, GranularityError> {
        let object = hierarchy.object(id)?;
        if !object.active && !self.include_inactive {
            return Ok(None);
        }
        let mut node = mesh_node(object);
        for child in hierarchy.children(id) {
            if let Some(child) = self.node(hierarchy, child)? {
                node.children.push(child);
            }
        }
        Ok(Some(node))
    }
}

fn mesh_node(object: &SceneObject) -> MeshNode {
    MeshNode {
        name: object.name.clone(),
        gml_ids: object.city_objects.iter().map(|c| c.gml_id.clone()).collect(),
        mesh: object.mesh.as_ref().map(ModelMesh::from),
        children: Vec::new(),
    }
}

impl MeshModelConverter for HierarchyMeshConverter {
    fn convert(&self, hierarchy: &SceneHierarchy, sources: &[SceneId]) -> Result<MeshModel, GranularityError> {
        let mut model = MeshModel::default();
        for &source in sources {
            if let Some(node) = self.node(hierarchy, source)? {
                model.roots.push(node);
            }
        }
        tracing::debug!(
            "converted {} scene objects into {} mesh nodes",
            sources.len(),
            model.node_count()
        );
        Ok(model)
    }
}
