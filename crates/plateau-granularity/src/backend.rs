//! Backends that regroup a mesh model to another granularity.

use serde::{Deserialize, Serialize};

use crate::error::GranularityError;
use crate::mesh::{MeshModel, MeshNode, ModelMesh};

/// Unit that converted objects are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MeshGranularity {
    /// One object per smallest feature (wall, roof, ...).
    PerAtomicFeatureObject,
    /// One object per primary feature (building, road, ...).
    #[default]
    PerPrimaryFeatureObject,
    /// One object per imported area.
    PerCityModelArea,
}

/// Options for one granularity conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GranularityConvertOption {
    pub granularity: MeshGranularity,
    /// Grid cells per side when a backend splits areas.
    pub grid_count: u32,
}

impl Default for GranularityConvertOption {
    fn default() -> Self {
        GranularityConvertOption {
            granularity: MeshGranularity::default(),
            grid_count: 1,
        }
    }
}

impl GranularityConvertOption {
    pub fn new(granularity: MeshGranularity) -> Self {
        GranularityConvertOption {
            granularity,
            ..GranularityConvertOption::default()
        }
    }
}

/// Splits or merges a mesh model. Runs on a blocking worker thread.
pub trait GranularityBackend: Send + Sync + 'static {
    fn convert(&self, model: MeshModel, option: &GranularityConvertOption) -> Result<MeshModel, GranularityError>;
}

/// Regroups the model by merging subtrees.
///
/// Each root keeps its name. Below it, area granularity merges the whole
/// subtree into the root, primary granularity merges each child subtree into
/// one child, and atomic granularity lists every node that has a mesh as a
/// direct child.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergingBackend;

impl GranularityBackend for MergingBackend {
    fn convert(&self, model: MeshModel, option: &GranularityConvertOption) -> Result<MeshModel, GranularityError> {
        if option.grid_count == 0 {
            return Err(GranularityError::Backend("grid count must be at least 1".into()));
        }
        let roots = model
            .roots
            .into_iter()
            .map(|root| match option.granularity {
                MeshGranularity::PerCityModelArea => merged(root),
                MeshGranularity::PerPrimaryFeatureObject => {
                    let mut area = MeshNode::new(&root.name);
                    area.gml_ids = root.gml_ids;
                    area.mesh = root.mesh;
                    area.children = root.children.into_iter().map(merged).collect();
                    area
                }
                MeshGranularity::PerAtomicFeatureObject => {
                    let mut area = MeshNode::new(&root.name);
                    for child in root.children {
                        flatten(child, &mut area.children);
                    }
                    area.gml_ids = root.gml_ids;
                    area.mesh = root.mesh;
                    area
                }
            })
            .collect();
        Ok(MeshModel { roots })
    }
}

/// Collapses `node` and its subtree into a single node.
fn merged(node: MeshNode) -> MeshNode {
    let mut out = MeshNode::new(&node.name);
    absorb(&mut out, node);
    out
}

fn absorb(into: &mut MeshNode, node: MeshNode) {
    into.gml_ids.extend(node.gml_ids);
    if let Some(mesh) = node.mesh {
        append_mesh(into.mesh.get_or_insert_with(ModelMesh::default), &mesh);
    }
    for child in node.children {
        absorb(into, child);
    }
}

fn flatten(node: MeshNode, out: &mut Vec<MeshNode>) {
    let MeshNode {
        name,
        gml_ids,
        mesh,
        children,
    } = node;
    if mesh.is_some() {
        out.push(MeshNode {
            name,
            gml_ids,
            mesh,
            children: Vec::new(),
        });
    }
    for child in children {
        flatten(child, out);
    }
}

fn append_mesh(into: &mut ModelMesh, mesh: &ModelMesh) {
    let offset = into.vertices.len() as u32;
    into.vertices.extend_from_slice(&mesh.vertices);
    into.indices.extend(mesh.indices.iter().map(|i| i + offset));
}
