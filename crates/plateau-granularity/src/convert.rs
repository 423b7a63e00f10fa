//! The staged granularity conversion of a scene selection.
//!
//! Stages, with the progress reported at their start:
//!
//! | progress | stage |
//! |----------|-------|
//! | 0.1 | remember attributes and city-model metadata |
//! | 0.2 | scene objects to mesh model |
//! | 0.5 | backend conversion on a blocking worker |
//! | 0.8 | place the result under the common parent |

use std::sync::Arc;

use crate::attributes::{
    GmlIdToSerializedCityObj, SerializedCityObjectGetter, SerializedCityObjectGetterFromDict,
};
use crate::backend::{GranularityBackend, GranularityConvertOption};
use crate::common_parent::find_common_parent;
use crate::error::GranularityError;
use crate::hierarchy::{SceneHierarchy, SceneId, SceneObject};
use crate::instanced::InstancedCityModelDict;
use crate::mesh::{MeshModelConverter, MeshNode, SceneMesh};

/// Modal prompts shown to the user.
pub trait Dialogue {
    fn notify(&self, message: &str);
    /// Returns true when the user picks `accept`.
    fn confirm(&self, message: &str, accept: &str, decline: &str) -> bool;
}

/// Progress indicator for long-running work.
pub trait ProgressDisplay {
    fn display(&self, message: &str, progress: f32);
    fn clear(&self) {}
}

/// Clears the progress display however the pipeline exits.
struct ProgressGuard<'a> {
    display: &'a dyn ProgressDisplay,
}

impl<'a> ProgressGuard<'a> {
    fn new(display: &'a dyn ProgressDisplay) -> Self {
        ProgressGuard { display }
    }

    fn stage(&self, message: &str, progress: f32) {
        tracing::debug!("{} ({:.0}%)", message, progress * 100.0);
        self.display.display(message, progress);
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.display.clear();
    }
}

/// Result of a finished conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOutcome {
    /// Top-level converted objects; the new selection.
    pub roots: Vec<SceneId>,
    pub deleted_sources: bool,
    /// Roots that got their city-model metadata back.
    pub restored_instanced: usize,
}

impl ConvertOutcome {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

pub const NOTHING_TO_CONVERT: &str = "Nothing to convert.\nSelect active objects.";
pub const DELETE_SOURCES_PROMPT: &str = "Delete the source objects or keep them?";

/// Converts a selection of scene objects to another mesh granularity.
pub struct CityGranularityConverter {
    mesh_converter: Box<dyn MeshModelConverter>,
    backend: Arc<dyn GranularityBackend>,
}

impl CityGranularityConverter {
    pub fn new(mesh_converter: Box<dyn MeshModelConverter>, backend: Arc<dyn GranularityBackend>) -> Self {
        CityGranularityConverter {
            mesh_converter,
            backend,
        }
    }

    pub async fn convert(
        &self,
        hierarchy: &mut SceneHierarchy,
        sources: &[SceneId],
        option: &GranularityConvertOption,
        progress: &dyn ProgressDisplay,
        dialogue: &dyn Dialogue,
    ) -> Result<ConvertOutcome, GranularityError> {
        let progress = ProgressGuard::new(progress);

        progress.stage("Reading attributes...", 0.1);
        let attributes = GmlIdToSerializedCityObj::compose_from(hierarchy, sources)?;
        let instanced = InstancedCityModelDict::compose_from(hierarchy, sources)?;

        progress.stage("Converting scene objects to the common model...", 0.2);
        let src_model = self.mesh_converter.convert(hierarchy, sources)?;

        progress.stage("Converting the common model...", 0.5);
        let backend = Arc::clone(&self.backend);
        let worker_option = option.clone();
        let dst_model =
            tokio::task::spawn_blocking(move || backend.convert(src_model, &worker_option)).await??;

        progress.stage("Placing converted objects...", 0.8);
        let common_parent = find_common_parent(hierarchy, sources);
        let getter = SerializedCityObjectGetterFromDict::new(&attributes);
        let mut roots = Vec::with_capacity(dst_model.roots.len());
        for node in &dst_model.roots {
            roots.push(place_node(hierarchy, common_parent, node, &getter)?);
        }

        if roots.is_empty() {
            dialogue.notify(NOTHING_TO_CONVERT);
            return Ok(ConvertOutcome::default());
        }

        let restored_instanced = instanced.restore(hierarchy, &roots);

        let deleted_sources = dialogue.confirm(DELETE_SOURCES_PROMPT, "Delete", "Keep");
        if deleted_sources {
            for &source in sources {
                // Sources nested in an earlier source are already gone.
                if hierarchy.contains(source) {
                    hierarchy.remove_subtree(source)?;
                }
            }
        }

        tracing::info!(
            "converted {} objects into {} roots ({:?})",
            sources.len(),
            roots.len(),
            option.granularity
        );
        Ok(ConvertOutcome {
            roots,
            deleted_sources,
            restored_instanced,
        })
    }

    /// Runs [`convert`](Self::convert) and logs any failure instead of
    /// returning it.
    pub async fn convert_and_report(
        &self,
        hierarchy: &mut SceneHierarchy,
        sources: &[SceneId],
        option: &GranularityConvertOption,
        progress: &dyn ProgressDisplay,
        dialogue: &dyn Dialogue,
    ) -> Option<ConvertOutcome> {
        match self.convert(hierarchy, sources, option, progress, dialogue).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!("granularity conversion failed: {}", e);
                None
            }
        }
    }
}

fn place_node(
    hierarchy: &mut SceneHierarchy,
    parent: Option<SceneId>,
    node: &MeshNode,
    getter: &dyn SerializedCityObjectGetter,
) -> Result<SceneId, GranularityError> {
    let mut object = SceneObject::new(&node.name);
    object.mesh = node.mesh.as_ref().map(SceneMesh::from);
    object.city_objects = node.gml_ids.iter().filter_map(|id| getter.get_by_id(id)).collect();

    let id = hierarchy
        .add_under(parent, object)
        .map_err(|e| GranularityError::Placement(format!("'{}': {}", node.name, e)))?;
    for child in &node.children {
        place_node(hierarchy, Some(id), child, getter)?;
    }
    Ok(id)
}
