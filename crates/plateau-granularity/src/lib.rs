//! Mesh granularity conversion for city models placed in a scene.
//!
//! A selection of scene objects is turned into an engine-neutral mesh
//! model, regrouped by a [`GranularityBackend`] (per atomic feature, per
//! primary feature or per area), and placed back into the scene under the
//! selection's common parent with its city-object attributes re-attached.
//!
//! # Modules
//!
//! - [`hierarchy`]: scene objects in a parent/child forest
//! - [`common_parent`]: nearest shared ancestor of a selection
//! - [`attributes`]: city objects and the attribute snapshot by GML id
//! - [`instanced`]: city-model import metadata carried across conversion
//! - [`mesh`]: scene meshes and the mesh model
//! - [`backend`]: conversion options and backends
//! - [`convert`]: the staged asynchronous pipeline
//! - [`error`]: error type

pub mod attributes;
pub mod backend;
pub mod common_parent;
pub mod convert;
pub mod error;
pub mod hierarchy;
pub mod instanced;
pub mod mesh;

pub use attributes::{
    AttributeValue, CityObject, GmlIdToSerializedCityObj, SerializedCityObjectGetter,
    SerializedCityObjectGetterFromDict,
};
pub use backend::{GranularityBackend, GranularityConvertOption, MergingBackend, MeshGranularity};
pub use common_parent::find_common_parent;
pub use convert::{CityGranularityConverter, ConvertOutcome, Dialogue, ProgressDisplay};
pub use error::GranularityError;
pub use hierarchy::{SceneHierarchy, SceneId, SceneObject};
pub use instanced::{InstancedCityModel, InstancedCityModelDict};
pub use mesh::{
    HierarchyMeshConverter, MeshModel, MeshModelConverter, MeshNode, ModelMesh, SceneMesh, Vector3d,
};
