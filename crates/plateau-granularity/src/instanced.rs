//! Import metadata of city models, carried over from source roots to the
//! converted roots.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::GranularityError;
use crate::hierarchy::{SceneHierarchy, SceneId};
use crate::mesh::Vector3d;

/// Metadata recorded when a city model is imported into the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstancedCityModel {
    /// Source GML file of the model, relative to the dataset root.
    pub gml_path: String,
    /// Japanese plane rectangular coordinate zone.
    pub coordinate_zone_id: i32,
    /// Model-space origin in the zone's coordinates.
    pub reference_point: Vector3d,
    pub lod_range: (u8, u8),
}

/// Metadata of source roots by object name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstancedCityModelDict {
    by_name: IndexMap<String, InstancedCityModel>,
}

impl InstancedCityModelDict {
    /// Remembers the metadata found on `sources`.
    pub fn compose_from(hierarchy: &SceneHierarchy, sources: &[SceneId]) -> Result<Self, GranularityError> {
        let mut by_name = IndexMap::new();
        for &source in sources {
            let object = hierarchy.object(source)?;
            if let Some(instanced) = &object.instanced {
                by_name
                    .entry(object.name.clone())
                    .or_insert_with(|| instanced.clone());
            }
        }
        Ok(InstancedCityModelDict { by_name })
    }

    /// Attaches remembered metadata to each root whose name matches a source
    /// root. Returns how many roots received metadata.
    pub fn restore(&self, hierarchy: &mut SceneHierarchy, roots: &[SceneId]) -> usize {
        let mut restored = 0;
        for &root in roots {
            let Some(object) = hierarchy.get_mut(root) else {
                continue;
            };
            if let Some(instanced) = self.by_name.get(&object.name) {
                object.instanced = Some(instanced.clone());
                restored += 1;
            }
        }
        restored
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
