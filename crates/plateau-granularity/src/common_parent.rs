//! Nearest shared ancestor of a selection.

use indexmap::{IndexMap, IndexSet};

use crate::hierarchy::{SceneHierarchy, SceneId};

/// Finds the deepest object that is a proper ancestor of every source.
///
/// Returns `None` for an empty selection or when the sources live under
/// different roots. Repeated sources count once.
pub fn find_common_parent(hierarchy: &SceneHierarchy, sources: &[SceneId]) -> Option<SceneId> {
    let sources: IndexSet<SceneId> = sources.iter().copied().collect();
    if sources.is_empty() {
        return None;
    }

    let mut covered: IndexMap<SceneId, usize> = IndexMap::new();
    for &source in &sources {
        for ancestor in hierarchy.ancestors(source) {
            *covered.entry(ancestor).or_insert(0) += 1;
        }
    }

    covered
        .into_iter()
        .filter(|&(_, count)| count == sources.len())
        .map(|(id, _)| id)
        .max_by_key(|&id| hierarchy.depth(id))
}
