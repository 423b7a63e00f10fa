//! Error types for plateau-granularity.

use thiserror::Error;

use crate::hierarchy::SceneId;

/// Errors raised by the scene hierarchy and the conversion pipeline.
#[derive(Debug, Error)]
pub enum GranularityError {
    /// A scene object id does not name a live object.
    #[error("scene object {0} does not exist")]
    UnknownObject(SceneId),

    /// Converting scene objects into the common mesh model failed.
    #[error("scene to model conversion failed: {0}")]
    SceneConversion(String),

    /// The granularity backend reported a failure.
    #[error("granularity conversion failed: {0}")]
    Backend(String),

    /// The blocking backend task panicked or was aborted.
    #[error("granularity worker did not finish: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// Converted objects could not be placed into the scene.
    #[error("failed to place converted objects: {0}")]
    Placement(String),
}
