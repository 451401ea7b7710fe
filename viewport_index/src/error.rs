//! Error types for the viewport index
//!
//! Only programming errors of the orchestrating code and unusable collaborators
//! become errors. Per-object sampling or projection problems are logged and
//! skipped by the pipeline instead.

use thiserror::Error;
use crate::scene::ObjectId;

/// Result type for viewport index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Viewport index errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The same (owner, local index) pair was inserted twice into one generation
    #[error("Duplicate sample: ({owner}, {local_index}) already indexed in this generation")]
    DuplicateSample {
        /// Owning scene object
        owner: ObjectId,
        /// Sample index within the owner (-1 = whole object)
        local_index: i32,
    },

    /// A scene object id is already used by another object
    #[error("Duplicate object id: {0}")]
    DuplicateObject(ObjectId),

    /// View indexing was requested before any scene indexing committed
    #[error("Scene not indexed: index_scene must complete before index_view")]
    SceneNotIndexed,

    /// A strict view query was issued before any view indexing committed
    #[error("View not indexed: index_view has not completed yet")]
    ViewNotIndexed,

    /// Viewport has no usable pixel size
    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    /// Scene graph or camera could not provide required data
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A live index lock was poisoned by a panicking writer
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// The pipeline was disposed and accepts no more work
    #[error("Pipeline disposed")]
    PipelineDisposed,
}

/// Log an error with its source module, then evaluate to it.
///
/// # Example
///
/// ```ignore
/// return Err(index_err!("viewport_index::IndexingPipeline", Error::SceneNotIndexed));
/// ```
#[macro_export]
macro_rules! index_err {
    ($source:expr, $err:expr) => {{
        let err: $crate::vindex::Error = $err;
        $crate::index_error!($source, "{}", err);
        err
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
