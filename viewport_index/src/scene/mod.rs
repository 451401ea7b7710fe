//! Scene module
//!
//! The scene graph collaborator: the `SceneGraph` trait the pipeline reads
//! through, and an in-memory `Scene` implementing it.

mod scene;
mod scene_object;

pub use scene::{Scene, SceneGraph, ObjectKey};
pub use scene_object::{SceneObject, ObjectId, ObjectKind, ObjectFlags, Geometry};
