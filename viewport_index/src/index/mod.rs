//! Index module
//!
//! Sampling, projection and the two spatial indices:
//! - `SceneSpatialIndex`: world-space Samples, octree or grid hash backend
//! - `ViewSpatialIndex`: screen rectangles of the Samples in view

mod sample;
mod sampler;
mod projection;
mod scene_spatial_index;
mod octree_backend;
mod grid_backend;
mod view_spatial_index;

pub use sample::{Sample, SampleKind, SceneEntry, ScreenRect, ViewEntry, WHOLE_OBJECT};
pub use sampler::{GeometrySampler, SkipReason};
pub use projection::{project, Projector, ScreenPoint, BEHIND_CAMERA_EPSILON};
pub use scene_spatial_index::{SceneSpatialIndex, SpatialBackend, EntryKey};
pub use octree_backend::OctreeBackend;
pub use grid_backend::GridHashBackend;
pub use view_spatial_index::ViewSpatialIndex;
