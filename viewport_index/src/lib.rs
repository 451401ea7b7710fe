/*!
# Viewport Index

Scene and screen-space spatial indexing for interactive 3D viewers.

This crate answers the two questions selection tools keep asking a viewer:
"which scene geometry lies inside this camera frustum" and "which geometry is
under (or near) this screen point / inside this marquee rectangle".

## Architecture

- **GeometrySampler**: extracts indexable Samples from scene objects
- **SceneSpatialIndex**: 3D index over world-space Samples (octree or grid hash backend)
- **ViewSpatialIndex**: 2D quadtree over the screen rectangles of visible Samples
- **Projector**: world → pixel projection with behind-camera rejection
- **IndexingPipeline**: staged async rebuilds with generation stamps

The scene graph, camera and viewport are collaborators. The crate ships
in-memory versions of them (`Scene`, `Camera`, `Viewport`) that a host
application may replace by implementing `SceneGraph`.
*/

// Internal modules
mod bounds;
mod config;
mod error;
pub mod log;
pub mod camera;
pub mod scene;
pub mod index;
pub mod pipeline;

// Main viewport index namespace module
pub mod vindex {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration
    pub use crate::config::{IndexConfig, SceneBackendKind};

    // Bounding volumes
    pub use crate::bounds::AABB;

    // Logging sub-module (types and logger control, NOT macros)
    pub mod log {
        pub use crate::log::{
            Logger, LogEntry, LogSeverity, DefaultLogger,
            set_logger, reset_logger, log, log_detailed,
        };
    }

    // Camera, frustum and viewport collaborators
    pub mod camera {
        pub use crate::camera::*;
    }

    // Scene graph collaborator
    pub mod scene {
        pub use crate::scene::*;
    }

    // Spatial indices, sampling and projection
    pub mod index {
        pub use crate::index::*;
    }

    // Staged rebuild pipeline
    pub mod pipeline {
        pub use crate::pipeline::*;
    }
}

// Re-export math library at crate root
pub use glam;
