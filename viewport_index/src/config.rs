/// Index configuration.
///
/// One `IndexConfig` is handed to `IndexingPipeline::create()` and shared
/// by both spatial indices it owns. All values have working defaults.

use crate::error::{Error, Result};

/// Backing structure used by the 3D scene index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneBackendKind {
    /// Static pre-allocated octree, refitted to the scene extent on bulk load
    #[default]
    Octree,
    /// Loose uniform grid keyed by cell, built by radix sort
    GridHash,
}

/// Spatial index configuration
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    /// Backing structure of the scene index
    pub backend: SceneBackendKind,
    /// Octree depth (root = 0). Total nodes = (8^(d+1) - 1) / 7.
    pub octree_max_depth: u32,
    /// Grid resolution along the longest scene axis
    pub grid_cells_per_axis: u32,
    /// Maximum quadtree depth for the view index
    pub quadtree_max_depth: u32,
    /// A quadtree node holding more entries than this is split
    pub quadtree_max_entries: usize,
    /// Relative padding added around the scene extent when fitting the 3D index
    pub bounds_padding: f32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: SceneBackendKind::Octree,
            octree_max_depth: 4,
            grid_cells_per_axis: 32,
            quadtree_max_depth: 8,
            quadtree_max_entries: 8,
            bounds_padding: 0.01,
        }
    }
}

impl IndexConfig {
    /// Octree depth beyond this allocates more than 19 million nodes.
    pub const MAX_OCTREE_DEPTH: u32 = 7;
    /// Cell coordinates are packed into 21 bits per axis.
    pub const MAX_GRID_CELLS_PER_AXIS: u32 = 1 << 21;

    pub fn with_backend(mut self, backend: SceneBackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_octree_max_depth(mut self, depth: u32) -> Self {
        self.octree_max_depth = depth;
        self
    }

    pub fn with_grid_cells_per_axis(mut self, cells: u32) -> Self {
        self.grid_cells_per_axis = cells;
        self
    }

    pub fn with_quadtree_limits(mut self, max_depth: u32, max_entries: usize) -> Self {
        self.quadtree_max_depth = max_depth;
        self.quadtree_max_entries = max_entries;
        self
    }

    pub fn with_bounds_padding(mut self, padding: f32) -> Self {
        self.bounds_padding = padding;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.octree_max_depth > Self::MAX_OCTREE_DEPTH {
            return Err(Error::InvalidConfig(format!(
                "octree_max_depth {} exceeds {}",
                self.octree_max_depth,
                Self::MAX_OCTREE_DEPTH
            )));
        }
        if self.grid_cells_per_axis == 0 || self.grid_cells_per_axis > Self::MAX_GRID_CELLS_PER_AXIS {
            return Err(Error::InvalidConfig(format!(
                "grid_cells_per_axis {} must be in 1..={}",
                self.grid_cells_per_axis,
                Self::MAX_GRID_CELLS_PER_AXIS
            )));
        }
        if self.quadtree_max_entries == 0 {
            return Err(Error::InvalidConfig(
                "quadtree_max_entries must be at least 1".to_string(),
            ));
        }
        if !self.bounds_padding.is_finite() || self.bounds_padding < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "bounds_padding {} must be finite and non-negative",
                self.bounds_padding
            )));
        }
        Ok(())
    }
}
