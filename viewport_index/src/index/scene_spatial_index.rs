/// SceneSpatialIndex: 3D index over world-space Samples.
///
/// Owns the entries of one generation in a SlotMap, a reverse
/// owner → entries map and the set of `(owner, local_index)` pairs already
/// indexed. The spatial structure itself is a pluggable `SpatialBackend`
/// that only ever sees entry keys and AABBs.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use crate::bounds::AABB;
use crate::camera::Frustum;
use crate::config::{IndexConfig, SceneBackendKind};
use crate::error::{Error, Result};
use crate::index_warn;
use crate::scene::ObjectId;
use super::grid_backend::GridHashBackend;
use super::octree_backend::OctreeBackend;
use super::sample::{Sample, SceneEntry};

const SOURCE: &str = "viewport_index::SceneSpatialIndex";

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key for an entry of a SceneSpatialIndex.
    pub struct EntryKey;
}

// ===== BACKEND TRAIT =====

/// Spatial structure behind a `SceneSpatialIndex`.
///
/// Backends index entry keys by world AABB. Ownership, duplicate
/// detection and the samples themselves stay in the index.
pub trait SpatialBackend: Send + Sync {
    /// Bulk load a batch of entries.
    fn insert_all(&mut self, entries: &[(EntryKey, AABB)]);

    /// Remove one entry.
    fn remove(&mut self, key: EntryKey);

    /// Query all entries whose AABB intersects the frustum.
    /// Results are appended to `results`.
    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<EntryKey>);

    /// Remove all entries.
    fn clear(&mut self);

    /// Number of live entries.
    fn len(&self) -> usize;
}

// ===== SCENE SPATIAL INDEX =====

/// 3D index over world-space Samples.
pub struct SceneSpatialIndex {
    /// Entries of the current generation
    entries: SlotMap<EntryKey, SceneEntry>,
    /// Reverse lookup for remove-by-owner
    owners: FxHashMap<ObjectId, Vec<EntryKey>>,
    /// `(owner, local_index)` pairs already indexed
    sample_keys: FxHashSet<(ObjectId, i32)>,
    /// Spatial structure
    backend: Box<dyn SpatialBackend>,
    /// Generation this index was built for (0 = never built / cleared)
    generation: u64,
}

impl SceneSpatialIndex {
    /// Create an empty index on top of a backend.
    pub fn new(backend: Box<dyn SpatialBackend>) -> Self {
        Self {
            entries: SlotMap::with_key(),
            owners: FxHashMap::default(),
            sample_keys: FxHashSet::default(),
            backend,
            generation: 0,
        }
    }

    /// Create an empty index with the backend selected by `config`.
    pub fn with_config(config: &IndexConfig) -> Self {
        let backend: Box<dyn SpatialBackend> = match config.backend {
            SceneBackendKind::Octree => {
                Box::new(OctreeBackend::new(config.octree_max_depth, config.bounds_padding))
            }
            SceneBackendKind::GridHash => {
                Box::new(GridHashBackend::new(config.grid_cells_per_axis, config.bounds_padding))
            }
        };
        Self::new(backend)
    }

    /// Drop every entry and reset the generation stamp to 0.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.owners.clear();
        self.sample_keys.clear();
        self.backend.clear();
        self.generation = 0;
    }

    /// Bulk load a batch of entries.
    ///
    /// A `(owner, local_index)` pair already indexed in this generation,
    /// or repeated within the batch, rejects the whole batch with
    /// `Error::DuplicateSample`. Entries with non-finite bounds are dropped.
    pub fn insert_all(&mut self, entries: Vec<SceneEntry>) -> Result<()> {
        let mut batch_keys: FxHashSet<(ObjectId, i32)> =
            FxHashSet::with_capacity_and_hasher(entries.len(), Default::default());
        for entry in &entries {
            let key = (entry.sample.owner.clone(), entry.sample.local_index);
            if self.sample_keys.contains(&key) || !batch_keys.insert(key) {
                return Err(Error::DuplicateSample {
                    owner: entry.sample.owner.clone(),
                    local_index: entry.sample.local_index,
                });
            }
        }

        let mut placed = Vec::with_capacity(entries.len());
        let mut dropped = 0usize;
        for entry in entries {
            if !entry.bounds.is_finite() {
                dropped += 1;
                continue;
            }
            let owner = entry.sample.owner.clone();
            let local_index = entry.sample.local_index;
            let bounds = entry.bounds;

            let key = self.entries.insert(entry);
            self.owners.entry(owner.clone()).or_default().push(key);
            self.sample_keys.insert((owner, local_index));
            placed.push((key, bounds));
        }

        if dropped > 0 {
            index_warn!(SOURCE, "Dropped {} entries with non-finite bounds", dropped);
        }

        self.backend.insert_all(&placed);
        Ok(())
    }

    /// Samples of every entry whose AABB intersects the frustum.
    ///
    /// No ordering guarantee.
    pub fn query_frustum(&self, frustum: &Frustum) -> Vec<Sample> {
        let mut keys = Vec::new();
        self.backend.query_frustum(frustum, &mut keys);
        keys.iter()
            .filter_map(|key| self.entries.get(*key))
            .map(|entry| entry.sample.clone())
            .collect()
    }

    /// Remove every entry of one owner. Returns the number removed.
    pub fn remove(&mut self, owner: &ObjectId) -> usize {
        let Some(keys) = self.owners.remove(owner) else {
            return 0;
        };

        for key in &keys {
            if let Some(entry) = self.entries.remove(*key) {
                self.sample_keys.remove(&(entry.sample.owner, entry.sample.local_index));
            }
            self.backend.remove(*key);
        }
        keys.len()
    }

    /// True if the `(owner, local_index)` pair is indexed.
    pub fn contains(&self, owner: &ObjectId, local_index: i32) -> bool {
        self.sample_keys.contains(&(owner.clone(), local_index))
    }

    /// Iterate over every indexed sample.
    pub fn samples(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.entries.values().map(|entry| &entry.sample)
    }

    /// Union of all entry bounds. `None` when empty.
    pub fn bounds(&self) -> Option<AABB> {
        self.entries
            .values()
            .map(|entry| entry.bounds)
            .reduce(|acc, aabb| acc.union(&aabb))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generation this index was built for (0 = never built / cleared).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }
}

#[cfg(test)]
#[path = "scene_spatial_index_tests.rs"]
mod tests;
