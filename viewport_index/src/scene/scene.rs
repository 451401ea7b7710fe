/// Scene: in-memory scene graph consumed by the indexing pipeline.
///
/// Uses a SlotMap for O(1) insert/remove with stable keys and an id → key
/// map for lookups by `ObjectId`. Every mutation bumps a revision counter
/// so `IndexingPipeline::refresh_scene()` can skip redundant rebuilds.

use glam::Mat4;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use super::scene_object::{Geometry, ObjectFlags, ObjectId, SceneObject};

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key for a SceneObject within a Scene.
    ///
    /// Keys remain valid even after other objects are removed.
    /// A key becomes invalid only when its own object is removed.
    pub struct ObjectKey;
}

// ===== SCENE GRAPH TRAIT =====

/// What the indexing pipeline needs from a scene graph.
///
/// Implement this to index a host application's own scene representation.
pub trait SceneGraph: Send + Sync {
    /// Keys of every object currently in the scene
    fn object_keys(&self) -> Vec<ObjectKey>;

    /// Object by key, `None` if removed
    fn object(&self, key: ObjectKey) -> Option<&SceneObject>;

    /// Recompute the world matrix of `key` (and its stale ancestors).
    /// Returns false if the key is invalid.
    fn refresh_world_matrix(&mut self, key: ObjectKey) -> bool;

    /// Monotonic counter bumped by every mutation
    fn revision(&self) -> u64;
}

// ===== SCENE =====

/// In-memory scene graph with a parent hierarchy.
pub struct Scene {
    /// Objects stored in a slot map for O(1) insert/remove
    objects: SlotMap<ObjectKey, SceneObject>,
    /// Id lookup
    ids: FxHashMap<ObjectId, ObjectKey>,
    /// Bumped on every mutation
    revision: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: SlotMap::with_key(),
            ids: FxHashMap::default(),
            revision: 0,
        }
    }

    /// Add a root object.
    ///
    /// Returns `Error::DuplicateObject` if the id is already used.
    pub fn add_object(&mut self, object: SceneObject) -> Result<ObjectKey> {
        self.insert(object, None)
    }

    /// Add an object under `parent`. Its world matrix becomes
    /// `parent_world * local`.
    pub fn add_child(&mut self, parent: ObjectKey, object: SceneObject) -> Result<ObjectKey> {
        if !self.objects.contains_key(parent) {
            return Err(Error::CollaboratorUnavailable(format!(
                "parent of '{}' is not in the scene",
                object.id()
            )));
        }
        self.insert(object, Some(parent))
    }

    fn insert(&mut self, mut object: SceneObject, parent: Option<ObjectKey>) -> Result<ObjectKey> {
        if self.ids.contains_key(object.id()) {
            return Err(Error::DuplicateObject(object.id().clone()));
        }

        object.set_parent(parent);
        let id = object.id().clone();
        let key = self.objects.insert(object);
        self.ids.insert(id, key);

        if let Some(parent_key) = parent {
            if let Some(parent_object) = self.objects.get_mut(parent_key) {
                parent_object.push_child(key);
            }
        }

        self.revision += 1;
        Ok(key)
    }

    /// Remove an object and its whole subtree.
    ///
    /// Returns the ids of every removed object (empty if the key is invalid).
    pub fn remove_object(&mut self, key: ObjectKey) -> Vec<ObjectId> {
        let Some(parent) = self.objects.get(key).map(|o| o.parent()) else {
            return Vec::new();
        };
        if let Some(parent_object) = parent.and_then(|p| self.objects.get_mut(p)) {
            parent_object.remove_child(key);
        }

        let mut removed = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(object) = self.objects.remove(current) {
                stack.extend_from_slice(object.children());
                self.ids.remove(object.id());
                removed.push(object.id().clone());
            }
        }

        self.revision += 1;
        removed
    }

    /// Object by key
    pub fn object(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.objects.get(key)
    }

    /// Key of the object with this id
    pub fn find(&self, id: &str) -> Option<ObjectKey> {
        self.ids.get(id).copied()
    }

    /// Set the local matrix of an object. Marks its whole subtree stale.
    /// Returns false if the key is invalid.
    pub fn set_local_matrix(&mut self, key: ObjectKey, matrix: Mat4) -> bool {
        let Some(object) = self.objects.get_mut(key) else {
            return false;
        };
        object.set_local_matrix(matrix);

        let mut stack: Vec<ObjectKey> = object.children().to_vec();
        while let Some(current) = stack.pop() {
            if let Some(child) = self.objects.get_mut(current) {
                child.mark_world_stale();
                stack.extend_from_slice(child.children());
            }
        }

        self.revision += 1;
        true
    }

    /// Replace the geometry of an object. Returns false if the key is invalid.
    pub fn set_geometry(&mut self, key: ObjectKey, geometry: Geometry) -> bool {
        let Some(object) = self.objects.get_mut(key) else {
            return false;
        };
        object.set_geometry(geometry);
        self.revision += 1;
        true
    }

    /// Replace the flags of an object. Returns false if the key is invalid.
    pub fn set_flags(&mut self, key: ObjectKey, flags: ObjectFlags) -> bool {
        let Some(object) = self.objects.get_mut(key) else {
            return false;
        };
        object.set_flags(flags);
        self.revision += 1;
        true
    }

    /// Refresh every stale world matrix.
    pub fn update_world_matrices(&mut self) {
        let stale: Vec<ObjectKey> = self
            .objects
            .iter()
            .filter(|(_, o)| o.world_needs_update())
            .map(|(k, _)| k)
            .collect();
        for key in stale {
            self.refresh_world_matrix(key);
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Remove every object.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.ids.clear();
        self.revision += 1;
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph for Scene {
    fn object_keys(&self) -> Vec<ObjectKey> {
        self.objects.keys().collect()
    }

    fn object(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.objects.get(key)
    }

    fn refresh_world_matrix(&mut self, key: ObjectKey) -> bool {
        if !self.objects.contains_key(key) {
            return false;
        }

        // Root-first chain of ancestors. A stale node always has stale
        // descendants, so a fresh ancestor's world matrix can be trusted.
        let mut chain = Vec::new();
        let mut cursor = Some(key);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.objects.get(current).and_then(|o| o.parent());
        }

        let mut parent_world = Mat4::IDENTITY;
        for current in chain.into_iter().rev() {
            if let Some(object) = self.objects.get_mut(current) {
                if object.world_needs_update() {
                    let world = parent_world * *object.local_matrix();
                    object.set_world_matrix(world);
                }
                parent_world = *object.world_matrix();
            }
        }

        true
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
