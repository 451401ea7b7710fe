/// Scene object types for the in-memory scene graph.
///
/// A SceneObject is the minimal description the index needs from a viewer
/// scene node: a stable id, an explicit classification tag, picking flags,
/// local-space geometry and a local/world transform pair.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use bitflags::bitflags;
use glam::{Mat4, Vec3};
use crate::bounds::AABB;
use super::scene::ObjectKey;

// ===== OBJECT ID =====

/// Opaque, cheaply clonable identifier of a scene object.
///
/// Ordered lexically. Stable across index rebuilds while the object exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(Arc<str>);

impl ObjectId {
    pub fn new(id: &str) -> Self {
        Self(Arc::from(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl Borrow<str> for ObjectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ===== CLASSIFICATION =====

/// How the sampler turns an object into index entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Mesh or solid: one whole-object bounding volume
    Volume,
    /// Point cloud: one entry per vertex
    PointCloud,
}

bitflags! {
    /// Scene object flags (bitfield)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObjectFlags: u32 {
        /// Object is drawn
        const VISIBLE  = 1 << 0;
        /// Object takes part in picking and marquee selection
        const PICKABLE = 1 << 1;
    }
}

impl Default for ObjectFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE
    }
}

// ===== GEOMETRY =====

/// Local-space geometry of a scene object.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Group or empty node
    None,
    /// Precomputed local bounds
    Bounds(AABB),
    /// Vertex positions
    Positions(Vec<Vec3>),
}

impl Geometry {
    /// Local bounds, computed from positions when needed.
    pub fn local_bounds(&self) -> Option<AABB> {
        match self {
            Geometry::None => None,
            Geometry::Bounds(aabb) => Some(*aabb),
            Geometry::Positions(positions) => AABB::from_points(positions),
        }
    }

    pub fn positions(&self) -> Option<&[Vec3]> {
        match self {
            Geometry::Positions(positions) => Some(positions),
            _ => None,
        }
    }
}

// ===== SCENE OBJECT =====

/// A node of the in-memory scene graph.
#[derive(Debug, Clone)]
pub struct SceneObject {
    id: ObjectId,
    kind: ObjectKind,
    flags: ObjectFlags,
    geometry: Geometry,
    local_matrix: Mat4,
    world_matrix: Mat4,
    parent: Option<ObjectKey>,
    children: Vec<ObjectKey>,
    world_needs_update: bool,
}

impl SceneObject {
    pub fn new(id: impl Into<ObjectId>, kind: ObjectKind, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            kind,
            flags: ObjectFlags::default(),
            geometry,
            local_matrix: Mat4::IDENTITY,
            world_matrix: Mat4::IDENTITY,
            parent: None,
            children: Vec::new(),
            world_needs_update: true,
        }
    }

    /// Mesh described by its local bounds.
    pub fn mesh(id: impl Into<ObjectId>, local_bounds: AABB) -> Self {
        Self::new(id, ObjectKind::Volume, Geometry::Bounds(local_bounds))
    }

    /// Point cloud described by its local vertex positions.
    pub fn point_cloud(id: impl Into<ObjectId>, positions: Vec<Vec3>) -> Self {
        Self::new(id, ObjectKind::PointCloud, Geometry::Positions(positions))
    }

    pub fn with_local_matrix(mut self, matrix: Mat4) -> Self {
        self.local_matrix = matrix;
        self.world_needs_update = true;
        self
    }

    pub fn with_flags(mut self, flags: ObjectFlags) -> Self {
        self.flags = flags;
        self
    }

    // ===== GETTERS =====

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn flags(&self) -> ObjectFlags {
        self.flags
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn local_matrix(&self) -> &Mat4 {
        &self.local_matrix
    }

    /// World matrix as of the last refresh. Check `world_needs_update()` first.
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    pub fn parent(&self) -> Option<ObjectKey> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectKey] {
        &self.children
    }

    pub fn world_needs_update(&self) -> bool {
        self.world_needs_update
    }

    /// Visible and pickable.
    pub fn is_selectable(&self) -> bool {
        self.flags.contains(ObjectFlags::VISIBLE | ObjectFlags::PICKABLE)
    }

    // ===== SCENE-INTERNAL MUTATION =====

    pub(crate) fn set_parent(&mut self, parent: Option<ObjectKey>) {
        self.parent = parent;
        self.world_needs_update = true;
    }

    pub(crate) fn push_child(&mut self, child: ObjectKey) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: ObjectKey) {
        self.children.retain(|k| *k != child);
    }

    pub(crate) fn set_local_matrix(&mut self, matrix: Mat4) {
        self.local_matrix = matrix;
        self.world_needs_update = true;
    }

    pub(crate) fn set_world_matrix(&mut self, matrix: Mat4) {
        self.world_matrix = matrix;
        self.world_needs_update = false;
    }

    pub(crate) fn mark_world_stale(&mut self) {
        self.world_needs_update = true;
    }

    pub(crate) fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = geometry;
    }

    pub(crate) fn set_flags(&mut self, flags: ObjectFlags) {
        self.flags = flags;
    }
}
