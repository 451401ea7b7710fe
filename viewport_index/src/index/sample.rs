/// Sample and index entry types shared by the scene and view indices.
///
/// A Sample is the minimal indexable description of a piece of scene
/// geometry. Samples refer to their scene object by id only, never by
/// reference, so query results stay valid while the scene keeps mutating.

use glam::Vec3;
use crate::bounds::AABB;
use crate::scene::ObjectId;

/// `local_index` of a whole-object bounding volume sample.
pub const WHOLE_OBJECT: i32 = -1;

/// What a Sample stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// Whole-object bounding volume
    Volume,
    /// Single vertex of a point cloud
    PointCloudVertex,
}

/// Minimal indexable description of scene geometry.
///
/// `(owner, local_index)` is unique within one index generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Scene object this sample belongs to
    pub owner: ObjectId,
    /// `WHOLE_OBJECT` (-1) for volumes, vertex index for point cloud vertices
    pub local_index: i32,
    /// World position at sampling time (AABB center for volumes)
    pub world_position: Vec3,
    /// Volume or point cloud vertex
    pub kind: SampleKind,
    /// World-space bounds (degenerate for point samples)
    pub bounding_box: AABB,
}

impl Sample {
    /// Whole-object sample from a world-space AABB.
    pub fn volume(owner: ObjectId, world_bounds: AABB) -> Self {
        Self {
            owner,
            local_index: WHOLE_OBJECT,
            world_position: world_bounds.center(),
            kind: SampleKind::Volume,
            bounding_box: world_bounds,
        }
    }

    /// Point cloud vertex sample.
    pub fn point(owner: ObjectId, local_index: i32, world_position: Vec3) -> Self {
        Self {
            owner,
            local_index,
            world_position,
            kind: SampleKind::PointCloudVertex,
            bounding_box: AABB::from_point(world_position),
        }
    }

    /// Identity of the sample within a generation.
    pub fn key(&self) -> (&ObjectId, i32) {
        (&self.owner, self.local_index)
    }
}

/// 3D index entry: a Sample keyed by its world AABB.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntry {
    pub sample: Sample,
    pub bounds: AABB,
}

impl SceneEntry {
    pub fn new(sample: Sample) -> Self {
        let bounds = sample.bounding_box;
        Self { sample, bounds }
    }
}

// ===== SCREEN SPACE =====

/// Axis-aligned pixel rectangle, origin top-left, y down.
///
/// `width` and `height` are never negative; both are zero for point entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    /// Build a rectangle. Negative sizes are flipped so the rectangle
    /// still covers the same pixels.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
        let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
        Self { x, y, width, height }
    }

    /// Zero-size rectangle at a pixel.
    pub fn from_point(x: f32, y: f32) -> Self {
        Self { x, y, width: 0.0, height: 0.0 }
    }

    /// Rectangle spanning two corners.
    pub fn from_corners(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Overlap test. Touching edges count as overlap so zero-size
    /// point rectangles on a border are still found.
    pub fn intersects(&self, other: &ScreenRect) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    /// True if `other` lies fully inside this rectangle.
    pub fn contains_rect(&self, other: &ScreenRect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }

    /// Euclidean distance from a pixel to the rectangle (0 inside).
    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        let dx = (self.x - x).max(0.0).max(x - self.right());
        let dy = (self.y - y).max(0.0).max(y - self.bottom());
        (dx * dx + dy * dy).sqrt()
    }

    /// Euclidean distance from a pixel to the rectangle center.
    pub fn center_distance_to(&self, x: f32, y: f32) -> f32 {
        let (cx, cy) = self.center();
        ((cx - x) * (cx - x) + (cy - y) * (cy - y)).sqrt()
    }
}

/// 2D index entry: a Sample keyed by its screen rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEntry {
    pub sample: Sample,
    pub rect: ScreenRect,
}

impl ViewEntry {
    pub fn new(sample: Sample, rect: ScreenRect) -> Self {
        Self { sample, rect }
    }
}
