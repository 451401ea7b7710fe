/// Frustum: the six half-spaces a camera sees.
///
/// Planes are stored as `Vec4(a, b, c, d)` with a unit, inward-facing
/// normal `(a, b, c)`: a point `p` is on the visible side of a plane when
/// `plane · (p, 1) >= 0`.
///
/// The scene index only ever asks two things of a frustum: "is this AABB
/// possibly visible" and, for hierarchical structures, "is it fully
/// inside, fully outside or straddling".

use glam::{Mat4, Vec3, Vec4};
use crate::bounds::AABB;

/// Result of a 3-way frustum/AABB classification.
///
/// - `Outside` → skip the node / cell and everything under it
/// - `Inside` → take every entry without testing them
/// - `Partial` → test entries one by one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// AABB is entirely outside the frustum
    Outside,
    /// AABB is entirely inside the frustum
    Inside,
    /// AABB partially overlaps the frustum
    Partial,
}

/// Six culling planes in the order left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the planes of a view-projection matrix (Gribb & Hartmann).
    ///
    /// glam's `perspective_rh` / `orthographic_rh` map depth to `[0, 1]`,
    /// so the near plane is `z_clip >= 0` (row 2 alone) and the far plane
    /// is `z_clip <= w_clip` (row 3 - row 2).
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let (x, y, z, w) = (vp.row(0), vp.row(1), vp.row(2), vp.row(3));
        let planes = [w + x, w - x, w + y, w - y, z, w - z].map(|plane| {
            let len = plane.truncate().length();
            if len > 0.0 { plane / len } else { plane }
        });

        Self { planes }
    }

    /// Near plane (normal points along the view direction).
    pub fn near(&self) -> Vec4 {
        self.planes[4]
    }

    /// Far plane (normal points back toward the camera).
    pub fn far(&self) -> Vec4 {
        self.planes[5]
    }

    /// True if the point lies inside or on the frustum.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| signed_distance(*plane, point) >= 0.0)
    }

    /// Conservative AABB visibility test.
    ///
    /// Rejects the box as soon as its corner furthest along some plane
    /// normal is behind that plane. Boxes near frustum corners may pass
    /// without actually being visible.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.planes
            .iter()
            .all(|plane| signed_distance(*plane, far_corner(plane.truncate(), aabb)) >= 0.0)
    }

    /// 3-way classification of an AABB.
    ///
    /// `Outside` as soon as one plane rejects the box's far corner,
    /// `Inside` if no plane has the box's near corner behind it.
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        let mut straddles = false;

        for plane in &self.planes {
            let normal = plane.truncate();
            if signed_distance(*plane, far_corner(normal, aabb)) < 0.0 {
                return FrustumTest::Outside;
            }
            straddles |= signed_distance(*plane, far_corner(-normal, aabb)) < 0.0;
        }

        if straddles { FrustumTest::Partial } else { FrustumTest::Inside }
    }
}

fn signed_distance(plane: Vec4, point: Vec3) -> f32 {
    plane.dot(point.extend(1.0))
}

/// Corner of `aabb` furthest along `direction`.
fn far_corner(direction: Vec3, aabb: &AABB) -> Vec3 {
    Vec3::select(direction.cmpge(Vec3::ZERO), aabb.max, aabb.min)
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
