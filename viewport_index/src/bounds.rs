/// Axis-aligned bounding boxes.
///
/// World-space AABBs are the keys of the scene index and the input of
/// frustum tests; local-space AABBs come from scene object geometry and
/// are moved into world space with `transformed()`.

use glam::{Mat4, Vec3};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Degenerate box enclosing a single point.
    pub fn from_point(point: Vec3) -> Self {
        Self { min: point, max: point }
    }

    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    /// Tight box around a point set. `None` for an empty set.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut aabb = Self::from_point(*first);
        for p in rest {
            aabb.min = aabb.min.min(*p);
            aabb.max = aabb.max.max(*p);
        }
        Some(aabb)
    }

    /// Transform this AABB by a matrix, returning a new AABB.
    ///
    /// Uses the Arvo method: projects each matrix axis onto the AABB extents
    /// for an exact (tight) result without transforming all 8 corners.
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        AABB { min: new_min, max: new_max }
    }

    /// Test if this AABB fully contains another AABB.
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Test if this AABB intersects (overlaps or touches) another AABB.
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Smallest AABB enclosing both boxes.
    pub fn union(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow the box by `relative` times its largest side on every side.
    ///
    /// A degenerate box still grows by `min_pad` so that it has volume.
    pub fn padded(&self, relative: f32, min_pad: f32) -> AABB {
        let pad = (self.size().max_element() * relative).max(min_pad);
        AABB {
            min: self.min - Vec3::splat(pad),
            max: self.max + Vec3::splat(pad),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// The 8 corners. Bit layout of the index: bit0 = X, bit1 = Y, bit2 = Z.
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_aabb(min: Vec3, max: Vec3) -> AABB {
        AABB { min, max }
    }

    #[test]
    fn test_aabb_contains() {
        let big = make_aabb(Vec3::splat(-10.0), Vec3::splat(10.0));
        let small = make_aabb(Vec3::splat(-1.0), Vec3::splat(1.0));
        let straddling = make_aabb(Vec3::new(5.0, 5.0, 5.0), Vec3::new(15.0, 15.0, 15.0));

        assert!(big.contains(&small));
        assert!(!small.contains(&big));
        assert!(!big.contains(&straddling));
    }

    #[test]
    fn test_aabb_intersects() {
        let a = make_aabb(Vec3::splat(-2.0), Vec3::splat(2.0));
        let b = make_aabb(Vec3::splat(1.0), Vec3::splat(3.0));
        let c = make_aabb(Vec3::splat(5.0), Vec3::splat(7.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_transformed_by_translation() {
        let local = make_aabb(Vec3::splat(-1.0), Vec3::splat(1.0));
        let world = local.transformed(&Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));

        assert_eq!(world.min, Vec3::new(9.0, -1.0, -1.0));
        assert_eq!(world.max, Vec3::new(11.0, 1.0, 1.0));
    }

    #[test]
    fn test_transformed_by_rotation_stays_tight() {
        let local = make_aabb(Vec3::new(-2.0, -1.0, -1.0), Vec3::new(2.0, 1.0, 1.0));
        let rot = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let world = local.transformed(&rot);

        assert!((world.min - Vec3::new(-1.0, -2.0, -1.0)).abs().max_element() < 1e-5);
        assert!((world.max - Vec3::new(1.0, 2.0, 1.0)).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_from_points() {
        assert!(AABB::from_points(&[]).is_none());

        let aabb = AABB::from_points(&[
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 3.0, 5.0),
        ]).unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 5.0));
    }

    #[test]
    fn test_padded_gives_degenerate_box_volume() {
        let point = AABB::from_point(Vec3::ONE);
        let padded = point.padded(0.01, 0.5);

        assert_eq!(padded.min, Vec3::splat(0.5));
        assert_eq!(padded.max, Vec3::splat(1.5));
    }

    #[test]
    fn test_corners_cover_min_and_max() {
        let aabb = make_aabb(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        let corners = aabb.corners();

        assert_eq!(corners[0], aabb.min);
        assert_eq!(corners[7], aabb.max);
        assert_eq!(corners[1], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(corners[6], Vec3::new(0.0, 2.0, 3.0));
    }
}
