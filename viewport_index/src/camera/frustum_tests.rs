use glam::{Mat4, Vec3};
use crate::bounds::AABB;
use super::*;

fn perspective_frustum(fov: f32, far: f32) -> Frustum {
    let projection = Mat4::perspective_rh(fov, 1.0, 0.1, far);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    Frustum::from_view_projection(&(projection * view))
}

// ============================================================================
// Frustum::from_view_projection
// ============================================================================

#[test]
fn test_frustum_planes_are_normalized() {
    let frustum = perspective_frustum(std::f32::consts::FRAC_PI_4, 100.0);

    for plane in &frustum.planes {
        let normal_len = plane.truncate().length();
        assert!((normal_len - 1.0).abs() < 1e-4, "plane normal should be unit length");
    }
}

#[test]
fn test_near_plane_uses_zero_to_one_depth() {
    // Orthographic looking down -Z from the origin, near = 1
    let projection = Mat4::orthographic_rh(-5.0, 5.0, -5.0, 5.0, 1.0, 100.0);
    let frustum = Frustum::from_view_projection(&projection);

    assert!(frustum.contains_point(Vec3::new(0.0, 0.0, -1.5)));
    assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -0.5)));
    assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 0.5)));
}

// ============================================================================
// Frustum::intersects_aabb
// ============================================================================

#[test]
fn test_aabb_inside_frustum() {
    let frustum = perspective_frustum(std::f32::consts::FRAC_PI_2, 100.0);
    let aabb = AABB::from_center_half_extent(Vec3::ZERO, Vec3::ONE);

    assert!(frustum.intersects_aabb(&aabb));
}

#[test]
fn test_aabb_outside_frustum() {
    let frustum = perspective_frustum(std::f32::consts::FRAC_PI_4, 100.0);
    let aabb = AABB::new(Vec3::splat(100.0), Vec3::splat(101.0));

    assert!(!frustum.intersects_aabb(&aabb));
}

#[test]
fn test_aabb_behind_camera() {
    let frustum = perspective_frustum(std::f32::consts::FRAC_PI_2, 100.0);
    let aabb = AABB::new(Vec3::new(-1.0, -1.0, 10.0), Vec3::new(1.0, 1.0, 12.0));

    assert!(!frustum.intersects_aabb(&aabb));
}

#[test]
fn test_aabb_beyond_far_plane() {
    let frustum = perspective_frustum(std::f32::consts::FRAC_PI_2, 10.0);
    let aabb = AABB::new(Vec3::new(-1.0, -1.0, -20.0), Vec3::new(1.0, 1.0, -18.0));

    assert!(!frustum.intersects_aabb(&aabb));
}

#[test]
fn test_aabb_intersecting_frustum_boundary() {
    let projection = Mat4::orthographic_rh(-5.0, 5.0, -5.0, 5.0, 0.1, 100.0);
    let frustum = Frustum::from_view_projection(&projection);

    // Straddles the right boundary at x=5
    let aabb = AABB::new(Vec3::new(4.0, 0.0, -10.0), Vec3::new(6.0, 1.0, -5.0));

    assert!(frustum.intersects_aabb(&aabb));
}

#[test]
fn test_degenerate_point_aabb() {
    let frustum = perspective_frustum(std::f32::consts::FRAC_PI_2, 100.0);

    assert!(frustum.intersects_aabb(&AABB::from_point(Vec3::ZERO)));
    assert!(!frustum.intersects_aabb(&AABB::from_point(Vec3::new(0.0, 0.0, 6.0))));
}

// ============================================================================
// Frustum::classify_aabb
// ============================================================================

#[test]
fn test_classify_inside_partial_outside() {
    let projection = Mat4::orthographic_rh(-5.0, 5.0, -5.0, 5.0, 0.1, 100.0);
    let frustum = Frustum::from_view_projection(&projection);

    let inside = AABB::new(Vec3::new(-1.0, -1.0, -10.0), Vec3::new(1.0, 1.0, -5.0));
    let partial = AABB::new(Vec3::new(4.0, 0.0, -10.0), Vec3::new(6.0, 1.0, -5.0));
    let outside = AABB::new(Vec3::new(10.0, 0.0, -10.0), Vec3::new(12.0, 1.0, -5.0));

    assert_eq!(frustum.classify_aabb(&inside), FrustumTest::Inside);
    assert_eq!(frustum.classify_aabb(&partial), FrustumTest::Partial);
    assert_eq!(frustum.classify_aabb(&outside), FrustumTest::Outside);
}

// ============================================================================
// Frustum::near / far
// ============================================================================

#[test]
fn test_near_and_far_planes_face_each_other() {
    // Camera at z=5 looking toward -Z
    let frustum = perspective_frustum(std::f32::consts::FRAC_PI_4, 100.0);

    let near_normal = frustum.near().truncate();
    let far_normal = frustum.far().truncate();

    assert!((near_normal - Vec3::NEG_Z).length() < 1e-4);
    assert!((far_normal - Vec3::Z).length() < 1e-4);

    // Near plane sits 0.1 in front of the camera, far plane 100 in front
    assert!((frustum.near().w - (5.0 - 0.1)).abs() < 1e-3);
    assert!((frustum.far().w - (100.0 - 5.0)).abs() < 1e-2);
}
