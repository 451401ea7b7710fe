use glam::{Mat4, Vec3};
use crate::bounds::AABB;
use super::*;

fn create_test_camera() -> Camera {
    Camera::look_at_perspective(
        Vec3::new(0.0, 0.0, 10.0),
        Vec3::ZERO,
        Vec3::Y,
        std::f32::consts::FRAC_PI_4,
        4.0 / 3.0,
        0.1,
        100.0,
    )
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_camera_new_stores_matrices() {
    let view = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    let proj = Mat4::perspective_rh(1.0, 1.0, 0.1, 10.0);
    let camera = Camera::new(view, proj);

    assert_eq!(*camera.view_matrix(), view);
    assert_eq!(*camera.projection_matrix(), proj);
}

#[test]
fn test_view_projection_is_projection_times_view() {
    let camera = create_test_camera();
    let expected = *camera.projection_matrix() * *camera.view_matrix();

    assert_eq!(camera.view_projection_matrix(), expected);
}

#[test]
fn test_camera_position_recovered_from_view() {
    let camera = create_test_camera();
    let pos = camera.position();

    assert!((pos - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-4);
}

// ============================================================================
// Frustum
// ============================================================================

#[test]
fn test_camera_frustum_sees_target() {
    let camera = create_test_camera();
    let frustum = camera.frustum();

    let at_target = AABB::from_center_half_extent(Vec3::ZERO, Vec3::ONE);
    let behind = AABB::from_center_half_extent(Vec3::new(0.0, 0.0, 20.0), Vec3::ONE);

    assert!(frustum.intersects_aabb(&at_target));
    assert!(!frustum.intersects_aabb(&behind));
}

// ============================================================================
// Setters
// ============================================================================

#[test]
fn test_set_view_and_projection() {
    let mut camera = create_test_camera();
    camera.set_view(Mat4::IDENTITY);
    camera.set_projection(Mat4::IDENTITY);

    assert_eq!(camera.view_projection_matrix(), Mat4::IDENTITY);
}

#[test]
fn test_non_finite_camera_detected() {
    let mut camera = create_test_camera();
    assert!(camera.is_finite());

    camera.set_projection(Mat4::from_cols_array(&[f32::NAN; 16]));
    assert!(!camera.is_finite());
}
