/// Tests for GeometrySampler

use super::*;
use crate::bounds::AABB;
use crate::index::{SampleKind, WHOLE_OBJECT};
use crate::scene::{ObjectFlags, Scene};
use glam::{Mat4, Vec3};

// ============================================================================
// Helper Functions
// ============================================================================

fn cube_at(id: &str, center: Vec3) -> SceneObject {
    SceneObject::mesh(id, AABB::from_center_half_extent(Vec3::ZERO, Vec3::ONE))
        .with_local_matrix(Mat4::from_translation(center))
}

// ============================================================================
// Volumes
// ============================================================================

#[test]
fn test_volume_yields_one_world_sample() {
    let mut scene = Scene::new();
    let key = scene.add_object(cube_at("cube", Vec3::new(10.0, 0.0, 0.0))).unwrap();

    let samples = GeometrySampler::sample_object(&mut scene, key).unwrap();

    assert_eq!(samples.len(), 1);
    let sample = &samples[0];
    assert_eq!(sample.kind, SampleKind::Volume);
    assert_eq!(sample.local_index, WHOLE_OBJECT);
    assert_eq!(sample.world_position, Vec3::new(10.0, 0.0, 0.0));
    assert_eq!(sample.bounding_box.min, Vec3::new(9.0, -1.0, -1.0));
    assert_eq!(sample.bounding_box.max, Vec3::new(11.0, 1.0, 1.0));
}

#[test]
fn test_zero_volume_yields_one_finite_sample() {
    let mut scene = Scene::new();
    let key = scene
        .add_object(SceneObject::mesh("flat", AABB::from_point(Vec3::new(1.0, 2.0, 3.0))))
        .unwrap();

    let samples = GeometrySampler::sample_object(&mut scene, key).unwrap();

    assert_eq!(samples.len(), 1);
    assert!(samples[0].bounding_box.is_finite());
    assert!(samples[0].world_position.is_finite());
}

#[test]
fn test_volume_bounds_computed_from_positions() {
    let mut scene = Scene::new();
    let object = SceneObject::new(
        "tri",
        ObjectKind::Volume,
        Geometry::Positions(vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0)]),
    );
    let key = scene.add_object(object).unwrap();

    let samples = GeometrySampler::sample_object(&mut scene, key).unwrap();

    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].bounding_box.max, Vec3::new(2.0, 4.0, 0.0));
}

#[test]
fn test_stale_transform_refreshed_before_sampling() {
    let mut scene = Scene::new();
    let key = scene.add_object(cube_at("cube", Vec3::ZERO)).unwrap();
    GeometrySampler::sample_object(&mut scene, key).unwrap();

    scene.set_local_matrix(key, Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)));
    let samples = GeometrySampler::sample_object(&mut scene, key).unwrap();

    assert_eq!(samples[0].world_position, Vec3::new(0.0, 5.0, 0.0));
    assert!(!scene.object(key).unwrap().world_needs_update());
}

#[test]
fn test_non_finite_bounds_are_malformed() {
    let mut scene = Scene::new();
    let key = scene
        .add_object(SceneObject::mesh("bad", AABB::new(Vec3::splat(f32::NAN), Vec3::ONE)))
        .unwrap();

    let result = GeometrySampler::sample_object(&mut scene, key);
    assert!(matches!(result, Err(SkipReason::Malformed(_))));
}

// ============================================================================
// Point clouds
// ============================================================================

#[test]
fn test_point_cloud_yields_one_sample_per_vertex() {
    let mut scene = Scene::new();
    let cloud = SceneObject::point_cloud("cloud", vec![Vec3::ZERO, Vec3::X, Vec3::Y])
        .with_local_matrix(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
    let key = scene.add_object(cloud).unwrap();

    let samples = GeometrySampler::sample_object(&mut scene, key).unwrap();

    assert_eq!(samples.len(), 3);
    for (i, sample) in samples.iter().enumerate() {
        assert_eq!(sample.local_index, i as i32);
        assert_eq!(sample.kind, SampleKind::PointCloudVertex);
        assert_eq!(sample.bounding_box.min, sample.bounding_box.max);
    }
    assert_eq!(samples[1].world_position, Vec3::new(1.0, 0.0, -5.0));
}

#[test]
fn test_point_cloud_drops_non_finite_vertices() {
    let mut scene = Scene::new();
    let cloud = SceneObject::point_cloud(
        "cloud",
        vec![Vec3::ZERO, Vec3::new(f32::INFINITY, 0.0, 0.0), Vec3::ONE],
    );
    let key = scene.add_object(cloud).unwrap();

    let samples = GeometrySampler::sample_object(&mut scene, key).unwrap();

    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].local_index, 0);
    assert_eq!(samples[1].local_index, 2);
}

#[test]
fn test_point_cloud_without_positions_is_malformed() {
    let mut scene = Scene::new();
    let object = SceneObject::new(
        "cloud",
        ObjectKind::PointCloud,
        Geometry::Bounds(AABB::from_point(Vec3::ZERO)),
    );
    let key = scene.add_object(object).unwrap();

    let result = GeometrySampler::sample_object(&mut scene, key);
    assert!(matches!(result, Err(SkipReason::Malformed(_))));
}

// ============================================================================
// Empty results
// ============================================================================

#[test]
fn test_object_without_geometry_yields_nothing() {
    let mut scene = Scene::new();
    let key = scene
        .add_object(SceneObject::new("group", ObjectKind::Volume, Geometry::None))
        .unwrap();

    assert_eq!(GeometrySampler::sample_object(&mut scene, key), Ok(Vec::new()));
}

#[test]
fn test_hidden_or_unpickable_object_yields_nothing() {
    let mut scene = Scene::new();
    let hidden = scene
        .add_object(cube_at("hidden", Vec3::ZERO).with_flags(ObjectFlags::PICKABLE))
        .unwrap();
    let locked = scene
        .add_object(cube_at("locked", Vec3::ZERO).with_flags(ObjectFlags::VISIBLE))
        .unwrap();

    assert_eq!(GeometrySampler::sample_object(&mut scene, hidden), Ok(Vec::new()));
    assert_eq!(GeometrySampler::sample_object(&mut scene, locked), Ok(Vec::new()));
}

#[test]
fn test_removed_object_is_missing() {
    let mut scene = Scene::new();
    let key = scene.add_object(cube_at("cube", Vec3::ZERO)).unwrap();
    scene.remove_object(key);

    assert_eq!(GeometrySampler::sample_object(&mut scene, key), Err(SkipReason::Missing));
}

#[test]
fn test_skip_reason_display() {
    assert_eq!(SkipReason::Missing.to_string(), "object no longer in the scene");
    assert_eq!(
        SkipReason::Malformed("x".to_string()).to_string(),
        "malformed geometry: x"
    );
}
