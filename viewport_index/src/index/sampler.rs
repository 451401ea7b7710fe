/// GeometrySampler: turns one scene object into indexable Samples.
///
/// - Volume objects yield exactly one whole-object sample (world AABB).
/// - Point clouds yield one sample per finite vertex.
/// - Hidden, unpickable and geometry-less objects yield nothing.
///
/// Malformed geometry is reported as a `SkipReason` and logged; it never
/// becomes an `Error`, so one bad object cannot abort a rebuild.

use std::fmt;
use glam::Mat4;
use crate::index_warn;
use crate::scene::{Geometry, ObjectKey, ObjectKind, SceneGraph, SceneObject};
use super::sample::Sample;

const SOURCE: &str = "viewport_index::GeometrySampler";

/// Why an object produced no samples and was counted as skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The key no longer resolves to an object
    Missing,
    /// Geometry or transform cannot be sampled
    Malformed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Missing => f.write_str("object no longer in the scene"),
            SkipReason::Malformed(reason) => write!(f, "malformed geometry: {}", reason),
        }
    }
}

/// Stateless sampler.
pub struct GeometrySampler;

impl GeometrySampler {
    /// Sample one object.
    ///
    /// Refreshes the object's world matrix first if the scene flags it stale.
    pub fn sample_object(
        scene: &mut dyn SceneGraph,
        key: ObjectKey,
    ) -> Result<Vec<Sample>, SkipReason> {
        let stale = scene
            .object(key)
            .ok_or(SkipReason::Missing)?
            .world_needs_update();
        if stale && !scene.refresh_world_matrix(key) {
            return Err(SkipReason::Missing);
        }

        let object = scene.object(key).ok_or(SkipReason::Missing)?;
        if !object.is_selectable() {
            return Ok(Vec::new());
        }

        let result = match object.kind() {
            ObjectKind::Volume => Self::sample_volume(object),
            ObjectKind::PointCloud => Self::sample_point_cloud(object),
        };

        if let Err(reason) = &result {
            index_warn!(SOURCE, "Skipping '{}': {}", object.id(), reason);
        }
        result
    }

    fn sample_volume(object: &SceneObject) -> Result<Vec<Sample>, SkipReason> {
        let Some(local) = object.geometry().local_bounds() else {
            return Ok(Vec::new());
        };
        if !local.is_finite() {
            return Err(SkipReason::Malformed("non-finite local bounds".to_string()));
        }

        let world = local.transformed(object.world_matrix());
        if !world.is_finite() {
            return Err(SkipReason::Malformed("non-finite world transform".to_string()));
        }

        Ok(vec![Sample::volume(object.id().clone(), world)])
    }

    fn sample_point_cloud(object: &SceneObject) -> Result<Vec<Sample>, SkipReason> {
        let positions = match object.geometry() {
            Geometry::None => return Ok(Vec::new()),
            Geometry::Bounds(_) => {
                return Err(SkipReason::Malformed("point cloud without positions".to_string()));
            }
            Geometry::Positions(positions) => positions,
        };

        let world_matrix: &Mat4 = object.world_matrix();
        if !world_matrix.is_finite() {
            return Err(SkipReason::Malformed("non-finite world transform".to_string()));
        }

        let mut samples = Vec::with_capacity(positions.len());
        let mut dropped = 0usize;
        for (index, local) in positions.iter().enumerate() {
            let Ok(local_index) = i32::try_from(index) else {
                break;
            };
            let world = world_matrix.transform_point3(*local);
            if !world.is_finite() {
                dropped += 1;
                continue;
            }
            samples.push(Sample::point(object.id().clone(), local_index, world));
        }

        if dropped > 0 {
            index_warn!(
                SOURCE,
                "Dropped {} non-finite vertices of '{}'",
                dropped,
                object.id()
            );
        }

        Ok(samples)
    }
}

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
