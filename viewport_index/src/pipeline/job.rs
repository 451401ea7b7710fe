/// Per-invocation job state.
///
/// An `IndexingJob` holds one `CandidateRecord` per candidate object. Each
/// record carries its own owner, kind, samples and projected screen entries
/// together, so no stage has to line up positions across separate arrays.

use std::time::Instant;
use glam::Vec3;
use crate::index::{Projector, Sample, SampleKind, ScreenRect, ViewEntry};
use crate::scene::ObjectId;
use super::notify::{IndexOutcome, IndexReport, IndexTarget};

/// Everything one candidate object contributes to a rebuild.
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    pub owner: ObjectId,
    pub kind: SampleKind,
    pub samples: Vec<Sample>,
    /// World positions of `samples`, packed for `position_buffer()`
    positions: Vec<Vec3>,
    /// Screen entries produced by `project()`
    pub view_entries: Vec<ViewEntry>,
}

impl CandidateRecord {
    /// Build a record from the samples of one owner.
    ///
    /// Returns `None` for an empty sample list.
    pub fn from_samples(samples: Vec<Sample>) -> Option<Self> {
        let first = samples.first()?;
        let owner = first.owner.clone();
        let kind = first.kind;
        let positions = samples.iter().map(|s| s.world_position).collect();

        Some(Self {
            owner,
            kind,
            samples,
            positions,
            view_entries: Vec::new(),
        })
    }

    /// Sample world positions as a flat `[x, y, z, x, y, z, ...]` buffer.
    pub fn position_buffer(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Project every sample, dropping those behind the camera or above /
    /// left of the viewport.
    ///
    /// Volumes get the clamped screen bounds of their near-clipped AABB, point
    /// samples get a zero-size rectangle. Returns the number of dropped samples.
    pub fn project(&mut self, projector: &Projector) -> usize {
        self.view_entries.clear();

        for sample in &self.samples {
            let rect = match sample.kind {
                SampleKind::Volume => projector
                    .project_aabb(&sample.bounding_box)
                    .and_then(|bounds| Projector::to_screen_rect(&bounds)),
                SampleKind::PointCloudVertex => projector
                    .project(sample.world_position)
                    .map(|p| ScreenRect::from_point(p.x, p.y))
                    .and_then(|rect| Projector::to_screen_rect(&rect)),
            };

            if let Some(rect) = rect {
                self.view_entries.push(ViewEntry::new(sample.clone(), rect));
            }
        }

        self.samples.len() - self.view_entries.len()
    }

    /// Union of the projected rectangles. `None` before `project()` or
    /// when nothing projected.
    pub fn screen_rect(&self) -> Option<ScreenRect> {
        self.view_entries
            .iter()
            .map(|e| e.rect)
            .reduce(|a, b| {
                ScreenRect::from_corners(
                    a.x.min(b.x),
                    a.y.min(b.y),
                    a.right().max(b.right()),
                    a.bottom().max(b.bottom()),
                )
            })
    }
}

/// State of one `index_scene` / `index_view` invocation.
#[derive(Debug)]
pub struct IndexingJob {
    pub target: IndexTarget,
    pub generation: u64,
    pub records: Vec<CandidateRecord>,
    pub objects_considered: usize,
    pub objects_skipped: usize,
    pub samples_dropped: usize,
    started: Instant,
}

impl IndexingJob {
    pub fn new(target: IndexTarget, generation: u64) -> Self {
        Self {
            target,
            generation,
            records: Vec::new(),
            objects_considered: 0,
            objects_skipped: 0,
            samples_dropped: 0,
            started: Instant::now(),
        }
    }

    /// Group samples by owner into records, owners in sorted order.
    pub fn push_grouped(&mut self, mut samples: Vec<Sample>) {
        samples.sort_by(|a, b| a.owner.cmp(&b.owner).then(a.local_index.cmp(&b.local_index)));

        let mut current: Vec<Sample> = Vec::new();
        for sample in samples {
            if current.first().is_some_and(|first| first.owner != sample.owner) {
                self.records.extend(CandidateRecord::from_samples(std::mem::take(&mut current)));
            }
            current.push(sample);
        }
        self.records.extend(CandidateRecord::from_samples(current));
    }

    /// Total samples across all records.
    pub fn sample_count(&self) -> usize {
        self.records.iter().map(|r| r.samples.len()).sum()
    }

    /// Total projected entries across all records.
    pub fn view_entry_count(&self) -> usize {
        self.records.iter().map(|r| r.view_entries.len()).sum()
    }

    /// Finish the job.
    pub fn report(&self, samples_indexed: usize, outcome: IndexOutcome) -> IndexReport {
        IndexReport {
            target: self.target,
            generation: self.generation,
            objects_considered: self.objects_considered,
            samples_indexed,
            objects_skipped: self.objects_skipped,
            samples_dropped: self.samples_dropped,
            elapsed: self.started.elapsed(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::AABB;
    use crate::camera::{Camera, Viewport};

    fn front_projector() -> Projector {
        let camera = Camera::look_at_perspective(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Vec3::Y,
            std::f32::consts::FRAC_PI_4,
            800.0 / 600.0,
            0.1,
            100.0,
        );
        Projector::from_viewport(&Viewport::new(800, 600, camera))
    }

    #[test]
    fn test_position_buffer_is_flat_triples() {
        let record = CandidateRecord::from_samples(vec![
            Sample::point(ObjectId::from("c"), 0, Vec3::new(1.0, 2.0, 3.0)),
            Sample::point(ObjectId::from("c"), 1, Vec3::new(4.0, 5.0, 6.0)),
        ])
        .unwrap();

        assert_eq!(record.position_buffer(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(record.kind, SampleKind::PointCloudVertex);
    }

    #[test]
    fn test_empty_samples_make_no_record() {
        assert!(CandidateRecord::from_samples(Vec::new()).is_none());
    }

    #[test]
    fn test_push_grouped_builds_one_record_per_owner() {
        let mut job = IndexingJob::new(IndexTarget::View, 1);
        job.push_grouped(vec![
            Sample::point(ObjectId::from("b"), 1, Vec3::ZERO),
            Sample::volume(ObjectId::from("a"), AABB::from_point(Vec3::ZERO)),
            Sample::point(ObjectId::from("b"), 0, Vec3::ZERO),
        ]);

        assert_eq!(job.records.len(), 2);
        assert_eq!(job.records[0].owner.as_str(), "a");
        assert_eq!(job.records[1].samples[0].local_index, 0);
        assert_eq!(job.sample_count(), 3);
    }

    #[test]
    fn test_project_drops_behind_camera_samples() {
        let mut record = CandidateRecord::from_samples(vec![
            Sample::point(ObjectId::from("c"), 0, Vec3::ZERO),
            Sample::point(ObjectId::from("c"), 1, Vec3::new(0.0, 0.0, 20.0)),
        ])
        .unwrap();

        let dropped = record.project(&front_projector());

        assert_eq!(dropped, 1);
        assert_eq!(record.view_entries.len(), 1);
        assert_eq!(record.view_entries[0].rect, ScreenRect::from_point(400.0, 300.0));
    }

    #[test]
    fn test_project_volume_has_positive_size() {
        let mut record = CandidateRecord::from_samples(vec![Sample::volume(
            ObjectId::from("cube"),
            AABB::from_center_half_extent(Vec3::ZERO, Vec3::ONE),
        )])
        .unwrap();

        assert_eq!(record.project(&front_projector()), 0);
        let rect = record.screen_rect().unwrap();
        assert!(rect.width > 0.0 && rect.height > 0.0);
        assert!(rect.intersects(&ScreenRect::from_point(400.0, 300.0)));
    }

    #[test]
    fn test_report_carries_job_counters() {
        let mut job = IndexingJob::new(IndexTarget::Scene, 7);
        job.objects_considered = 3;
        job.objects_skipped = 1;
        job.samples_dropped = 4;

        let report = job.report(5, IndexOutcome::Committed);

        assert_eq!(report.generation, 7);
        assert_eq!(report.objects_considered, 3);
        assert_eq!(report.objects_skipped, 1);
        assert_eq!(report.samples_dropped, 4);
        assert_eq!(report.samples_indexed, 5);
        assert!(report.is_committed());
    }
}
