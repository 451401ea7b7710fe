/// IndexingPipeline: staged asynchronous rebuilds of both spatial indices.
///
/// The pipeline owns the live `SceneSpatialIndex` and `ViewSpatialIndex`.
/// Each invocation stamps a new generation, builds into a private staging
/// index across several stages (awaiting a `StageBoundary` between them)
/// and swaps the staging index in only if no newer invocation was issued
/// meanwhile. Readers therefore only ever see complete generations.
///
/// Owned explicitly by the host: create one per viewer, share it by
/// reference (or `Arc`), call `dispose()` at teardown.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use crate::camera::{Frustum, Viewport};
use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::index::{
    GeometrySampler, Projector, Sample, SceneEntry, SceneSpatialIndex, ViewEntry,
    ViewSpatialIndex,
};
use crate::scene::{ObjectId, SceneGraph};
use crate::{index_debug, index_err, index_info, index_trace};
use super::job::{CandidateRecord, IndexingJob};
use super::notify::{
    IndexEvent, IndexObserver, IndexOutcome, IndexReport, IndexTarget, SubscriptionId,
};
use super::stage::stage_boundary;

const SOURCE: &str = "viewport_index::IndexingPipeline";

/// Staged rebuild orchestrator owning both live indices.
pub struct IndexingPipeline {
    config: IndexConfig,
    /// Live 3D index (last committed generation)
    scene_index: RwLock<SceneSpatialIndex>,
    /// Live 2D index (last committed generation)
    view_index: RwLock<ViewSpatialIndex>,
    /// Latest scene generation issued
    scene_generation: AtomicU64,
    /// Latest view generation issued (or discarded)
    view_generation: AtomicU64,
    /// Scene revision of the last committed `index_scene`
    scene_revision: RwLock<Option<u64>>,
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn IndexObserver>)>>,
    next_subscription: AtomicU64,
    disposed: AtomicBool,
}

impl IndexingPipeline {
    /// Create a pipeline with empty, unbuilt indices.
    pub fn create(config: IndexConfig) -> Result<Self> {
        config.validate().map_err(|e| index_err!(SOURCE, e))?;

        index_debug!(SOURCE, "Created pipeline ({:?} backend)", config.backend);

        Ok(Self {
            scene_index: RwLock::new(SceneSpatialIndex::with_config(&config)),
            view_index: RwLock::new(ViewSpatialIndex::new(&config)),
            config,
            scene_generation: AtomicU64::new(0),
            view_generation: AtomicU64::new(0),
            scene_revision: RwLock::new(None),
            observers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            disposed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Clear both indices and reject any further work.
    ///
    /// In-flight invocations finish with `Error::PipelineDisposed` instead
    /// of committing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.scene_generation.fetch_add(1, Ordering::SeqCst);
        self.view_generation.fetch_add(1, Ordering::SeqCst);

        self.scene_index.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.view_index.write().unwrap_or_else(PoisonError::into_inner).clear(0, 0);
        *self.scene_revision.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.observers.write().unwrap_or_else(PoisonError::into_inner).clear();

        index_debug!(SOURCE, "Pipeline disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.is_disposed() {
            Err(index_err!(SOURCE, Error::PipelineDisposed))
        } else {
            Ok(())
        }
    }

    // ===== SCENE INDEXING =====

    /// Rebuild the 3D index from every object of the scene.
    ///
    /// Malformed objects are skipped and counted. On error the live index
    /// keeps its last committed generation.
    pub async fn index_scene(&self, scene: &mut dyn SceneGraph) -> Result<IndexReport> {
        self.ensure_alive()?;
        let generation = self.scene_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let revision = scene.revision();
        let mut job = IndexingJob::new(IndexTarget::Scene, generation);
        let mut staging = SceneSpatialIndex::with_config(&self.config);

        index_trace!(SOURCE, "index_scene #{}: sampling", generation);
        stage_boundary().await;

        for key in scene.object_keys() {
            job.objects_considered += 1;
            match GeometrySampler::sample_object(scene, key) {
                Ok(samples) => job.records.extend(CandidateRecord::from_samples(samples)),
                Err(_) => job.objects_skipped += 1,
            }
        }

        index_trace!(SOURCE, "index_scene #{}: inserting {} samples", generation, job.sample_count());
        stage_boundary().await;

        let entries: Vec<SceneEntry> = job
            .records
            .iter()
            .flat_map(|record| record.samples.iter().cloned().map(SceneEntry::new))
            .collect();
        staging.insert_all(entries).map_err(|e| index_err!(SOURCE, e))?;
        staging.set_generation(generation);
        let samples_indexed = staging.len();

        stage_boundary().await;

        if !self.commit_scene(staging, generation, revision)? {
            return Ok(self.supersede(&job, IndexTarget::Scene));
        }

        let report = job.report(samples_indexed, IndexOutcome::Committed);
        index_info!(
            SOURCE,
            "Scene indexed: generation {}, {} objects, {} samples, {} skipped in {:?}",
            generation,
            report.objects_considered,
            report.samples_indexed,
            report.objects_skipped,
            report.elapsed
        );
        self.notify(&IndexEvent::SceneIndexed(report.clone()));
        Ok(report)
    }

    /// Rebuild the 3D index only if the scene changed since the last
    /// committed `index_scene`. Returns `None` when nothing changed.
    pub async fn refresh_scene(&self, scene: &mut dyn SceneGraph) -> Result<Option<IndexReport>> {
        self.ensure_alive()?;
        let last = *self.scene_revision.read().unwrap_or_else(PoisonError::into_inner);
        if last == Some(scene.revision()) {
            index_trace!(SOURCE, "refresh_scene: revision {} already indexed", scene.revision());
            return Ok(None);
        }
        self.index_scene(scene).await.map(Some)
    }

    /// Swap a finished staging index in. Returns false when superseded.
    fn commit_scene(&self, staging: SceneSpatialIndex, generation: u64, revision: u64) -> Result<bool> {
        self.ensure_alive()?;
        let mut live = self
            .scene_index
            .write()
            .map_err(|_| index_err!(SOURCE, Error::LockPoisoned("scene index".to_string())))?;

        if self.scene_generation.load(Ordering::SeqCst) != generation {
            return Ok(false);
        }
        *live = staging;
        *self.scene_revision.write().unwrap_or_else(PoisonError::into_inner) = Some(revision);
        Ok(true)
    }

    /// Remove every entry of one object from both live indices.
    ///
    /// Returns the number of scene index entries removed.
    pub fn remove_object(&self, id: &ObjectId) -> Result<usize> {
        self.ensure_alive()?;
        let removed = self
            .scene_index
            .write()
            .map_err(|_| index_err!(SOURCE, Error::LockPoisoned("scene index".to_string())))?
            .remove(id);
        self.view_index
            .write()
            .map_err(|_| index_err!(SOURCE, Error::LockPoisoned("view index".to_string())))?
            .remove(id);

        index_trace!(SOURCE, "Removed {} entries of '{}'", removed, id);
        Ok(removed)
    }

    // ===== VIEW INDEXING =====

    /// Rebuild the 2D index for a viewport snapshot.
    ///
    /// Candidates come from the live 3D index; the scene itself is not
    /// touched. If another `index_view` is issued (or `discard_pending_view`
    /// called) before this one commits, the result is discarded and the
    /// report's outcome is `Superseded`.
    pub async fn index_view(&self, viewport: &Viewport) -> Result<IndexReport> {
        self.ensure_alive()?;
        let generation = self.view_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let viewport = viewport.clone();

        if !viewport.is_valid() {
            let error = if viewport.width() == 0 || viewport.height() == 0 {
                Error::InvalidViewport(format!("{}x{}", viewport.width(), viewport.height()))
            } else {
                Error::CollaboratorUnavailable("camera matrices are not finite".to_string())
            };
            return Err(index_err!(SOURCE, error));
        }

        let mut job = IndexingJob::new(IndexTarget::View, generation);

        index_trace!(SOURCE, "index_view #{}: frustum query", generation);
        stage_boundary().await;

        let frustum = viewport.camera().frustum();
        let candidates = {
            let scene_index = self.read_scene();
            if scene_index.generation() == 0 {
                return Err(index_err!(SOURCE, Error::SceneNotIndexed));
            }
            scene_index.query_frustum(&frustum)
        };
        job.push_grouped(candidates);
        job.objects_considered = job.records.len();

        index_trace!(SOURCE, "index_view #{}: projecting {} samples", generation, job.sample_count());
        stage_boundary().await;

        let projector = Projector::from_viewport(&viewport);
        for record in &mut job.records {
            let dropped = record.project(&projector);
            if record.view_entries.is_empty() {
                job.objects_skipped += 1;
            } else if dropped > 0 {
                index_trace!(SOURCE, "'{}': {} samples off-screen", record.owner, dropped);
            }
            job.samples_dropped += dropped;
        }

        stage_boundary().await;

        if self.is_view_superseded(generation) {
            return Ok(self.supersede(&job, IndexTarget::View));
        }

        let entries: Vec<ViewEntry> = job
            .records
            .iter_mut()
            .flat_map(|record| std::mem::take(&mut record.view_entries))
            .collect();
        let mut staging = ViewSpatialIndex::new(&self.config);
        staging.clear(viewport.width(), viewport.height());
        staging.insert_all(entries).map_err(|e| index_err!(SOURCE, e))?;
        staging.set_generation(generation);
        let samples_indexed = staging.len();

        if !self.commit_view(staging, generation)? {
            return Ok(self.supersede(&job, IndexTarget::View));
        }

        let report = job.report(samples_indexed, IndexOutcome::Committed);
        index_debug!(
            SOURCE,
            "View indexed: generation {}, {} candidates, {} entries, {} objects / {} samples off-screen in {:?}",
            generation,
            report.objects_considered,
            report.samples_indexed,
            report.objects_skipped,
            report.samples_dropped,
            report.elapsed
        );
        self.notify(&IndexEvent::ViewIndexed(report.clone()));
        Ok(report)
    }

    fn is_view_superseded(&self, generation: u64) -> bool {
        self.view_generation.load(Ordering::SeqCst) != generation
    }

    /// Swap a finished staging index in. Returns false when superseded.
    fn commit_view(&self, staging: ViewSpatialIndex, generation: u64) -> Result<bool> {
        self.ensure_alive()?;
        let mut live = self
            .view_index
            .write()
            .map_err(|_| index_err!(SOURCE, Error::LockPoisoned("view index".to_string())))?;

        if self.is_view_superseded(generation) {
            return Ok(false);
        }
        *live = staging;
        Ok(true)
    }

    /// Treat the pending `index_view` (if any) as discarded.
    ///
    /// Hook for a host-imposed timeout: the in-flight invocation will not
    /// commit. The live view index is left as is.
    pub fn discard_pending_view(&self) {
        let discarded = self.view_generation.fetch_add(1, Ordering::SeqCst);
        index_debug!(SOURCE, "Discarded pending view generation {}", discarded);
    }

    fn supersede(&self, job: &IndexingJob, target: IndexTarget) -> IndexReport {
        index_debug!(SOURCE, "{:?} generation {} superseded", target, job.generation);
        self.notify(&IndexEvent::Superseded { target, generation: job.generation });
        job.report(0, IndexOutcome::Superseded)
    }

    // ===== QUERIES =====

    fn read_scene(&self) -> RwLockReadGuard<'_, SceneSpatialIndex> {
        self.scene_index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_view(&self) -> RwLockReadGuard<'_, ViewSpatialIndex> {
        self.view_index.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Samples whose world AABB intersects the frustum (empty before the
    /// first committed `index_scene`).
    pub fn query_frustum(&self, frustum: &Frustum) -> Vec<Sample> {
        self.read_scene().query_frustum(frustum)
    }

    /// One Sample per object in the rectangle, sorted by owner (empty
    /// before the first committed `index_view`).
    pub fn query_rect(&self, x: f32, y: f32, width: f32, height: f32) -> Vec<Sample> {
        self.read_view().query_rect(x, y, width, height)
    }

    /// Every Sample in the rectangle, sorted by `(owner, local_index)`.
    pub fn query_rect_samples(&self, x: f32, y: f32, width: f32, height: f32) -> Vec<Sample> {
        self.read_view().query_rect_samples(x, y, width, height)
    }

    /// Closest Sample within `radius` pixels.
    pub fn query_nearest(&self, x: f32, y: f32, radius: f32) -> Option<Sample> {
        self.read_view().query_nearest(x, y, radius)
    }

    /// Like `query_rect`, but `Error::ViewNotIndexed` before the first
    /// committed `index_view`.
    pub fn query_rect_checked(&self, x: f32, y: f32, width: f32, height: f32) -> Result<Vec<Sample>> {
        let view = self.read_view();
        if !view.is_built() {
            return Err(Error::ViewNotIndexed);
        }
        Ok(view.query_rect(x, y, width, height))
    }

    /// Like `query_nearest`, but `Error::ViewNotIndexed` before the first
    /// committed `index_view`.
    pub fn query_nearest_checked(&self, x: f32, y: f32, radius: f32) -> Result<Option<Sample>> {
        let view = self.read_view();
        if !view.is_built() {
            return Err(Error::ViewNotIndexed);
        }
        Ok(view.query_nearest(x, y, radius))
    }

    /// Generation of the live 3D index (0 = never indexed).
    pub fn scene_generation(&self) -> u64 {
        self.read_scene().generation()
    }

    /// Generation of the live 2D index (0 = never indexed).
    pub fn view_generation(&self) -> u64 {
        self.read_view().generation()
    }

    /// Number of entries in the live 3D index.
    pub fn scene_len(&self) -> usize {
        self.read_scene().len()
    }

    /// Number of entries in the live 2D index.
    pub fn view_len(&self) -> usize {
        self.read_view().len()
    }

    // ===== OBSERVERS =====

    /// Register an observer for index events.
    pub fn subscribe(&self, observer: impl IndexObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(observer)));
        id
    }

    /// Remove an observer. Returns false if the id is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(sub, _)| *sub != id);
        observers.len() != before
    }

    fn notify(&self, event: &IndexEvent) {
        let observers: Vec<Arc<dyn IndexObserver>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
