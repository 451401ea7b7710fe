/// ViewSpatialIndex: 2D quadtree over the screen rectangles of visible Samples.
///
/// Scoped to one viewport: the root node covers `[0, width] x [0, height]`.
/// The tree is bulk built: entries are partitioned recursively into
/// quadrants, an entry straddling a split stays in the parent, and splitting
/// stops at `quadtree_max_depth` or when a node holds few enough entries.
/// Entries whose rectangle reaches beyond the viewport stay in the root.

use rustc_hash::{FxHashMap, FxHashSet};
use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::scene::ObjectId;
use super::sample::{Sample, ScreenRect, ViewEntry};

/// Index of the root node in the flat node array.
const ROOT: usize = 0;

/// A single quadtree node.
struct QuadNode {
    /// Pixel bounds of this node
    bounds: ScreenRect,
    /// Index of the first of 4 consecutive children (0 = leaf)
    first_child: usize,
    /// Entries that don't fit in any child (indices into `entries`)
    entries: Vec<usize>,
}

/// Screen-space index for one viewport.
pub struct ViewSpatialIndex {
    /// Flat node array, root first
    nodes: Vec<QuadNode>,
    /// Every indexed entry
    entries: Vec<ViewEntry>,
    /// `(owner, local_index)` pairs already indexed
    sample_keys: FxHashSet<(ObjectId, i32)>,
    width: u32,
    height: u32,
    max_depth: u32,
    max_entries: usize,
    built: bool,
    /// Generation this index was built for (0 = never built)
    generation: u64,
}

impl ViewSpatialIndex {
    pub fn new(config: &IndexConfig) -> Self {
        let mut index = Self {
            nodes: Vec::new(),
            entries: Vec::new(),
            sample_keys: FxHashSet::default(),
            width: 0,
            height: 0,
            max_depth: config.quadtree_max_depth,
            max_entries: config.quadtree_max_entries.max(1),
            built: false,
            generation: 0,
        };
        index.clear(0, 0);
        index
    }

    /// Reinitialise to the screen rectangle `[0, width] x [0, height]`.
    ///
    /// Drops every entry and marks the index as unbuilt.
    pub fn clear(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.entries.clear();
        self.sample_keys.clear();
        self.nodes.clear();
        self.nodes.push(QuadNode {
            bounds: self.screen_bounds(),
            first_child: 0,
            entries: Vec::new(),
        });
        self.built = false;
        self.generation = 0;
    }

    fn screen_bounds(&self) -> ScreenRect {
        ScreenRect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    /// Bulk build from a batch of entries. Marks the index as built.
    ///
    /// A `(owner, local_index)` pair repeated within the batch or already
    /// indexed rejects the whole batch with `Error::DuplicateSample`.
    pub fn insert_all(&mut self, entries: Vec<ViewEntry>) -> Result<()> {
        let mut batch_keys: FxHashSet<(ObjectId, i32)> = FxHashSet::default();
        for entry in &entries {
            let key = (entry.sample.owner.clone(), entry.sample.local_index);
            if self.sample_keys.contains(&key) || !batch_keys.insert(key) {
                return Err(Error::DuplicateSample {
                    owner: entry.sample.owner.clone(),
                    local_index: entry.sample.local_index,
                });
            }
        }

        self.sample_keys.extend(batch_keys);
        self.entries.extend(entries);
        self.rebuild();
        self.built = true;
        Ok(())
    }

    /// Remove every entry of one owner. Returns the number removed.
    pub fn remove(&mut self, owner: &ObjectId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| &entry.sample.owner != owner);
        let removed = before - self.entries.len();

        if removed > 0 {
            self.sample_keys.retain(|(id, _)| id != owner);
            self.rebuild();
        }
        removed
    }

    /// Rebuild the tree from `self.entries`.
    fn rebuild(&mut self) {
        self.nodes.clear();
        self.nodes.push(QuadNode {
            bounds: self.screen_bounds(),
            first_child: 0,
            entries: Vec::new(),
        });

        let all: Vec<usize> = (0..self.entries.len()).collect();
        self.build_node(ROOT, all, 0);
    }

    /// Partition `items` between node `node_idx` and its four quadrants.
    fn build_node(&mut self, node_idx: usize, items: Vec<usize>, depth: u32) {
        if items.len() <= self.max_entries || depth >= self.max_depth {
            self.nodes[node_idx].entries = items;
            return;
        }

        let bounds = self.nodes[node_idx].bounds;
        let quadrants = Self::quadrants(&bounds);

        let mut stay = Vec::new();
        let mut buckets: [Vec<usize>; 4] = Default::default();
        for item in items {
            let rect = &self.entries[item].rect;
            match quadrants.iter().position(|q| q.contains_rect(rect)) {
                Some(q) => buckets[q].push(item),
                None => stay.push(item),
            }
        }

        self.nodes[node_idx].entries = stay;
        if buckets.iter().all(|b| b.is_empty()) {
            return;
        }

        let first_child = self.nodes.len();
        self.nodes[node_idx].first_child = first_child;
        for quadrant in &quadrants {
            self.nodes.push(QuadNode {
                bounds: *quadrant,
                first_child: 0,
                entries: Vec::new(),
            });
        }

        for (q, bucket) in buckets.into_iter().enumerate() {
            self.build_node(first_child + q, bucket, depth + 1);
        }
    }

    /// Quadrant layout: 0 = top-left, 1 = top-right, 2 = bottom-left, 3 = bottom-right.
    fn quadrants(bounds: &ScreenRect) -> [ScreenRect; 4] {
        let half_w = bounds.width * 0.5;
        let half_h = bounds.height * 0.5;
        [
            ScreenRect::new(bounds.x, bounds.y, half_w, half_h),
            ScreenRect::new(bounds.x + half_w, bounds.y, half_w, half_h),
            ScreenRect::new(bounds.x, bounds.y + half_h, half_w, half_h),
            ScreenRect::new(bounds.x + half_w, bounds.y + half_h, half_w, half_h),
        ]
    }

    /// Indices of every entry whose rectangle intersects `query`.
    fn collect_intersecting(&self, query: &ScreenRect) -> Vec<usize> {
        let mut hits = Vec::new();
        if !self.built {
            return hits;
        }

        let mut stack = vec![ROOT];
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            hits.extend(
                node.entries
                    .iter()
                    .copied()
                    .filter(|&i| self.entries[i].rect.intersects(query)),
            );

            if node.first_child != 0 {
                for child in node.first_child..node.first_child + 4 {
                    if self.nodes[child].bounds.intersects(query) {
                        stack.push(child);
                    }
                }
            }
        }
        hits
    }

    /// Marquee query: one Sample per object whose screen rectangle
    /// intersects the query rectangle (the hit with the smallest
    /// `local_index`), sorted by owner.
    pub fn query_rect(&self, x: f32, y: f32, width: f32, height: f32) -> Vec<Sample> {
        let query = ScreenRect::new(x, y, width, height);

        let mut per_owner: FxHashMap<&ObjectId, &Sample> = FxHashMap::default();
        for i in self.collect_intersecting(&query) {
            let sample = &self.entries[i].sample;
            per_owner
                .entry(&sample.owner)
                .and_modify(|best| {
                    if sample.local_index < best.local_index {
                        *best = sample;
                    }
                })
                .or_insert(sample);
        }

        let mut samples: Vec<Sample> = per_owner.into_values().cloned().collect();
        samples.sort_by(|a, b| a.owner.cmp(&b.owner));
        samples
    }

    /// Vertex-level marquee query: every intersecting Sample, sorted by
    /// `(owner, local_index)`.
    pub fn query_rect_samples(&self, x: f32, y: f32, width: f32, height: f32) -> Vec<Sample> {
        let query = ScreenRect::new(x, y, width, height);

        let mut samples: Vec<Sample> = self
            .collect_intersecting(&query)
            .into_iter()
            .map(|i| self.entries[i].sample.clone())
            .collect();
        samples.sort_by(|a, b| a.owner.cmp(&b.owner).then(a.local_index.cmp(&b.local_index)));
        samples
    }

    /// Sample whose rectangle is closest to `(x, y)`, within `radius` pixels.
    ///
    /// Distance is 0 inside a rectangle. Ties are broken by distance to the
    /// rectangle center, then smallest `local_index`, then owner order.
    pub fn query_nearest(&self, x: f32, y: f32, radius: f32) -> Option<Sample> {
        if !(radius >= 0.0) || !x.is_finite() || !y.is_finite() {
            return None;
        }

        let query = ScreenRect::new(x - radius, y - radius, radius * 2.0, radius * 2.0);
        self.collect_intersecting(&query)
            .into_iter()
            .map(|i| &self.entries[i])
            .filter_map(|entry| {
                let distance = entry.rect.distance_to(x, y);
                (distance <= radius).then(|| (distance, entry.rect.center_distance_to(x, y), entry))
            })
            .min_by(|(da, ca, a), (db, cb, b)| {
                da.total_cmp(db)
                    .then(ca.total_cmp(cb))
                    .then(a.sample.local_index.cmp(&b.sample.local_index))
                    .then(a.sample.owner.cmp(&b.sample.owner))
            })
            .map(|(_, _, entry)| entry.sample.clone())
    }

    /// Every indexed entry.
    pub fn entries(&self) -> &[ViewEntry] {
        &self.entries
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generation this index was built for (0 = never built).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }
}

#[cfg(test)]
#[path = "view_spatial_index_tests.rs"]
mod tests;
