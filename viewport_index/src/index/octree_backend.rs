/// OctreeBackend: static octree backing the scene index.
///
/// Single-node placement: each entry is stored in exactly one node, the
/// deepest node whose AABB fully contains it. Entries straddling a child
/// boundary stay in the parent.
///
/// The tree is pre-allocated for a fixed `max_depth`. Its root bounds are
/// refitted to the entry extent on bulk load whenever a batch does not fit,
/// so the tree always covers the scene it indexes.

use rustc_hash::FxHashMap;
use glam::Vec3;
use crate::bounds::AABB;
use crate::camera::{Frustum, FrustumTest};
use crate::config::IndexConfig;
use super::scene_spatial_index::{EntryKey, SpatialBackend};

/// Index of the root node in the flat node array.
const ROOT: usize = 0;

/// Smallest padding around a refitted extent, in world units.
const MIN_PADDING: f32 = 1e-3;

/// A single node in the octree.
struct OctreeNode {
    /// World-space AABB of this node
    aabb: AABB,
    /// Index of the first child in the flat array (0 = no children / leaf)
    first_child: usize,
    /// Entries that don't fit in any child
    entries: Vec<EntryKey>,
}

/// Static octree with bulk-load refit.
pub struct OctreeBackend {
    /// Flat array of all octree nodes (pre-allocated, depth-first)
    nodes: Vec<OctreeNode>,
    /// Maximum depth of the tree (root = depth 0)
    max_depth: u32,
    /// Relative padding applied when refitting the root
    padding: f32,
    /// Reverse lookup: entry key → (node index, world AABB)
    locations: FxHashMap<EntryKey, (usize, AABB)>,
    /// subtree_sizes[d] = total node count for a subtree of depth d
    subtree_sizes: Vec<usize>,
}

impl OctreeBackend {
    /// Create an empty octree.
    ///
    /// # Arguments
    ///
    /// * `max_depth` - Maximum tree depth (root = 0), clamped to
    ///   `IndexConfig::MAX_OCTREE_DEPTH`. Total nodes = (8^(d+1) - 1) / 7.
    /// * `padding` - Relative padding around the entry extent on refit
    pub fn new(max_depth: u32, padding: f32) -> Self {
        let max_depth = max_depth.min(IndexConfig::MAX_OCTREE_DEPTH);
        let subtree_sizes: Vec<usize> = (0..=max_depth).map(Self::total_node_count).collect();
        let mut backend = Self {
            nodes: Vec::new(),
            max_depth,
            padding,
            locations: FxHashMap::default(),
            subtree_sizes,
        };
        backend.rebuild_nodes(&AABB::from_center_half_extent(Vec3::ZERO, Vec3::ONE));
        backend
    }

    /// World bounds covered by the tree.
    pub fn root_bounds(&self) -> AABB {
        self.nodes[ROOT].aabb
    }

    /// Total number of nodes for a given depth: (8^(d+1) - 1) / 7
    fn total_node_count(max_depth: u32) -> usize {
        let mut count = 0usize;
        let mut level_count = 1usize;
        for _ in 0..=max_depth {
            count += level_count;
            level_count *= 8;
        }
        count
    }

    /// Reallocate the node array for new root bounds. Drops all entries.
    fn rebuild_nodes(&mut self, root: &AABB) {
        self.nodes.clear();
        self.nodes.reserve(self.subtree_sizes[self.max_depth as usize]);
        Self::build_recursive(&mut self.nodes, root, 0, self.max_depth);
        debug_assert_eq!(self.nodes.len(), self.subtree_sizes[self.max_depth as usize]);
    }

    /// Recursively build the static octree node array (depth-first).
    fn build_recursive(nodes: &mut Vec<OctreeNode>, aabb: &AABB, depth: u32, max_depth: u32) {
        let node_index = nodes.len();
        nodes.push(OctreeNode {
            aabb: *aabb,
            first_child: 0,
            entries: Vec::new(),
        });

        if depth >= max_depth {
            return;
        }

        let center = aabb.center();
        nodes[node_index].first_child = nodes.len();

        for octant in 0..8u8 {
            let child_aabb = Self::octant_aabb(aabb, &center, octant);
            Self::build_recursive(nodes, &child_aabb, depth + 1, max_depth);
        }
    }

    /// Compute the AABB of a specific octant (0–7).
    ///
    /// Octant bit layout: bit0 = X, bit1 = Y, bit2 = Z (0 = low, 1 = high).
    fn octant_aabb(parent: &AABB, center: &Vec3, octant: u8) -> AABB {
        AABB {
            min: Vec3::new(
                if octant & 1 == 0 { parent.min.x } else { center.x },
                if octant & 2 == 0 { parent.min.y } else { center.y },
                if octant & 4 == 0 { parent.min.z } else { center.z },
            ),
            max: Vec3::new(
                if octant & 1 == 0 { center.x } else { parent.max.x },
                if octant & 2 == 0 { center.y } else { parent.max.y },
                if octant & 4 == 0 { center.z } else { parent.max.z },
            ),
        }
    }

    /// Which octant a point falls into relative to a center.
    fn point_octant(center: &Vec3, point: &Vec3) -> u8 {
        ((point.x >= center.x) as u8)
            | (((point.y >= center.y) as u8) << 1)
            | (((point.z >= center.z) as u8) << 2)
    }

    /// Offset of octant `i` in the depth-first node layout.
    fn subtree_offset(&self, octant: u8, remaining_depth: u32) -> usize {
        octant as usize * self.subtree_sizes[remaining_depth as usize]
    }

    /// Place one entry in the deepest node that fully contains it.
    ///
    /// If both AABB corners fall into the same octant the entry fits in
    /// that child, otherwise it straddles a boundary and stays put.
    fn place(&mut self, key: EntryKey, world_aabb: &AABB) {
        let mut node_idx = ROOT;

        if self.nodes[ROOT].aabb.contains(world_aabb) {
            let mut depth = 0;
            while depth < self.max_depth {
                let first_child = self.nodes[node_idx].first_child;
                if first_child == 0 {
                    break;
                }

                let center = self.nodes[node_idx].aabb.center();
                let min_oct = Self::point_octant(&center, &world_aabb.min);
                let max_oct = Self::point_octant(&center, &world_aabb.max);
                if min_oct != max_oct {
                    break;
                }

                node_idx = first_child + self.subtree_offset(min_oct, self.max_depth - depth - 1);
                depth += 1;
            }
        }

        self.nodes[node_idx].entries.push(key);
        self.locations.insert(key, (node_idx, *world_aabb));
    }

    /// Recursively query the octree with a frustum.
    ///
    /// 3-way classification at each node:
    /// - `Outside` → skip entire subtree
    /// - `Inside` → collect all entries from subtree without further testing
    /// - `Partial` → test entries individually, recurse into children
    fn query_recursive(
        &self,
        node_idx: usize,
        frustum: &Frustum,
        classification: FrustumTest,
        results: &mut Vec<EntryKey>,
        depth: u32,
    ) {
        let node = &self.nodes[node_idx];

        match classification {
            FrustumTest::Outside => {}

            FrustumTest::Inside => self.collect_all(node_idx, results, depth),

            FrustumTest::Partial => {
                for &key in &node.entries {
                    if let Some((_, world_aabb)) = self.locations.get(&key) {
                        if frustum.intersects_aabb(world_aabb) {
                            results.push(key);
                        }
                    }
                }

                if depth < self.max_depth && node.first_child != 0 {
                    for octant in 0..8u8 {
                        let child_idx = node.first_child
                            + self.subtree_offset(octant, self.max_depth - depth - 1);
                        let child_class = frustum.classify_aabb(&self.nodes[child_idx].aabb);
                        self.query_recursive(child_idx, frustum, child_class, results, depth + 1);
                    }
                }
            }
        }
    }

    /// Collect all entries from a node and its subtree (no frustum test).
    fn collect_all(&self, node_idx: usize, results: &mut Vec<EntryKey>, depth: u32) {
        let node = &self.nodes[node_idx];
        results.extend_from_slice(&node.entries);

        if depth < self.max_depth && node.first_child != 0 {
            for octant in 0..8u8 {
                let child_idx = node.first_child
                    + self.subtree_offset(octant, self.max_depth - depth - 1);
                self.collect_all(child_idx, results, depth + 1);
            }
        }
    }
}

impl SpatialBackend for OctreeBackend {
    fn insert_all(&mut self, entries: &[(EntryKey, AABB)]) {
        let Some(batch_extent) = entries
            .iter()
            .map(|(_, aabb)| *aabb)
            .reduce(|acc, aabb| acc.union(&aabb))
        else {
            return;
        };

        let root = self.nodes[ROOT].aabb;
        if self.locations.is_empty() || !root.contains(&batch_extent) {
            // Refit: one reallocation and re-placement for the whole batch
            let existing: Vec<(EntryKey, AABB)> = self
                .locations
                .iter()
                .map(|(key, (_, aabb))| (*key, *aabb))
                .collect();
            let extent = existing
                .iter()
                .fold(batch_extent, |acc, (_, aabb)| acc.union(aabb));

            self.locations.clear();
            self.rebuild_nodes(&extent.padded(self.padding, MIN_PADDING));
            for (key, aabb) in &existing {
                self.place(*key, aabb);
            }
        }

        for (key, aabb) in entries {
            self.place(*key, aabb);
        }
    }

    fn remove(&mut self, key: EntryKey) {
        if let Some((node_idx, _)) = self.locations.remove(&key) {
            let entries = &mut self.nodes[node_idx].entries;
            if let Some(pos) = entries.iter().position(|&k| k == key) {
                entries.swap_remove(pos);
            }
        }
    }

    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<EntryKey>) {
        if self.locations.is_empty() {
            return;
        }
        let root_class = frustum.classify_aabb(&self.nodes[ROOT].aabb);
        self.query_recursive(ROOT, frustum, root_class, results, 0);
    }

    fn clear(&mut self) {
        for node in &mut self.nodes {
            node.entries.clear();
        }
        self.locations.clear();
    }

    fn len(&self) -> usize {
        self.locations.len()
    }
}
