/// GridHashBackend: loose uniform grid backing the scene index.
///
/// Each entry is assigned to the single cell containing its AABB center.
/// A cell's bounds are the loose union of its entries' AABBs, so an entry
/// larger than a cell is still found through its home cell.
///
/// Bulk load computes one packed cell key per entry, radix-sorts the
/// `(cell, entry)` pairs and stores the entries as contiguous runs in a
/// flat array. Removal leaves a tombstone until the next bulk load.

use glam::{UVec3, Vec3};
use rdst::{RadixKey, RadixSort};
use rustc_hash::FxHashMap;
use crate::bounds::AABB;
use crate::camera::{Frustum, FrustumTest};
use super::scene_spatial_index::{EntryKey, SpatialBackend};

/// Bits per axis in a packed cell key.
const AXIS_BITS: u32 = 21;

/// Smallest cell edge, in world units.
const MIN_CELL_SIZE: f32 = 1e-3;

/// Radix sort item: packed cell key plus position in the staging array.
#[derive(Debug, Clone, Copy)]
struct CellItem {
    cell: u64,
    slot: u32,
}

impl RadixKey for CellItem {
    const LEVELS: usize = 8;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        (self.cell >> (level * 8)) as u8
    }
}

/// One stored entry. `alive` is cleared on removal.
#[derive(Debug, Clone, Copy)]
struct GridEntry {
    key: EntryKey,
    aabb: AABB,
    alive: bool,
}

/// Contiguous run of entries sharing one cell.
#[derive(Debug, Clone, Copy)]
struct CellRun {
    cell: u64,
    start: usize,
    end: usize,
    /// Union of the run's entry AABBs
    loose: AABB,
}

/// Loose uniform grid.
pub struct GridHashBackend {
    /// Resolution along the longest axis of the extent
    cells_per_axis: u32,
    /// Relative padding around the entry extent
    padding: f32,
    /// Grid origin (min corner of the padded extent)
    origin: Vec3,
    /// Cubic cell edge length
    cell_size: f32,
    /// Entries sorted by cell
    entries: Vec<GridEntry>,
    /// One run per occupied cell, sorted by cell key
    cells: Vec<CellRun>,
    /// Entry key → position in `entries`
    locations: FxHashMap<EntryKey, usize>,
}

impl GridHashBackend {
    pub fn new(cells_per_axis: u32, padding: f32) -> Self {
        Self {
            cells_per_axis: cells_per_axis.clamp(1, 1 << AXIS_BITS),
            padding,
            origin: Vec3::ZERO,
            cell_size: 1.0,
            entries: Vec::new(),
            cells: Vec::new(),
            locations: FxHashMap::default(),
        }
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Integer cell coordinates of a point, clamped to the grid.
    fn cell_coords(&self, point: Vec3) -> UVec3 {
        let max = (self.cells_per_axis - 1) as f32;
        let rel = ((point - self.origin) / self.cell_size).floor();
        UVec3::new(
            rel.x.clamp(0.0, max) as u32,
            rel.y.clamp(0.0, max) as u32,
            rel.z.clamp(0.0, max) as u32,
        )
    }

    /// Pack cell coordinates into one sortable key (21 bits per axis).
    fn pack(coords: UVec3) -> u64 {
        (coords.x as u64) | ((coords.y as u64) << AXIS_BITS) | ((coords.z as u64) << (2 * AXIS_BITS))
    }

    /// Fit the grid to an extent: cubic cells, `cells_per_axis` along the
    /// longest axis.
    fn fit(&mut self, extent: &AABB) {
        let padded = extent.padded(self.padding, MIN_CELL_SIZE);
        self.origin = padded.min;
        self.cell_size = (padded.size().max_element() / self.cells_per_axis as f32).max(MIN_CELL_SIZE);
    }

    /// Rebuild the whole grid from a list of live entries.
    fn rebuild(&mut self, staging: Vec<(EntryKey, AABB)>) {
        self.entries.clear();
        self.cells.clear();
        self.locations.clear();

        let Some(extent) = staging
            .iter()
            .map(|(_, aabb)| *aabb)
            .reduce(|acc, aabb| acc.union(&aabb))
        else {
            return;
        };
        self.fit(&extent);

        let mut items: Vec<CellItem> = staging
            .iter()
            .enumerate()
            .map(|(slot, (_, aabb))| CellItem {
                cell: Self::pack(self.cell_coords(aabb.center())),
                slot: slot as u32,
            })
            .collect();
        items.radix_sort_unstable();

        self.entries.reserve(items.len());
        for item in &items {
            let (key, aabb) = staging[item.slot as usize];
            let index = self.entries.len();

            match self.cells.last_mut() {
                Some(run) if run.cell == item.cell => {
                    run.end = index + 1;
                    run.loose = run.loose.union(&aabb);
                }
                _ => self.cells.push(CellRun {
                    cell: item.cell,
                    start: index,
                    end: index + 1,
                    loose: aabb,
                }),
            }

            self.entries.push(GridEntry { key, aabb, alive: true });
            self.locations.insert(key, index);
        }
    }
}

impl SpatialBackend for GridHashBackend {
    fn insert_all(&mut self, entries: &[(EntryKey, AABB)]) {
        if entries.is_empty() {
            return;
        }

        let mut staging: Vec<(EntryKey, AABB)> = self
            .entries
            .iter()
            .filter(|e| e.alive)
            .map(|e| (e.key, e.aabb))
            .collect();
        staging.extend_from_slice(entries);
        self.rebuild(staging);
    }

    fn remove(&mut self, key: EntryKey) {
        if let Some(index) = self.locations.remove(&key) {
            self.entries[index].alive = false;
        }
    }

    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<EntryKey>) {
        for run in &self.cells {
            let live = self.entries[run.start..run.end].iter().filter(|e| e.alive);
            match frustum.classify_aabb(&run.loose) {
                FrustumTest::Outside => {}
                FrustumTest::Inside => results.extend(live.map(|e| e.key)),
                FrustumTest::Partial => results.extend(
                    live.filter(|e| frustum.intersects_aabb(&e.aabb)).map(|e| e.key),
                ),
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
        self.locations.clear();
    }

    fn len(&self) -> usize {
        self.locations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use slotmap::SlotMap;

    fn make_keys(count: usize) -> Vec<EntryKey> {
        let mut sm = SlotMap::<EntryKey, ()>::with_key();
        (0..count).map(|_| sm.insert(())).collect()
    }

    fn forward_frustum() -> Frustum {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1.0, 0.1, 50.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
        Frustum::from_view_projection(&(proj * view))
    }

    fn cube(center: Vec3) -> AABB {
        AABB::from_center_half_extent(center, Vec3::splat(0.5))
    }

    #[test]
    fn test_pack_keeps_axes_apart() {
        let a = GridHashBackend::pack(UVec3::new(1, 0, 0));
        let b = GridHashBackend::pack(UVec3::new(0, 1, 0));
        let c = GridHashBackend::pack(UVec3::new(0, 0, 1));

        assert_eq!(a, 1);
        assert_eq!(b, 1 << 21);
        assert_eq!(c, 1 << 42);
    }

    #[test]
    fn test_radix_sort_groups_cells_into_runs() {
        let mut grid = GridHashBackend::new(4, 0.0);
        let keys = make_keys(4);
        grid.insert_all(&[
            (keys[0], cube(Vec3::new(0.0, 0.0, 0.0))),
            (keys[1], cube(Vec3::new(100.0, 0.0, 0.0))),
            (keys[2], cube(Vec3::new(0.2, 0.0, 0.0))),
            (keys[3], cube(Vec3::new(100.2, 0.0, 0.0))),
        ]);

        assert_eq!(grid.len(), 4);
        assert_eq!(grid.cell_count(), 2);
        for run in &grid.cells {
            assert_eq!(run.end - run.start, 2);
        }
        assert!(grid.cells.windows(2).all(|w| w[0].cell < w[1].cell));
    }

    #[test]
    fn test_query_culls_outside_entries() {
        let mut grid = GridHashBackend::new(8, 0.01);
        let keys = make_keys(2);
        grid.insert_all(&[
            (keys[0], cube(Vec3::new(0.0, 0.0, -9.0))),
            (keys[1], cube(Vec3::new(0.0, 0.0, 11.0))),
        ]);

        let mut results = Vec::new();
        grid.query_frustum(&forward_frustum(), &mut results);

        assert_eq!(results, vec![keys[0]]);
    }

    #[test]
    fn test_large_entry_found_through_loose_bounds() {
        let mut grid = GridHashBackend::new(16, 0.0);
        let keys = make_keys(2);
        grid.insert_all(&[
            // Huge slab centered far off-axis but reaching into the frustum
            (keys[0], AABB::new(Vec3::new(-1.0, -1.0, -30.0), Vec3::new(200.0, 1.0, -10.0))),
            (keys[1], cube(Vec3::new(300.0, 0.0, 300.0))),
        ]);

        let mut results = Vec::new();
        grid.query_frustum(&forward_frustum(), &mut results);

        assert!(results.contains(&keys[0]));
        assert!(!results.contains(&keys[1]));
    }

    #[test]
    fn test_remove_leaves_tombstone_until_rebuild() {
        let mut grid = GridHashBackend::new(8, 0.01);
        let keys = make_keys(3);
        grid.insert_all(&[
            (keys[0], cube(Vec3::new(0.0, 0.0, -5.0))),
            (keys[1], cube(Vec3::new(0.0, 0.0, -6.0))),
        ]);

        grid.remove(keys[0]);
        assert_eq!(grid.len(), 1);

        let mut results = Vec::new();
        grid.query_frustum(&forward_frustum(), &mut results);
        assert_eq!(results, vec![keys[1]]);

        // Next bulk load drops the tombstone
        grid.insert_all(&[(keys[2], cube(Vec3::new(0.0, 0.0, -7.0)))]);
        assert_eq!(grid.entries.len(), 2);
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_clear_removes_all() {
        let mut grid = GridHashBackend::new(8, 0.01);
        let keys = make_keys(1);
        grid.insert_all(&[(keys[0], cube(Vec3::new(0.0, 0.0, -5.0)))]);

        grid.clear();

        let mut results = Vec::new();
        grid.query_frustum(&forward_frustum(), &mut results);
        assert!(results.is_empty());
        assert_eq!(grid.len(), 0);
    }
}
