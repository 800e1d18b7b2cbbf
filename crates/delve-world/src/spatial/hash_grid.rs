//! Uniform hash grid over movable entity handles.

use std::hash::Hash;

use ahash::AHashMap;
use delve_common::{pack_cell_key, unpack_cell_key};
use glam::Vec2;

/// Where a tracked handle currently lives.
#[derive(Debug, Clone, Copy)]
struct GridEntry {
    cell: u64,
    position: Vec2,
}

/// Hash grid mapping entity handles to square cells of `cell_size` world units.
///
/// The grid owns only the position-to-cell mapping; handles are opaque and
/// their lifetime belongs to whoever inserted them.
///
/// Query results are written into an internal buffer that is reused by the
/// next query, so the returned slice cannot be held across queries.
#[derive(Debug, Clone)]
pub struct SpatialHashGrid<K> {
    cell_size: f32,
    buckets: AHashMap<u64, Vec<K>>,
    entries: AHashMap<K, GridEntry>,
    results: Vec<K>,
}

impl<K> SpatialHashGrid<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty grid.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not a positive, finite number.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell_size must be positive and finite, got {cell_size}"
        );
        Self {
            cell_size,
            buckets: AHashMap::new(),
            entries: AHashMap::new(),
            results: Vec::new(),
        }
    }

    /// Edge length of a grid cell.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of tracked handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no handles are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Checks whether a handle is tracked.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    /// Last recorded position of a handle.
    #[must_use]
    pub fn position_of(&self, key: K) -> Option<Vec2> {
        self.entries.get(&key).map(|e| e.position)
    }

    fn cell_coords(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Packed cell key for a world position.
    #[must_use]
    pub fn cell_key(&self, x: f32, y: f32) -> u64 {
        let (cx, cy) = self.cell_coords(x, y);
        pack_cell_key(cx, cy)
    }

    /// Starts tracking a handle. Inserting a tracked handle moves it.
    pub fn insert(&mut self, key: K, x: f32, y: f32) {
        if self.entries.contains_key(&key) {
            self.update(key, x, y);
            return;
        }
        let cell = self.cell_key(x, y);
        self.buckets.entry(cell).or_default().push(key);
        self.entries.insert(
            key,
            GridEntry {
                cell,
                position: Vec2::new(x, y),
            },
        );
    }

    /// Moves a handle to a new position.
    ///
    /// Movement inside the current cell only refreshes the stored position.
    /// Untracked handles are inserted. Returns true if the handle changed cell.
    pub fn update(&mut self, key: K, x: f32, y: f32) -> bool {
        let cell = self.cell_key(x, y);
        let Some(entry) = self.entries.get_mut(&key) else {
            self.insert(key, x, y);
            return true;
        };
        entry.position = Vec2::new(x, y);
        if entry.cell == cell {
            return false;
        }
        let old_cell = std::mem::replace(&mut entry.cell, cell);
        Self::detach(&mut self.buckets, old_cell, key);
        self.buckets.entry(cell).or_default().push(key);
        true
    }

    /// Stops tracking a handle. Returns false if it was not tracked.
    pub fn remove(&mut self, key: K) -> bool {
        match self.entries.remove(&key) {
            Some(entry) => {
                Self::detach(&mut self.buckets, entry.cell, key);
                true
            },
            None => false,
        }
    }

    /// Removes every handle.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.entries.clear();
        self.results.clear();
    }

    fn detach(buckets: &mut AHashMap<u64, Vec<K>>, cell: u64, key: K) {
        if let Some(bucket) = buckets.get_mut(&cell) {
            if let Some(index) = bucket.iter().position(|&k| k == key) {
                bucket.swap_remove(index);
            }
            if bucket.is_empty() {
                buckets.remove(&cell);
            }
        }
    }

    /// Handles within `radius` of `(x, y)`, inclusive.
    pub fn query_radius(&mut self, x: f32, y: f32, radius: f32) -> &[K] {
        self.results.clear();
        if radius.is_nan() || radius < 0.0 {
            return &self.results;
        }
        let center = Vec2::new(x, y);
        let radius_sq = radius * radius;
        self.collect(x - radius, y - radius, x + radius, y + radius, |p| {
            p.distance_squared(center) <= radius_sq
        });
        &self.results
    }

    /// Handles inside the axis-aligned box `[min, max]`, inclusive.
    pub fn query_rect(&mut self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> &[K] {
        self.results.clear();
        let ordered = min_x <= max_x && min_y <= max_y;
        if !ordered {
            return &self.results;
        }
        self.collect(min_x, min_y, max_x, max_y, |p| {
            p.x >= min_x && p.x <= max_x && p.y >= min_y && p.y <= max_y
        });
        &self.results
    }

    /// Broad phase over the cells overlapping a box, then an exact filter.
    fn collect<F>(&mut self, min_x: f32, min_y: f32, max_x: f32, max_y: f32, accept: F)
    where
        F: Fn(Vec2) -> bool,
    {
        let (x0, y0) = self.cell_coords(min_x, min_y);
        let (x1, y1) = self.cell_coords(max_x, max_y);
        let span = (i64::from(x1) - i64::from(x0) + 1)
            .saturating_mul(i64::from(y1) - i64::from(y0) + 1);

        let entries = &self.entries;
        let results = &mut self.results;
        let mut scan = |bucket: &Vec<K>| {
            for key in bucket {
                if entries.get(key).is_some_and(|e| accept(e.position)) {
                    results.push(*key);
                }
            }
        };

        if span > self.buckets.len() as i64 {
            // Query covers more cells than are occupied: walk the buckets instead.
            for (&cell, bucket) in &self.buckets {
                let (cx, cy) = unpack_cell_key(cell);
                if (x0..=x1).contains(&cx) && (y0..=y1).contains(&cy) {
                    scan(bucket);
                }
            }
        } else {
            for cy in y0..=y1 {
                for cx in x0..=x1 {
                    if let Some(bucket) = self.buckets.get(&pack_cell_key(cx, cy)) {
                        scan(bucket);
                    }
                }
            }
        }
    }
}
