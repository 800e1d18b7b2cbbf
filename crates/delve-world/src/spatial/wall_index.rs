//! Static broad-phase index over the walls of loaded chunks.
//!
//! Walls never move once generated, so the index is only rebuilt per chunk:
//! a chunk's walls are added when it loads and dropped when it unloads.
//! Hooking the index up as a [`ChunkObserver`] keeps it in step with the
//! chunk manager.

use ahash::{AHashMap, AHashSet};
use delve_common::{pack_cell_key, unpack_cell_key, CellPos, CellRect, ChunkCoord};

use crate::chunk::{Chunk, WallFeature};
use crate::streaming::ChunkObserver;

/// Position of a wall inside the per-chunk wall lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct WallRef {
    chunk: ChunkCoord,
    index: u32,
}

/// Bucketed wall lookup for collision and line-of-sight queries.
#[derive(Debug, Clone)]
pub struct WallIndex {
    /// Bucket edge length in cells
    bucket_size: u32,
    chunks: AHashMap<ChunkCoord, Vec<WallFeature>>,
    buckets: AHashMap<u64, Vec<WallRef>>,
    results: Vec<WallFeature>,
    seen: AHashSet<WallRef>,
}

impl WallIndex {
    /// Creates an empty index with square buckets of `bucket_size` cells.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    #[must_use]
    pub fn new(bucket_size: u32) -> Self {
        assert!(bucket_size > 0, "bucket_size must be non-zero");
        Self {
            bucket_size,
            chunks: AHashMap::new(),
            buckets: AHashMap::new(),
            results: Vec::new(),
            seen: AHashSet::new(),
        }
    }

    /// Number of indexed chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of indexed walls.
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.chunks.values().map(Vec::len).sum()
    }

    /// Checks whether a chunk's walls are indexed.
    #[must_use]
    pub fn contains_chunk(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Inclusive bucket range covered by a non-empty rectangle.
    fn bucket_range(&self, rect: &CellRect) -> (i32, i32, i32, i32) {
        let size = self.bucket_size as i32;
        (
            rect.x.div_euclid(size),
            rect.y.div_euclid(size),
            (rect.right() - 1).div_euclid(size),
            (rect.bottom() - 1).div_euclid(size),
        )
    }

    /// Indexes every wall of a chunk, replacing any previous entry for it.
    pub fn add_chunk(&mut self, chunk: &Chunk) {
        let coord = chunk.coord();
        self.remove_chunk(coord);

        let walls = chunk.walls().to_vec();
        for (index, wall) in walls.iter().enumerate() {
            if wall.rect.is_empty() {
                continue;
            }
            let wall_ref = WallRef {
                chunk: coord,
                index: index as u32,
            };
            let (x0, y0, x1, y1) = self.bucket_range(&wall.rect);
            for by in y0..=y1 {
                for bx in x0..=x1 {
                    self.buckets
                        .entry(pack_cell_key(bx, by))
                        .or_default()
                        .push(wall_ref);
                }
            }
        }
        self.chunks.insert(coord, walls);
    }

    /// Drops a chunk's walls. Returns false if the chunk was not indexed.
    pub fn remove_chunk(&mut self, coord: ChunkCoord) -> bool {
        let Some(walls) = self.chunks.remove(&coord) else {
            return false;
        };
        for wall in walls.iter().filter(|w| !w.rect.is_empty()) {
            let (x0, y0, x1, y1) = self.bucket_range(&wall.rect);
            for by in y0..=y1 {
                for bx in x0..=x1 {
                    let key = pack_cell_key(bx, by);
                    if let Some(bucket) = self.buckets.get_mut(&key) {
                        bucket.retain(|r| r.chunk != coord);
                        if bucket.is_empty() {
                            self.buckets.remove(&key);
                        }
                    }
                }
            }
        }
        true
    }

    /// Walls sharing at least one cell with `area`.
    ///
    /// The slice borrows a buffer reused by the next query.
    pub fn query_rect(&mut self, area: CellRect) -> &[WallFeature] {
        self.results.clear();
        self.seen.clear();
        if area.is_empty() {
            return &self.results;
        }

        let (x0, y0, x1, y1) = self.bucket_range(&area);
        let span = (i64::from(x1) - i64::from(x0) + 1)
            .saturating_mul(i64::from(y1) - i64::from(y0) + 1);

        let chunks = &self.chunks;
        let results = &mut self.results;
        let seen = &mut self.seen;
        let mut scan = |bucket: &Vec<WallRef>| {
            for &wall_ref in bucket {
                if !seen.insert(wall_ref) {
                    continue;
                }
                let wall = chunks
                    .get(&wall_ref.chunk)
                    .and_then(|walls| walls.get(wall_ref.index as usize));
                if let Some(wall) = wall.filter(|w| w.rect.intersects(&area)) {
                    results.push(*wall);
                }
            }
        };

        if span > self.buckets.len() as i64 {
            for (&key, bucket) in &self.buckets {
                let (bx, by) = unpack_cell_key(key);
                if (x0..=x1).contains(&bx) && (y0..=y1).contains(&by) {
                    scan(bucket);
                }
            }
        } else {
            for by in y0..=y1 {
                for bx in x0..=x1 {
                    if let Some(bucket) = self.buckets.get(&pack_cell_key(bx, by)) {
                        scan(bucket);
                    }
                }
            }
        }
        &self.results
    }

    /// Returns true if any indexed wall covers the cell.
    #[must_use]
    pub fn is_blocked(&self, cell: CellPos) -> bool {
        let size = self.bucket_size as i32;
        let key = pack_cell_key(cell.x.div_euclid(size), cell.y.div_euclid(size));
        self.buckets.get(&key).is_some_and(|bucket| {
            bucket.iter().any(|r| {
                self.chunks
                    .get(&r.chunk)
                    .and_then(|walls| walls.get(r.index as usize))
                    .is_some_and(|w| w.rect.contains_cell(cell))
            })
        })
    }

    /// Removes every chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.buckets.clear();
        self.results.clear();
        self.seen.clear();
    }
}

impl ChunkObserver for WallIndex {
    fn on_chunk_loaded(&mut self, chunk: &Chunk) {
        self.add_chunk(chunk);
    }

    fn on_chunk_unloaded(&mut self, chunk: &Chunk) {
        self.remove_chunk(chunk.coord());
    }
}
