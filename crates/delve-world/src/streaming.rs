//! World streaming and chunk management.
//!
//! [`ChunkManager`] keeps the chunks within `active_radius` of a moving
//! reference point loaded, caches chunks that fall out of range for cheap
//! re-entry, and trims the cache in least-recently-used order. Loaded chunks
//! are never evicted, so the cache may run over `max_cached_chunks` while the
//! active neighborhood alone exceeds it.

use std::collections::BTreeSet;

use delve_common::{ChunkCoord, ConfigResult, WorldConfig, WorldLayout};
use glam::Vec2;
use tracing::{debug, info};

use crate::chunk::{Chunk, WallFeature};
use crate::generation::ChunkGenerator;
use crate::lru::LruCache;

/// Upper bound on cache slots reserved when a manager is created.
const MAX_INITIAL_CACHE_SLOTS: usize = 4096;

/// Cache slots to reserve up front: the bound, the active neighborhood with
/// room for as many cached neighbors, or a fixed ceiling, whichever is least.
fn initial_cache_slots(config: &WorldConfig) -> usize {
    let side = usize::try_from(config.active_radius)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(1);
    config
        .max_cached_chunks
        .min(side.saturating_mul(side).saturating_mul(2))
        .min(MAX_INITIAL_CACHE_SLOTS)
}

/// Receives chunk lifecycle notifications from the [`ChunkManager`].
///
/// Callbacks run synchronously while the manager is mutably borrowed.
pub trait ChunkObserver {
    /// A chunk entered the active radius.
    fn on_chunk_loaded(&mut self, _chunk: &Chunk) {}

    /// A chunk left the active radius. It stays cached until evicted.
    fn on_chunk_unloaded(&mut self, _chunk: &Chunk) {}

    /// An unloaded chunk was dropped from the cache.
    fn on_chunk_evicted(&mut self, _coord: ChunkCoord) {}
}

impl ChunkObserver for () {}

impl<T: ChunkObserver + ?Sized> ChunkObserver for &mut T {
    fn on_chunk_loaded(&mut self, chunk: &Chunk) {
        (**self).on_chunk_loaded(chunk);
    }

    fn on_chunk_unloaded(&mut self, chunk: &Chunk) {
        (**self).on_chunk_unloaded(chunk);
    }

    fn on_chunk_evicted(&mut self, coord: ChunkCoord) {
        (**self).on_chunk_evicted(coord);
    }
}

impl<A: ChunkObserver, B: ChunkObserver> ChunkObserver for (A, B) {
    fn on_chunk_loaded(&mut self, chunk: &Chunk) {
        self.0.on_chunk_loaded(chunk);
        self.1.on_chunk_loaded(chunk);
    }

    fn on_chunk_unloaded(&mut self, chunk: &Chunk) {
        self.0.on_chunk_unloaded(chunk);
        self.1.on_chunk_unloaded(chunk);
    }

    fn on_chunk_evicted(&mut self, coord: ChunkCoord) {
        self.0.on_chunk_evicted(coord);
        self.1.on_chunk_evicted(coord);
    }
}

/// Chunks whose state changed during one streaming update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamingDelta {
    /// Chunks that became loaded, in coordinate order
    pub loaded: Vec<ChunkCoord>,
    /// Chunks that stopped being loaded
    pub unloaded: Vec<ChunkCoord>,
    /// Chunks dropped from the cache, least recently used first
    pub evicted: Vec<ChunkCoord>,
}

impl StreamingDelta {
    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.unloaded.is_empty() && self.evicted.is_empty()
    }
}

/// Lifetime counters for a [`ChunkManager`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamingStats {
    /// Chunks produced by the generator
    pub chunks_generated: u64,
    /// Needed chunks found already cached
    pub cache_hits: u64,
    /// Chunks evicted from the cache
    pub chunks_evicted: u64,
    /// Cached-to-loaded transitions
    pub loads: u64,
    /// Loaded-to-cached transitions
    pub unloads: u64,
}

/// Manages chunk generation, caching, eviction and the active set.
#[derive(Debug)]
pub struct ChunkManager {
    /// Configuration
    config: WorldConfig,
    /// Chunk generator
    generator: ChunkGenerator,
    /// Generated chunks in recency order
    cache: LruCache<ChunkCoord, Chunk>,
    /// Chunks inside the active radius
    loaded: BTreeSet<ChunkCoord>,
    /// Chunk holding the last reference position
    reference: Option<ChunkCoord>,
    /// Monotonic access counter
    tick: u64,
    stats: StreamingStats,
}

impl ChunkManager {
    /// Creates a chunk manager from a validated configuration.
    pub fn new(config: WorldConfig) -> ConfigResult<Self> {
        config.validate()?;
        let layout = config.layout()?;
        let generator = ChunkGenerator::new(layout, config.generation.clone());
        info!(
            "Chunk manager ready: {}x{} cells, {}x{} chunks, radius {}, cache bound {}",
            layout.width(),
            layout.height(),
            layout.chunks_wide(),
            layout.chunks_high(),
            config.active_radius,
            config.max_cached_chunks
        );
        Ok(Self {
            cache: LruCache::with_capacity(initial_cache_slots(&config)),
            config,
            generator,
            loaded: BTreeSet::new(),
            reference: None,
            tick: 0,
            stats: StreamingStats::default(),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Returns the world layout.
    #[must_use]
    pub const fn layout(&self) -> &WorldLayout {
        self.generator.layout()
    }

    /// Returns the chunk generator.
    #[must_use]
    pub const fn generator(&self) -> &ChunkGenerator {
        &self.generator
    }

    /// Returns the lifetime counters.
    #[must_use]
    pub const fn stats(&self) -> StreamingStats {
        self.stats
    }

    /// Recomputes the active set around a world-space reference position.
    pub fn update_active_chunks(&mut self, ref_x: f32, ref_y: f32) -> StreamingDelta {
        self.update_active_chunks_with(ref_x, ref_y, &mut ())
    }

    /// Recomputes the active set, notifying `observer` of every transition.
    ///
    /// All newly needed chunks are loaded before any unloads, and eviction
    /// runs last, so a chunk loaded in this pass is never evicted by it.
    pub fn update_active_chunks_with<O>(
        &mut self,
        ref_x: f32,
        ref_y: f32,
        observer: &mut O,
    ) -> StreamingDelta
    where
        O: ChunkObserver + ?Sized,
    {
        let center = self.layout().chunk_at_world(ref_x, ref_y);
        let needed: BTreeSet<ChunkCoord> = self
            .layout()
            .chunks_within(center, self.config.active_radius)
            .collect();
        self.reference = Some(center);
        self.tick += 1;
        let tick = self.tick;

        let mut delta = StreamingDelta::default();

        for &coord in &needed {
            self.ensure_cached(coord);
            let Some(chunk) = self.cache.get_mut(&coord) else {
                continue;
            };
            chunk.touch(tick);
            if !chunk.is_loaded() {
                chunk.set_loaded(true);
                observer.on_chunk_loaded(chunk);
                self.stats.loads += 1;
                delta.loaded.push(coord);
            }
        }

        for &coord in self.loaded.difference(&needed) {
            if let Some(chunk) = self.cache.peek_mut(&coord) {
                chunk.set_loaded(false);
                observer.on_chunk_unloaded(chunk);
            }
            self.stats.unloads += 1;
            delta.unloaded.push(coord);
        }
        self.loaded = needed;

        delta.evicted = self.evict(observer);

        if !delta.is_empty() {
            debug!(
                "Streaming around chunk {}: +{} loaded, -{} unloaded, {} evicted, {} cached",
                center,
                delta.loaded.len(),
                delta.unloaded.len(),
                delta.evicted.len(),
                self.cache.len()
            );
        }
        delta
    }

    /// Generates a chunk into the cache if it is not already there.
    fn ensure_cached(&mut self, coord: ChunkCoord) {
        if self.cache.contains(&coord) {
            self.stats.cache_hits += 1;
            return;
        }
        let content = self.generator.generate(coord, self.config.seed);
        self.cache.insert(coord, Chunk::new(content));
        self.stats.chunks_generated += 1;
    }

    /// Drops unloaded chunks, least recently used first, down to the bound.
    fn evict<O>(&mut self, observer: &mut O) -> Vec<ChunkCoord>
    where
        O: ChunkObserver + ?Sized,
    {
        let mut evicted = Vec::new();
        while self.cache.len() > self.config.max_cached_chunks {
            let Some((coord, _)) = self.cache.pop_oldest_where(|_, chunk| !chunk.is_loaded())
            else {
                debug!(
                    "Cache holds {} chunks over a bound of {}; all remaining chunks are loaded",
                    self.cache.len(),
                    self.config.max_cached_chunks
                );
                break;
            };
            observer.on_chunk_evicted(coord);
            self.stats.chunks_evicted += 1;
            evicted.push(coord);
        }
        evicted
    }

    /// Returns a cached chunk and marks it recently used.
    ///
    /// `None` if the chunk was never generated or has been evicted.
    pub fn get_chunk(&mut self, cx: i32, cy: i32) -> Option<&Chunk> {
        self.tick += 1;
        let tick = self.tick;
        let chunk = self.cache.get_mut(&ChunkCoord::new(cx, cy))?;
        chunk.touch(tick);
        Some(chunk)
    }

    /// Returns the cached chunk holding a world-space point.
    pub fn get_chunk_at_world(&mut self, x: f32, y: f32) -> Option<&Chunk> {
        let coord = self.layout().chunk_at_world(x, y);
        self.get_chunk(coord.x, coord.y)
    }

    /// Returns a cached chunk without changing its recency.
    #[must_use]
    pub fn peek_chunk(&self, cx: i32, cy: i32) -> Option<&Chunk> {
        self.cache.peek(&ChunkCoord::new(cx, cy))
    }

    /// Generates or touches a chunk in the cache without loading it.
    ///
    /// Eviction runs afterwards. Returns true if the chunk is cached when the
    /// call returns; out-of-bounds coordinates are never generated.
    pub fn prefetch(&mut self, cx: i32, cy: i32) -> bool {
        self.prefetch_with(cx, cy, &mut ())
    }

    /// [`Self::prefetch`] with eviction notifications.
    pub fn prefetch_with<O>(&mut self, cx: i32, cy: i32, observer: &mut O) -> bool
    where
        O: ChunkObserver + ?Sized,
    {
        let coord = ChunkCoord::new(cx, cy);
        if !self.layout().chunk_in_bounds(coord) {
            return false;
        }
        self.ensure_cached(coord);
        self.tick += 1;
        let tick = self.tick;
        if let Some(chunk) = self.cache.get_mut(&coord) {
            chunk.touch(tick);
        }
        self.evict(observer);
        self.cache.contains(&coord)
    }

    /// Returns true if the chunk is inside the active radius.
    #[must_use]
    pub fn is_chunk_loaded(&self, cx: i32, cy: i32) -> bool {
        self.loaded.contains(&ChunkCoord::new(cx, cy))
    }

    /// Loaded chunks in coordinate order.
    pub fn loaded_chunks(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.loaded.iter().filter_map(|coord| self.cache.peek(coord))
    }

    /// Walls of every loaded chunk.
    pub fn loaded_walls(&self) -> impl Iterator<Item = &WallFeature> + '_ {
        self.loaded_chunks().flat_map(Chunk::walls)
    }

    /// Coordinates of loaded chunks in coordinate order.
    pub fn loaded_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.loaded.iter().copied()
    }

    /// Cached coordinates from least to most recently used.
    #[must_use]
    pub fn cached_coords(&self) -> Vec<ChunkCoord> {
        self.cache.keys_oldest_first()
    }

    /// Number of cached chunks, loaded or not.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Number of loaded chunks.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Chunk at the middle of the world, where the player starts.
    #[must_use]
    pub const fn center_chunk_coord(&self) -> ChunkCoord {
        self.layout().center_chunk()
    }

    /// World-space spawn point at the center of [`Self::center_chunk_coord`].
    #[must_use]
    pub fn spawn_point(&self) -> Vec2 {
        self.layout().spawn_point()
    }

    /// Chunk that held the reference position at the last update.
    #[must_use]
    pub const fn reference_chunk(&self) -> Option<ChunkCoord> {
        self.reference
    }

    /// Returns the world seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Unloads every loaded chunk through `observer`, then empties the cache.
    pub fn clear_with<O>(&mut self, observer: &mut O)
    where
        O: ChunkObserver + ?Sized,
    {
        for coord in std::mem::take(&mut self.loaded) {
            if let Some(chunk) = self.cache.peek_mut(&coord) {
                chunk.set_loaded(false);
                observer.on_chunk_unloaded(chunk);
                self.stats.unloads += 1;
            }
        }
        self.cache.clear();
        self.reference = None;
    }

    /// Drops all chunks so the next update regenerates them. The seed is kept.
    pub fn regenerate_all(&mut self) {
        let cached = self.cache.len();
        self.clear_with(&mut ());
        info!("Dropped {cached} cached chunks for regeneration");
    }

    /// Releases every chunk.
    pub fn dispose(&mut self) {
        self.clear_with(&mut ());
        info!("Chunk manager disposed");
    }

    /// Switches to a new world seed and drops all chunks generated with the old one.
    pub fn set_seed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.clear_with(&mut ());
        info!("World seed set to {seed}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(radius: u32, max_cached: usize) -> ChunkManager {
        let config = WorldConfig {
            world_width: 64,
            world_height: 64,
            chunk_size: 16,
            active_radius: radius,
            max_cached_chunks: max_cached,
            seed: 42,
            ..WorldConfig::default()
        };
        ChunkManager::new(config).expect("valid config")
    }

    fn coords(pairs: &[(i32, i32)]) -> Vec<ChunkCoord> {
        pairs.iter().map(|&(x, y)| ChunkCoord::new(x, y)).collect()
    }

    #[derive(Default)]
    struct Recorder {
        loaded: Vec<ChunkCoord>,
        unloaded: Vec<ChunkCoord>,
        evicted: Vec<ChunkCoord>,
    }

    impl ChunkObserver for Recorder {
        fn on_chunk_loaded(&mut self, chunk: &Chunk) {
            assert!(chunk.is_loaded());
            self.loaded.push(chunk.coord());
        }

        fn on_chunk_unloaded(&mut self, chunk: &Chunk) {
            assert!(!chunk.is_loaded());
            self.unloaded.push(chunk.coord());
        }

        fn on_chunk_evicted(&mut self, coord: ChunkCoord) {
            self.evicted.push(coord);
        }
    }

    #[test]
    fn test_center_scenario_loads_three_by_three() {
        let mut manager = manager(1, 64);
        let delta = manager.update_active_chunks(32.0, 32.0);

        assert_eq!(manager.reference_chunk(), Some(ChunkCoord::new(2, 2)));
        assert_eq!(manager.loaded_count(), 9);
        for cy in 1..=3 {
            for cx in 1..=3 {
                assert!(manager.is_chunk_loaded(cx, cy), "({cx}, {cy}) not loaded");
            }
        }
        assert!(!manager.is_chunk_loaded(0, 0));
        assert_eq!(delta.loaded.len(), 9);
        assert!(delta.unloaded.is_empty());
        assert_eq!(manager.stats().chunks_generated, 9);
    }

    #[test]
    fn test_corner_clips_to_world() {
        let mut manager = manager(1, 64);
        manager.update_active_chunks(1.0, 1.0);
        assert_eq!(
            manager.loaded_coords().collect::<Vec<_>>(),
            coords(&[(0, 0), (0, 1), (1, 0), (1, 1)])
        );
        assert!(manager.peek_chunk(-1, 0).is_none());
    }

    #[test]
    fn test_reference_outside_world_unloads_everything() {
        let mut manager = manager(1, 64);
        manager.update_active_chunks(32.0, 32.0);
        let delta = manager.update_active_chunks(-500.0, 32.0);
        assert_eq!(delta.unloaded.len(), 9);
        assert_eq!(manager.loaded_count(), 0);
        // Chunks stay cached for re-entry.
        assert_eq!(manager.cached_count(), 9);
    }

    #[test]
    fn test_moving_loads_before_unloading() {
        let mut manager = manager(0, 64);
        let mut recorder = Recorder::default();
        manager.update_active_chunks_with(8.0, 8.0, &mut recorder);
        let delta = manager.update_active_chunks_with(24.0, 8.0, &mut recorder);

        assert_eq!(delta.loaded, coords(&[(1, 0)]));
        assert_eq!(delta.unloaded, coords(&[(0, 0)]));
        assert_eq!(recorder.loaded, coords(&[(0, 0), (1, 0)]));
        assert_eq!(recorder.unloaded, coords(&[(0, 0)]));

        let old = manager.peek_chunk(0, 0).expect("still cached");
        assert!(!old.is_loaded());
    }

    #[test]
    fn test_reentry_hits_cache() {
        let mut manager = manager(0, 64);
        manager.update_active_chunks(8.0, 8.0);
        let original = manager.peek_chunk(0, 0).expect("cached").content().clone();
        manager.update_active_chunks(24.0, 8.0);
        manager.update_active_chunks(8.0, 8.0);

        let stats = manager.stats();
        assert_eq!(stats.chunks_generated, 2);
        assert!(stats.cache_hits >= 1);
        assert_eq!(stats.loads, 3);
        assert_eq!(stats.unloads, 2);
        assert_eq!(manager.peek_chunk(0, 0).expect("cached").content(), &original);
    }

    #[test]
    fn test_lru_scenario_with_prefetch() {
        let mut manager = manager(0, 4);
        let touched = coords(&[(0, 0), (1, 0), (2, 0), (3, 0), (0, 1)]);
        for coord in &touched {
            assert!(manager.prefetch(coord.x, coord.y));
        }
        assert_eq!(manager.cached_coords(), touched[1..].to_vec());
        assert_eq!(manager.stats().chunks_evicted, 1);
        assert!(manager.peek_chunk(0, 0).is_none());
    }

    #[test]
    fn test_lru_scenario_with_movement() {
        let mut manager = manager(0, 4);
        let mut recorder = Recorder::default();
        for cx in 0..4 {
            manager.update_active_chunks_with(cx as f32 * 16.0 + 8.0, 8.0, &mut recorder);
        }
        manager.update_active_chunks_with(8.0, 24.0, &mut recorder);

        // A (0,0) is the least recently used unloaded chunk.
        assert_eq!(recorder.evicted, coords(&[(0, 0)]));
        let mut cached = manager.cached_coords();
        cached.sort();
        let mut expected = coords(&[(1, 0), (2, 0), (3, 0), (0, 1)]);
        expected.sort();
        assert_eq!(cached, expected);
    }

    #[test]
    fn test_get_chunk_bumps_recency() {
        let mut manager = manager(0, 3);
        for cx in 0..3 {
            manager.prefetch(cx, 0);
        }
        assert!(manager.get_chunk(0, 0).is_some());
        manager.prefetch(3, 0);
        assert_eq!(manager.cached_coords(), coords(&[(2, 0), (0, 0), (3, 0)]));

        // Peeking leaves recency alone.
        assert!(manager.peek_chunk(2, 0).is_some());
        manager.prefetch(0, 1);
        assert!(manager.peek_chunk(2, 0).is_none());
    }

    #[test]
    fn test_loaded_chunks_never_evicted() {
        let mut manager = manager(1, 2);
        let delta = manager.update_active_chunks(32.0, 32.0);
        assert!(delta.evicted.is_empty());
        // Nine loaded chunks over a bound of two.
        assert_eq!(manager.cached_count(), 9);
        assert!(manager.loaded_chunks().all(Chunk::is_loaded));

        let delta = manager.update_active_chunks(56.0, 56.0);
        assert!(delta.evicted.iter().all(|c| !manager.is_chunk_loaded(c.x, c.y)));
        assert_eq!(manager.cached_count(), manager.loaded_count().max(2));
    }

    #[test]
    fn test_absent_chunk_lookups() {
        let mut manager = manager(1, 64);
        assert!(manager.get_chunk(0, 0).is_none());
        assert!(manager.get_chunk(99, 99).is_none());
        assert!(manager.get_chunk_at_world(-3.0, 5.0).is_none());
        assert!(!manager.prefetch(-1, 0));
        assert!(!manager.prefetch(4, 0));
        assert_eq!(manager.cached_count(), 0);

        manager.update_active_chunks(32.0, 32.0);
        let chunk = manager.get_chunk_at_world(20.0, 40.0).expect("loaded");
        assert_eq!(chunk.coord(), ChunkCoord::new(1, 2));
    }

    #[test]
    fn test_loaded_walls_cover_loaded_chunks() {
        let mut manager = manager(1, 64);
        manager.update_active_chunks(8.0, 8.0);
        let expected: usize = manager.loaded_chunks().map(|c| c.walls().len()).sum();
        assert_eq!(manager.loaded_walls().count(), expected);
        // Corner chunk carries border walls.
        assert!(manager.loaded_walls().any(|w| w.is_border));
    }

    #[test]
    fn test_clear_notifies_and_keeps_seed() {
        let mut manager = manager(1, 64);
        let mut recorder = Recorder::default();
        manager.update_active_chunks_with(32.0, 32.0, &mut recorder);
        manager.clear_with(&mut recorder);
        assert_eq!(recorder.unloaded.len(), 9);
        assert_eq!(manager.cached_count(), 0);
        assert_eq!(manager.loaded_count(), 0);
        assert_eq!(manager.reference_chunk(), None);
        assert_eq!(manager.seed(), 42);

        manager.update_active_chunks(32.0, 32.0);
        manager.regenerate_all();
        assert_eq!(manager.cached_count(), 0);
        manager.dispose();
        assert_eq!(manager.loaded_count(), 0);
    }

    #[test]
    fn test_set_seed_regenerates() {
        let mut manager = manager(0, 64);
        manager.update_active_chunks(8.0, 8.0);
        let before = manager.peek_chunk(0, 0).expect("cached").content().clone();

        manager.set_seed(43);
        assert_eq!(manager.cached_count(), 0);
        manager.update_active_chunks(8.0, 8.0);
        let after = manager.peek_chunk(0, 0).expect("cached").content().clone();
        assert_eq!(
            after,
            manager.generator().generate(ChunkCoord::new(0, 0), 43)
        );
        assert_eq!(
            before,
            manager.generator().generate(ChunkCoord::new(0, 0), 42)
        );
    }

    #[test]
    fn test_observer_pair_and_center() {
        let mut manager = manager(0, 64);
        let mut pair = (Recorder::default(), Recorder::default());
        manager.update_active_chunks_with(8.0, 8.0, &mut pair);
        assert_eq!(pair.0.loaded, pair.1.loaded);
        assert_eq!(manager.center_chunk_coord(), ChunkCoord::new(2, 2));
        assert_eq!(manager.spawn_point(), Vec2::new(40.0, 40.0));
    }

    #[test]
    fn test_huge_cache_bound_reserves_lazily() {
        let mut manager = manager(1, 1 << 40);
        let delta = manager.update_active_chunks(32.0, 32.0);
        assert_eq!(delta.loaded.len(), 9);
        assert_eq!(manager.cached_count(), 9);
        assert!(delta.evicted.is_empty());

        let config = WorldConfig {
            max_cached_chunks: usize::MAX,
            active_radius: u32::MAX,
            ..WorldConfig::default()
        };
        assert_eq!(initial_cache_slots(&config), MAX_INITIAL_CACHE_SLOTS);
        assert_eq!(
            initial_cache_slots(&WorldConfig {
                active_radius: 1,
                max_cached_chunks: 1 << 40,
                ..WorldConfig::default()
            }),
            18
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = WorldConfig {
            world_width: 50,
            ..WorldConfig::default()
        };
        assert!(ChunkManager::new(config).is_err());
    }
}
