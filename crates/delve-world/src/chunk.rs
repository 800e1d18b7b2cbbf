//! Chunk data structure.
//!
//! A [`Chunk`] is the cached form of one generated grid cell of the world:
//! the immutable [`ChunkContent`] produced by the generator plus the load
//! flag and recency stamp maintained by the chunk manager.

use delve_common::{CellPos, CellRect, ChunkCoord};

use crate::generation::{EnemyKind, Theme};

/// A wall rectangle in world cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WallFeature {
    /// Cells covered by the wall
    pub rect: CellRect,
    /// How tall the wall is for collision purposes
    pub collision_height: u16,
    /// Whether the wall seals a world edge
    pub is_border: bool,
}

impl WallFeature {
    /// Creates a new wall.
    #[must_use]
    pub const fn new(rect: CellRect, collision_height: u16, is_border: bool) -> Self {
        Self {
            rect,
            collision_height,
            is_border,
        }
    }
}

/// An enemy spawn location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpawnPoint {
    /// Cell the enemy appears in
    pub cell: CellPos,
    /// Enemy to spawn
    pub kind: EnemyKind,
}

/// Requested versus placed feature counts for one generated chunk.
///
/// Placement is best-effort; a shortfall means the attempt budget ran out
/// before the target was met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationReport {
    /// Interior walls requested
    pub walls_requested: u32,
    /// Interior walls placed
    pub walls_placed: u32,
    /// Traps requested
    pub traps_requested: u32,
    /// Traps placed
    pub traps_placed: u32,
    /// Chests requested (derived from placed traps)
    pub chests_requested: u32,
    /// Chests placed
    pub chests_placed: u32,
    /// Spawn points requested
    pub spawns_requested: u32,
    /// Spawn points placed
    pub spawns_placed: u32,
    /// Placement attempts consumed across all features
    pub attempts: u32,
}

impl GenerationReport {
    /// Returns true if every requested feature was placed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.walls_placed == self.walls_requested
            && self.traps_placed == self.traps_requested
            && self.chests_placed == self.chests_requested
            && self.spawns_placed == self.spawns_requested
    }
}

/// Generated content of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkContent {
    /// Chunk coordinate
    pub coord: ChunkCoord,
    /// World cell at the chunk's top-left corner
    pub origin: CellPos,
    /// Zone tag derived from world position
    pub theme: Theme,
    /// Border and interior walls
    pub walls: Vec<WallFeature>,
    /// Trap cells
    pub traps: Vec<CellPos>,
    /// Chest cells
    pub chests: Vec<CellPos>,
    /// Enemy spawn points
    pub spawns: Vec<SpawnPoint>,
    /// Placement statistics
    pub report: GenerationReport,
}

/// Residency state of a cached chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Generated and cached, outside the active radius.
    Cached,
    /// Generated and inside the active radius.
    Loaded,
}

/// A generated chunk held by the chunk manager.
///
/// Holding a `Chunk` implies its content is generated; evicted chunks are
/// dropped outright.
#[derive(Debug, Clone)]
pub struct Chunk {
    content: ChunkContent,
    loaded: bool,
    last_access: u64,
}

impl Chunk {
    /// Wraps freshly generated content in an unloaded chunk.
    #[must_use]
    pub fn new(content: ChunkContent) -> Self {
        Self {
            content,
            loaded: false,
            last_access: 0,
        }
    }

    /// Returns the chunk coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.content.coord
    }

    /// Returns the world cell at the chunk's origin.
    #[must_use]
    pub const fn origin(&self) -> CellPos {
        self.content.origin
    }

    /// Returns the chunk's theme.
    #[must_use]
    pub const fn theme(&self) -> Theme {
        self.content.theme
    }

    /// Returns the walls.
    #[must_use]
    pub fn walls(&self) -> &[WallFeature] {
        &self.content.walls
    }

    /// Returns the trap cells.
    #[must_use]
    pub fn traps(&self) -> &[CellPos] {
        &self.content.traps
    }

    /// Returns the chest cells.
    #[must_use]
    pub fn chests(&self) -> &[CellPos] {
        &self.content.chests
    }

    /// Returns the enemy spawn points.
    #[must_use]
    pub fn spawns(&self) -> &[SpawnPoint] {
        &self.content.spawns
    }

    /// Returns placement statistics.
    #[must_use]
    pub const fn report(&self) -> &GenerationReport {
        &self.content.report
    }

    /// Returns the generated content.
    #[must_use]
    pub const fn content(&self) -> &ChunkContent {
        &self.content
    }

    /// Returns whether the chunk is inside the active radius.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns the residency state.
    #[must_use]
    pub const fn state(&self) -> ChunkState {
        if self.loaded {
            ChunkState::Loaded
        } else {
            ChunkState::Cached
        }
    }

    /// Manager tick of the most recent access.
    #[must_use]
    pub const fn last_access(&self) -> u64 {
        self.last_access
    }

    /// Checks whether any wall covers a world cell.
    #[must_use]
    pub fn is_cell_blocked(&self, cell: CellPos) -> bool {
        self.content.walls.iter().any(|w| w.rect.contains_cell(cell))
    }

    pub(crate) fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    pub(crate) fn touch(&mut self, tick: u64) {
        self.last_access = tick;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_content() -> ChunkContent {
        ChunkContent {
            coord: ChunkCoord::new(1, 2),
            origin: CellPos::new(16, 32),
            theme: Theme::Wilds,
            walls: vec![WallFeature::new(CellRect::new(18, 34, 2, 1), 2, false)],
            traps: vec![CellPos::new(20, 40)],
            chests: Vec::new(),
            spawns: Vec::new(),
            report: GenerationReport::default(),
        }
    }

    #[test]
    fn test_new_chunk_is_cached() {
        let chunk = Chunk::new(sample_content());
        assert_eq!(chunk.coord(), ChunkCoord::new(1, 2));
        assert_eq!(chunk.state(), ChunkState::Cached);
        assert!(!chunk.is_loaded());
        assert_eq!(chunk.last_access(), 0);
    }

    #[test]
    fn test_load_state_and_touch() {
        let mut chunk = Chunk::new(sample_content());
        chunk.set_loaded(true);
        chunk.touch(9);
        assert_eq!(chunk.state(), ChunkState::Loaded);
        assert_eq!(chunk.last_access(), 9);
    }

    #[test]
    fn test_cell_blocked() {
        let chunk = Chunk::new(sample_content());
        assert!(chunk.is_cell_blocked(CellPos::new(19, 34)));
        assert!(!chunk.is_cell_blocked(CellPos::new(20, 34)));
    }

    #[test]
    fn test_report_completeness() {
        let mut report = GenerationReport {
            walls_requested: 3,
            walls_placed: 3,
            ..GenerationReport::default()
        };
        assert!(report.is_complete());
        report.walls_placed = 2;
        assert!(!report.is_complete());
    }
}
