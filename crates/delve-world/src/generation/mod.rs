//! Deterministic procedural chunk generation.
//!
//! [`ChunkGenerator::generate`] is a pure function of the world seed and the
//! chunk coordinate. Every random draw comes from one RNG seeded with
//! [`chunk_seed`], so a chunk's content does not depend on which chunks were
//! generated before it or in which process.
//!
//! Generation runs in a fixed order: theme, border walls, interior walls,
//! traps, chests, enemy spawn points. Every placement loop has a bounded
//! attempt budget; when a target cannot be met the chunk simply ends up with
//! fewer features and the shortfall is recorded in its [`GenerationReport`].

mod occupancy;
mod spawn_table;
mod theme;

pub use occupancy::{CellKeySet, OccupancyGrid};
pub use spawn_table::{spawn_weights, EnemyKind};
pub use theme::Theme;

use delve_common::{CellPos, CellRect, ChunkCoord, GenerationParams, WorldLayout};
use glam::Vec2;
use tracing::{debug, trace};

use crate::chunk::{ChunkContent, GenerationReport, SpawnPoint, WallFeature};

/// Derives the chunk-local RNG seed.
///
/// `world_seed ^ (cx << 16) ^ cy`, with coordinates sign-extended to 64 bits.
#[must_use]
pub const fn chunk_seed(world_seed: u64, coord: ChunkCoord) -> u64 {
    world_seed ^ ((coord.x as i64 as u64) << 16) ^ (coord.y as i64 as u64)
}

/// Procedural chunk generator.
#[derive(Debug, Clone)]
pub struct ChunkGenerator {
    /// World geometry
    layout: WorldLayout,
    /// Feature targets
    params: GenerationParams,
}

impl ChunkGenerator {
    /// Creates a generator for a world layout.
    #[must_use]
    pub fn new(layout: WorldLayout, params: GenerationParams) -> Self {
        Self { layout, params }
    }

    /// Returns the world layout.
    #[must_use]
    pub const fn layout(&self) -> &WorldLayout {
        &self.layout
    }

    /// Returns the generation parameters.
    #[must_use]
    pub const fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Generates the content of a chunk.
    ///
    /// Coordinates outside the world still produce content (the manager never
    /// asks for them); border strips are only laid along real world edges.
    /// A chunk with any cell outside the `i32` cell range comes back empty.
    #[must_use]
    pub fn generate(&self, coord: ChunkCoord, world_seed: u64) -> ChunkContent {
        let Some(origin) = coord.checked_origin(self.layout.chunk_size()) else {
            debug!("Chunk {} lies outside the cell range; leaving it empty", coord);
            return self.unaddressable(coord);
        };
        let mut builder = ChunkBuilder::new(self, coord, origin, world_seed);
        builder.place_border_walls();
        builder.place_interior_walls();
        builder.place_traps();
        builder.place_chests();
        builder.place_spawns();
        let content = builder.finish();

        trace!(
            "Generated chunk {} ({}): {} walls, {} traps, {} chests, {} spawns",
            coord,
            content.theme,
            content.walls.len(),
            content.traps.len(),
            content.chests.len(),
            content.spawns.len()
        );
        if !content.report.is_complete() {
            debug!(
                "Chunk {} under-filled after {} attempts: {:?}",
                coord, content.report.attempts, content.report
            );
        }
        content
    }

    /// Featureless content for a chunk whose cells cannot be addressed.
    fn unaddressable(&self, coord: ChunkCoord) -> ChunkContent {
        let size = self.layout.chunk_size() as i32;
        ChunkContent {
            coord,
            origin: CellPos::new(coord.x.saturating_mul(size), coord.y.saturating_mul(size)),
            theme: Theme::for_chunk(&self.layout, coord),
            walls: Vec::new(),
            traps: Vec::new(),
            chests: Vec::new(),
            spawns: Vec::new(),
            report: GenerationReport {
                walls_requested: self.params.interior_walls_per_chunk,
                traps_requested: self.params.traps_per_chunk,
                spawns_requested: self.params.spawns_per_chunk,
                ..GenerationReport::default()
            },
        }
    }
}

/// Mutable state for generating a single chunk.
struct ChunkBuilder<'a> {
    params: &'a GenerationParams,
    layout: &'a WorldLayout,
    coord: ChunkCoord,
    origin: CellPos,
    size: u32,
    theme: Theme,
    spawn_point: Vec2,
    safe_radius: f32,
    rng: fastrand::Rng,
    occupancy: OccupancyGrid,
    used_cells: CellKeySet,
    walls: Vec<WallFeature>,
    traps: Vec<CellPos>,
    chests: Vec<CellPos>,
    spawns: Vec<SpawnPoint>,
    report: GenerationReport,
}

impl<'a> ChunkBuilder<'a> {
    fn new(
        generator: &'a ChunkGenerator,
        coord: ChunkCoord,
        origin: CellPos,
        world_seed: u64,
    ) -> Self {
        let layout = &generator.layout;
        let size = layout.chunk_size();
        Self {
            params: &generator.params,
            layout,
            coord,
            origin,
            size,
            theme: Theme::for_chunk(layout, coord),
            spawn_point: layout.spawn_point(),
            safe_radius: layout.safe_zone_radius(),
            rng: fastrand::Rng::with_seed(chunk_seed(world_seed, coord)),
            occupancy: OccupancyGrid::new(size),
            used_cells: CellKeySet::new(),
            walls: Vec::new(),
            traps: Vec::new(),
            chests: Vec::new(),
            spawns: Vec::new(),
            report: GenerationReport::default(),
        }
    }

    /// Converts a local rectangle to world cells.
    fn world_rect(&self, x: u32, y: u32, width: u32, height: u32) -> CellRect {
        CellRect::new(
            self.origin.x + x as i32,
            self.origin.y + y as i32,
            width,
            height,
        )
    }

    fn in_safe_zone(&self, rect: &CellRect) -> bool {
        rect.intersects_circle(self.spawn_point, self.safe_radius)
    }

    /// Lays strips along every world edge the chunk touches.
    ///
    /// Top and bottom strips span the full chunk width; side strips only
    /// cover the rows between them, so no two border walls share a cell.
    fn place_border_walls(&mut self) {
        let thickness = self.params.border_thickness.min(self.size);
        if thickness == 0 {
            return;
        }
        let edges = self.layout.chunk_edges(self.coord);
        let size = self.size;

        let middle_top = if edges.top { thickness } else { 0 };
        let bottom_start = if edges.bottom {
            (size - thickness).max(middle_top)
        } else {
            size
        };
        let right_start = if edges.left {
            (size - thickness).max(thickness)
        } else {
            size - thickness
        };

        let mut strips = Vec::with_capacity(4);
        if edges.top {
            strips.push((0, 0, size, thickness));
        }
        if edges.bottom && bottom_start < size {
            strips.push((0, bottom_start, size, size - bottom_start));
        }
        if bottom_start > middle_top {
            let rows = bottom_start - middle_top;
            if edges.left {
                strips.push((0, middle_top, thickness, rows));
            }
            if edges.right && right_start < size {
                strips.push((right_start, middle_top, size - right_start, rows));
            }
        }

        for (x, y, width, height) in strips {
            self.occupancy.mark(x, y, width, height);
            let rect = self.world_rect(x, y, width, height);
            self.walls.push(WallFeature::new(
                rect,
                self.params.border_collision_height,
                true,
            ));
        }
    }

    /// Scatters palette-sized wall blocks without overlap or safe-zone intrusion.
    fn place_interior_walls(&mut self) {
        let params = self.params;
        let target = params.interior_walls_per_chunk;
        let budget = target.saturating_mul(params.max_attempts_per_feature);
        let palette = &params.wall_palette;
        self.report.walls_requested = target;
        if palette.is_empty() {
            return;
        }
        // Drawn as u32 so the stream does not depend on the target's pointer width.
        let palette_len = u32::try_from(palette.len()).unwrap_or(u32::MAX);

        let mut attempts = 0;
        let mut placed = 0;
        while placed < target && attempts < budget {
            attempts += 1;
            let shape = palette[self.rng.u32(..palette_len) as usize];
            if shape.width == 0
                || shape.height == 0
                || shape.width > self.size
                || shape.height > self.size
            {
                continue;
            }
            let x = self.rng.u32(0..=self.size - shape.width);
            let y = self.rng.u32(0..=self.size - shape.height);

            if !self.occupancy.fits(x, y, shape.width, shape.height) {
                continue;
            }
            let rect = self.world_rect(x, y, shape.width, shape.height);
            if self.in_safe_zone(&rect) {
                continue;
            }

            self.occupancy.mark(x, y, shape.width, shape.height);
            self.walls.push(WallFeature::new(
                rect,
                params.interior_collision_height,
                false,
            ));
            placed += 1;
        }

        self.report.walls_placed = placed;
        self.report.attempts += attempts;
    }

    /// Samples up to `target` distinct free cells outside walls and the safe zone.
    fn sample_free_cells(&mut self, target: u32) -> Vec<CellPos> {
        let budget = target.saturating_mul(self.params.max_attempts_per_feature);
        let mut cells = Vec::new();
        let mut attempts = 0;

        while (cells.len() as u32) < target && attempts < budget {
            attempts += 1;
            let x = self.rng.u32(0..self.size);
            let y = self.rng.u32(0..self.size);
            let cell = CellPos::new(self.origin.x + x as i32, self.origin.y + y as i32);

            if self.used_cells.contains(cell) || self.occupancy.is_set(x, y) {
                continue;
            }
            if self.in_safe_zone(&CellRect::new(cell.x, cell.y, 1, 1)) {
                continue;
            }
            self.used_cells.insert(cell);
            cells.push(cell);
        }

        self.report.attempts += attempts;
        cells
    }

    fn place_traps(&mut self) {
        let target = self.params.traps_per_chunk;
        self.traps = self.sample_free_cells(target);
        self.report.traps_requested = target;
        self.report.traps_placed = self.traps.len() as u32;
    }

    /// Chest count follows the traps actually placed, not the trap target.
    fn place_chests(&mut self) {
        let ratio = self.params.trap_to_chest_ratio.max(1);
        let target = (self.traps.len() as u32 / ratio).min(self.params.max_chests_per_chunk);
        self.chests = self.sample_free_cells(target);
        self.report.chests_requested = target;
        self.report.chests_placed = self.chests.len() as u32;
    }

    fn place_spawns(&mut self) {
        let target = self.params.spawns_per_chunk;
        let cells = self.sample_free_cells(target);
        let theme = self.theme;
        self.spawns = cells
            .into_iter()
            .map(|cell| SpawnPoint {
                cell,
                kind: spawn_table::pick_enemy(theme, &mut self.rng),
            })
            .collect();
        self.report.spawns_requested = target;
        self.report.spawns_placed = self.spawns.len() as u32;
    }

    fn finish(self) -> ChunkContent {
        ChunkContent {
            coord: self.coord,
            origin: self.origin,
            theme: self.theme,
            walls: self.walls,
            traps: self.traps,
            chests: self.chests,
            spawns: self.spawns,
            report: self.report,
        }
    }
}
