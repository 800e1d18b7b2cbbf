//! Fixed world geometry: bounds, chunk grid, and the spawn safe zone.

use glam::Vec2;

use crate::coords::{CellPos, ChunkCoord};
use crate::error::{ConfigError, ConfigResult};

/// Which world edges a chunk touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkEdges {
    /// Chunk lies in the first chunk row
    pub top: bool,
    /// Chunk lies in the last chunk row
    pub bottom: bool,
    /// Chunk lies in the first chunk column
    pub left: bool,
    /// Chunk lies in the last chunk column
    pub right: bool,
}

impl ChunkEdges {
    /// Returns true if the chunk touches any world edge.
    #[must_use]
    pub const fn any(self) -> bool {
        self.top || self.bottom || self.left || self.right
    }
}

/// World dimensions partitioned into square chunks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldLayout {
    width: u32,
    height: u32,
    chunk_size: u32,
    safe_zone_radius: f32,
}

impl WorldLayout {
    /// Creates a layout, checking that the world is a whole number of chunks.
    pub fn new(width: u32, height: u32, chunk_size: u32, safe_zone_radius: f32) -> ConfigResult<Self> {
        for (field, value) in [
            ("world_width", width),
            ("world_height", height),
            ("chunk_size", chunk_size),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDimension { field });
            }
        }
        if width % chunk_size != 0 || height % chunk_size != 0 {
            return Err(ConfigError::ChunkSizeMismatch {
                width,
                height,
                chunk_size,
            });
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "world size {width}x{height} exceeds the signed cell range"
            )));
        }
        Ok(Self {
            width,
            height,
            chunk_size,
            safe_zone_radius,
        })
    }

    /// World width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// World height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Chunk edge length in cells.
    #[must_use]
    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Number of chunk columns.
    #[must_use]
    pub const fn chunks_wide(&self) -> u32 {
        self.width / self.chunk_size
    }

    /// Number of chunk rows.
    #[must_use]
    pub const fn chunks_high(&self) -> u32 {
        self.height / self.chunk_size
    }

    /// Returns true if the chunk lies inside the world.
    #[must_use]
    pub const fn chunk_in_bounds(&self, coord: ChunkCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as u32) < self.chunks_wide()
            && (coord.y as u32) < self.chunks_high()
    }

    /// Returns true if the cell lies inside the world.
    #[must_use]
    pub const fn cell_in_bounds(&self, cell: CellPos) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < self.width && (cell.y as u32) < self.height
    }

    /// Chunk containing a continuous world-space point.
    #[must_use]
    pub fn chunk_at_world(&self, x: f32, y: f32) -> ChunkCoord {
        CellPos::containing(x, y).to_chunk_coord(self.chunk_size)
    }

    /// Chunk at the middle of the world grid.
    #[must_use]
    pub const fn center_chunk(&self) -> ChunkCoord {
        ChunkCoord::new(
            (self.chunks_wide() / 2) as i32,
            (self.chunks_high() / 2) as i32,
        )
    }

    /// Designated reference spawn point: the center of the center chunk.
    #[must_use]
    pub fn spawn_point(&self) -> Vec2 {
        let origin = self.center_chunk().origin(self.chunk_size);
        let half = self.chunk_size as f32 / 2.0;
        Vec2::new(origin.x as f32 + half, origin.y as f32 + half)
    }

    /// Radius of the obstruction-free zone around [`Self::spawn_point`].
    #[must_use]
    pub const fn safe_zone_radius(&self) -> f32 {
        self.safe_zone_radius
    }

    /// World edges touched by a chunk.
    #[must_use]
    pub const fn chunk_edges(&self, coord: ChunkCoord) -> ChunkEdges {
        ChunkEdges {
            top: coord.y == 0,
            bottom: coord.y == self.chunks_high() as i32 - 1,
            left: coord.x == 0,
            right: coord.x == self.chunks_wide() as i32 - 1,
        }
    }

    /// In-bounds chunks within a Chebyshev radius of `center`, row by row.
    pub fn chunks_within(
        &self,
        center: ChunkCoord,
        radius: u32,
    ) -> impl Iterator<Item = ChunkCoord> + '_ {
        let r = radius.min(i32::MAX as u32) as i32;
        let x0 = center.x.saturating_sub(r).max(0);
        let y0 = center.y.saturating_sub(r).max(0);
        let x1 = center.x.saturating_add(r).min(self.chunks_wide() as i32 - 1);
        let y1 = center.y.saturating_add(r).min(self.chunks_high() as i32 - 1);
        (y0..=y1).flat_map(move |y| (x0..=x1).map(move |x| ChunkCoord::new(x, y)))
    }
}
