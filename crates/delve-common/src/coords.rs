//! Coordinate types for world cells, chunks, and cell rectangles.
//!
//! All integer coordinates are measured in world cells. Conversions to chunk
//! space use Euclidean division so that negative cells land in negative chunks
//! instead of collapsing onto chunk zero.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Packs a signed cell pair into a single `u64` key.
///
/// The high 32 bits hold `x`, the low 32 bits hold `y`; both are stored as
/// their two's complement bit pattern, so the mapping is a bijection.
#[must_use]
pub const fn pack_cell_key(x: i32, y: i32) -> u64 {
    ((x as u32 as u64) << 32) | (y as u32 as u64)
}

/// Inverse of [`pack_cell_key`].
#[must_use]
pub const fn unpack_cell_key(key: u64) -> (i32, i32) {
    ((key >> 32) as u32 as i32, key as u32 as i32)
}

/// Integer position of a single world cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct CellPos {
    /// X coordinate in world cells
    pub x: i32,
    /// Y coordinate in world cells
    pub y: i32,
}

impl CellPos {
    /// Creates a new cell position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the cell containing a continuous world-space point.
    #[must_use]
    pub fn containing(x: f32, y: f32) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
        }
    }

    /// Converts to chunk coordinate given chunk size.
    #[must_use]
    pub const fn to_chunk_coord(self, chunk_size: u32) -> ChunkCoord {
        let size = chunk_size as i32;
        ChunkCoord {
            x: self.x.div_euclid(size),
            y: self.y.div_euclid(size),
        }
    }

    /// Packed integer key for hashing and deduplication.
    #[must_use]
    pub const fn key(self) -> u64 {
        pack_cell_key(self.x, self.y)
    }
}

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct ChunkCoord {
    /// X coordinate in chunk space
    pub x: i32,
    /// Y coordinate in chunk space
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts to the cell at the chunk's origin (top-left corner).
    ///
    /// Wraps for chunks outside the `i32` cell range; see [`Self::checked_origin`].
    #[must_use]
    pub const fn origin(self, chunk_size: u32) -> CellPos {
        let size = chunk_size as i32;
        CellPos {
            x: self.x.wrapping_mul(size),
            y: self.y.wrapping_mul(size),
        }
    }

    /// Origin cell, or `None` if any cell of the chunk lies outside the `i32`
    /// cell range.
    #[must_use]
    pub fn checked_origin(self, chunk_size: u32) -> Option<CellPos> {
        let size = i32::try_from(chunk_size).ok()?;
        let x = self.x.checked_mul(size)?;
        let y = self.y.checked_mul(size)?;
        x.checked_add(size)?;
        y.checked_add(size)?;
        Some(CellPos::new(x, y))
    }

    /// Rectangle covering every cell of this chunk.
    #[must_use]
    pub const fn bounds(self, chunk_size: u32) -> CellRect {
        let origin = self.origin(chunk_size);
        CellRect::new(origin.x, origin.y, chunk_size, chunk_size)
    }

    /// Chebyshev (ring) distance to another chunk.
    #[must_use]
    pub const fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy {
            dx
        } else {
            dy
        }
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned rectangle of whole cells.
///
/// Covers cells `x..x + width` by `y..y + height`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct CellRect {
    /// Left edge in world cells
    pub x: i32,
    /// Top edge in world cells
    pub y: i32,
    /// Width in cells
    pub width: u32,
    /// Height in cells
    pub height: u32,
}

impl CellRect {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Exclusive bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Returns true if the rectangle covers no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Checks if the rectangle covers a cell.
    #[must_use]
    pub const fn contains_cell(&self, cell: CellPos) -> bool {
        cell.x >= self.x && cell.x < self.right() && cell.y >= self.y && cell.y < self.bottom()
    }

    /// Checks if this rectangle shares at least one cell with another.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Checks if the rectangle's area overlaps a circle.
    ///
    /// Touching the circle boundary does not count as an overlap.
    #[must_use]
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        if self.is_empty() {
            return false;
        }
        let closest = Vec2::new(
            center.x.clamp(self.x as f32, self.right() as f32),
            center.y.clamp(self.y as f32, self.bottom() as f32),
        );
        closest.distance_squared(center) < radius * radius
    }

    /// Iterates over every cell covered by the rectangle, row by row.
    pub fn cells(&self) -> impl Iterator<Item = CellPos> {
        let (x0, x1) = (self.x, self.right());
        (self.y..self.bottom()).flat_map(move |y| (x0..x1).map(move |x| CellPos::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_key_roundtrip_negative() {
        for &(x, y) in &[(0, 0), (-1, 5), (i32::MIN, i32::MAX), (123, -456)] {
            assert_eq!(unpack_cell_key(pack_cell_key(x, y)), (x, y));
        }
        assert_ne!(pack_cell_key(1, 0), pack_cell_key(0, 1));
    }

    #[test]
    fn test_negative_cells_map_to_negative_chunks() {
        assert_eq!(CellPos::new(-1, -1).to_chunk_coord(16), ChunkCoord::new(-1, -1));
        assert_eq!(CellPos::new(-16, 15).to_chunk_coord(16), ChunkCoord::new(-1, 0));
        assert_eq!(CellPos::new(-17, 0).to_chunk_coord(16), ChunkCoord::new(-2, 0));
        assert_eq!(CellPos::containing(-0.5, 3.9), CellPos::new(-1, 3));
    }

    #[test]
    fn test_chunk_bounds_and_distance() {
        let coord = ChunkCoord::new(2, 3);
        assert_eq!(coord.origin(8), CellPos::new(16, 24));
        assert_eq!(coord.bounds(8), CellRect::new(16, 24, 8, 8));
        assert_eq!(coord.chebyshev_distance(ChunkCoord::new(0, 0)), 3);
        assert_eq!(coord.chebyshev_distance(ChunkCoord::new(5, 2)), 3);
    }

    #[test]
    fn test_checked_origin_rejects_unaddressable_chunks() {
        assert_eq!(ChunkCoord::new(-3, 2).checked_origin(16), Some(CellPos::new(-48, 32)));
        assert_eq!(ChunkCoord::new(i32::MAX / 4, 0).checked_origin(16), None);
        assert_eq!(ChunkCoord::new(0, i32::MIN).checked_origin(2), None);
        // The last chunk ends exactly one past i32::MAX, which is not a cell.
        assert_eq!(ChunkCoord::new(i32::MAX / 16, 0).checked_origin(16), None);
        assert_eq!(
            ChunkCoord::new(i32::MAX / 16 - 1, 0).checked_origin(16),
            Some(CellPos::new((i32::MAX / 16 - 1) * 16, 0))
        );
        assert_eq!(
            ChunkCoord::new(i32::MIN / 16, 0).checked_origin(16),
            Some(CellPos::new(i32::MIN, 0))
        );
        assert_eq!(ChunkCoord::new(0, 0).checked_origin(u32::MAX), None);
    }

    #[test]
    fn test_rect_intersection() {
        let a = CellRect::new(0, 0, 2, 2);
        assert!(a.intersects(&CellRect::new(1, 1, 2, 2)));
        // Edge-adjacent rectangles do not share a cell.
        assert!(!a.intersects(&CellRect::new(2, 0, 2, 2)));
        assert!(!a.intersects(&CellRect::new(0, 0, 0, 5)));
        assert_eq!(a.cells().count(), 4);
        assert!(a.contains_cell(CellPos::new(1, 1)));
        assert!(!a.contains_cell(CellPos::new(2, 1)));
    }

    proptest::proptest! {
        #[test]
        fn cell_lies_in_its_chunk(
            x in -100_000i32..100_000,
            y in -100_000i32..100_000,
            size in 1u32..64,
        ) {
            let cell = CellPos::new(x, y);
            let chunk = cell.to_chunk_coord(size);
            let origin = chunk.origin(size);
            proptest::prop_assert_eq!(chunk.checked_origin(size), Some(origin));
            proptest::prop_assert!((0..size as i32).contains(&(cell.x - origin.x)));
            proptest::prop_assert!((0..size as i32).contains(&(cell.y - origin.y)));
            proptest::prop_assert!(chunk.bounds(size).contains_cell(cell));
        }
    }

    #[test]
    fn test_rect_circle_intersection() {
        let rect = CellRect::new(10, 10, 2, 2);
        assert!(rect.intersects_circle(Vec2::new(11.0, 11.0), 0.1));
        assert!(rect.intersects_circle(Vec2::new(8.0, 11.0), 2.5));
        assert!(!rect.intersects_circle(Vec2::new(8.0, 11.0), 2.0));
        assert!(!rect.intersects_circle(Vec2::new(0.0, 0.0), 5.0));
    }
}
