//! Construction-time structures used while placing chunk features.
//!
//! Neither structure outlives a single `generate` call.

use ahash::AHashSet;
use delve_common::CellPos;

/// Dense boolean grid over a chunk's local cells.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    size: u32,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    /// Creates an empty `size × size` grid.
    #[must_use]
    pub fn new(size: u32) -> Self {
        Self {
            size,
            cells: vec![false; (size as usize) * (size as usize)],
        }
    }

    /// Grid edge length.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.size as usize) + (x as usize)
    }

    /// Returns true if the local cell is marked. Out-of-range cells read as marked.
    #[must_use]
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        if x >= self.size || y >= self.size {
            return true;
        }
        self.cells[self.index(x, y)]
    }

    /// Returns true if the rectangle lies inside the grid and covers no marked cell.
    #[must_use]
    pub fn fits(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let (Some(right), Some(bottom)) = (x.checked_add(width), y.checked_add(height)) else {
            return false;
        };
        if right > self.size || bottom > self.size {
            return false;
        }
        (y..bottom).all(|cy| (x..right).all(|cx| !self.cells[self.index(cx, cy)]))
    }

    /// Marks every cell of the rectangle, clipped to the grid.
    pub fn mark(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let right = x.saturating_add(width).min(self.size);
        let bottom = y.saturating_add(height).min(self.size);
        for cy in y..bottom {
            for cx in x..right {
                let index = self.index(cx, cy);
                self.cells[index] = true;
            }
        }
    }

    /// Number of marked cells.
    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// Set of packed integer cell keys for O(1) duplicate rejection.
#[derive(Debug, Clone, Default)]
pub struct CellKeySet {
    keys: AHashSet<u64>,
}

impl CellKeySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cell. Returns false if it was already present.
    pub fn insert(&mut self, cell: CellPos) -> bool {
        self.keys.insert(cell.key())
    }

    /// Checks whether a cell is present.
    #[must_use]
    pub fn contains(&self, cell: CellPos) -> bool {
        self.keys.contains(&cell.key())
    }

    /// Number of cells in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_and_mark() {
        let mut grid = OccupancyGrid::new(8);
        assert!(grid.fits(0, 0, 8, 8));
        assert!(!grid.fits(6, 0, 3, 1));
        assert!(!grid.fits(0, 0, 0, 1));

        grid.mark(2, 2, 2, 3);
        assert_eq!(grid.filled_count(), 6);
        assert!(grid.is_set(3, 4));
        assert!(!grid.is_set(4, 4));
        assert!(!grid.fits(0, 0, 3, 3));
        assert!(grid.fits(4, 0, 4, 8));
    }

    #[test]
    fn test_out_of_range_reads_as_set() {
        let grid = OccupancyGrid::new(4);
        assert!(grid.is_set(4, 0));
        assert!(!grid.fits(u32::MAX, 0, 2, 1));
    }

    #[test]
    fn test_cell_key_set_dedup() {
        let mut set = CellKeySet::new();
        assert!(set.insert(CellPos::new(3, -4)));
        assert!(!set.insert(CellPos::new(3, -4)));
        assert!(set.insert(CellPos::new(-4, 3)));
        assert!(set.contains(CellPos::new(3, -4)));
        assert_eq!(set.len(), 2);
    }
}
