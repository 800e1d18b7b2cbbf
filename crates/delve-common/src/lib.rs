//! # Delve Common
//!
//! Common types and configuration shared by the Delve world streaming crates.
//!
//! This crate provides:
//! - Coordinate types (cell, chunk) and packed cell keys
//! - Cell rectangles with circle and rectangle overlap tests
//! - World layout (bounds, center chunk, spawn safe zone)
//! - Entity IDs and their allocator
//! - Configuration loading and validation
//! - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod coords;
pub mod error;
pub mod ids;
pub mod layout;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::layout::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_chunk_conversion() {
        let cell = CellPos::new(100, 200);
        let chunk = cell.to_chunk_coord(32);

        assert_eq!(chunk, ChunkCoord::new(3, 6));
        assert_eq!(chunk.origin(32), CellPos::new(96, 192));
        assert_eq!(chunk.checked_origin(32), Some(CellPos::new(96, 192)));
    }

    #[test]
    fn test_entity_id_allocation() {
        let mut ids = EntityIdAllocator::new();
        let id1 = ids.allocate();
        let id2 = ids.allocate();
        assert_ne!(id1, id2);
        assert!(id1.is_valid());
        assert!(!EntityId::NULL.is_valid());

        ids.reset();
        assert_eq!(ids.allocate(), id1);
    }
}
