//! Spatial partitioning for proximity queries.
//!
//! - [`SpatialHashGrid`]: uniform hash grid over movable entity handles
//! - [`EntityGrid`]: the same grid driven through the [`GridEntity`] trait
//! - [`WallIndex`]: bucketed index over the static walls of loaded chunks
//!
//! None of these own the entities they track. Grids fed from chunk content
//! are kept in sync through [`ChunkObserver`](crate::streaming::ChunkObserver).

mod entity_grid;
mod hash_grid;
mod wall_index;

pub use entity_grid::{EntityGrid, GridEntity, Tracked};
pub use hash_grid::SpatialHashGrid;
pub use wall_index::WallIndex;
