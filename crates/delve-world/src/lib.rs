//! # Delve World
//!
//! Chunked world streaming for Delve.
//!
//! This crate handles:
//! - Deterministic per-chunk procedural generation
//! - Chunk loading/unloading around a moving reference point
//! - LRU caching and eviction of inactive chunks
//! - Spatial hash grids for proximity queries

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod chunk;
pub mod generation;
pub mod lru;
pub mod spatial;
pub mod streaming;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::chunk::*;
    pub use crate::generation::*;
    pub use crate::lru::LruCache;
    pub use crate::spatial::*;
    pub use crate::streaming::*;
}

pub use prelude::*;
