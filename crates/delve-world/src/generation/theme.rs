//! Zone themes derived from a chunk's distance to the world center.

use delve_common::{ChunkCoord, WorldLayout};

/// Zone tag for a chunk.
///
/// Zones are concentric square rings of chunks around the world's center
/// chunk; a theme never depends on the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Theme {
    /// The center chunk holding the spawn point.
    Sanctum,
    /// First ring around the center.
    Wilds,
    /// Second and third rings.
    Ruins,
    /// Everything further out.
    Depths,
}

impl Theme {
    /// All themes, innermost first.
    pub const ALL: [Self; 4] = [Self::Sanctum, Self::Wilds, Self::Ruins, Self::Depths];

    /// Theme for a ring distance (in chunks) from the center chunk.
    #[must_use]
    pub const fn for_ring(ring: u32) -> Self {
        match ring {
            0 => Self::Sanctum,
            1 => Self::Wilds,
            2 | 3 => Self::Ruins,
            _ => Self::Depths,
        }
    }

    /// Theme of a chunk in the given world.
    #[must_use]
    pub const fn for_chunk(layout: &WorldLayout, coord: ChunkCoord) -> Self {
        Self::for_ring(coord.chebyshev_distance(layout.center_chunk()))
    }

    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sanctum => "sanctum",
            Self::Wilds => "wilds",
            Self::Ruins => "ruins",
            Self::Depths => "depths",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
