//! World streaming configuration.
//!
//! Configuration is supplied once by the embedding application, either built
//! in code or parsed from TOML. Missing keys fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::layout::WorldLayout;

/// Width and height of an interior wall block, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallSize {
    /// Width in cells
    pub width: u32,
    /// Height in cells
    pub height: u32,
}

impl WallSize {
    /// Creates a new wall size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Default interior wall shapes.
pub const DEFAULT_WALL_PALETTE: [WallSize; 10] = [
    WallSize::new(1, 1),
    WallSize::new(2, 1),
    WallSize::new(1, 2),
    WallSize::new(2, 2),
    WallSize::new(3, 1),
    WallSize::new(1, 3),
    WallSize::new(3, 2),
    WallSize::new(2, 3),
    WallSize::new(4, 1),
    WallSize::new(1, 4),
];

/// Per-chunk feature targets used by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Width of the wall strip laid along world edges
    pub border_thickness: u32,
    /// Collision height of border walls
    pub border_collision_height: u16,
    /// Collision height of interior walls
    pub interior_collision_height: u16,
    /// Interior walls to attempt per chunk
    pub interior_walls_per_chunk: u32,
    /// Shapes interior walls are drawn from
    pub wall_palette: Vec<WallSize>,
    /// Placement attempts allowed per requested feature
    pub max_attempts_per_feature: u32,
    /// Traps to attempt per chunk
    pub traps_per_chunk: u32,
    /// One chest per this many placed traps
    pub trap_to_chest_ratio: u32,
    /// Upper bound on chests per chunk
    pub max_chests_per_chunk: u32,
    /// Enemy spawn points to attempt per chunk
    pub spawns_per_chunk: u32,
    /// Radius of the obstruction-free zone around the spawn point, in cells
    pub safe_zone_radius: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            border_thickness: 1,
            border_collision_height: 3,
            interior_collision_height: 2,
            interior_walls_per_chunk: 6,
            wall_palette: DEFAULT_WALL_PALETTE.to_vec(),
            max_attempts_per_feature: 20,
            traps_per_chunk: 3,
            trap_to_chest_ratio: 3,
            max_chests_per_chunk: 2,
            spawns_per_chunk: 2,
            safe_zone_radius: 6.0,
        }
    }
}

impl GenerationParams {
    /// Checks the parameters against a chunk size.
    pub fn validate(&self, chunk_size: u32) -> ConfigResult<()> {
        if self.wall_palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        if let Some(size) = self.wall_palette.iter().find(|s| {
            s.width == 0 || s.height == 0 || s.width > chunk_size || s.height > chunk_size
        }) {
            return Err(ConfigError::InvalidValue(format!(
                "wall size {}x{} does not fit a {chunk_size}-cell chunk",
                size.width, size.height
            )));
        }
        if self.border_thickness > chunk_size {
            return Err(ConfigError::InvalidValue(format!(
                "border_thickness {} exceeds chunk size {chunk_size}",
                self.border_thickness
            )));
        }
        if self.trap_to_chest_ratio == 0 {
            return Err(ConfigError::InvalidValue(
                "trap_to_chest_ratio must be at least 1".into(),
            ));
        }
        if !self.safe_zone_radius.is_finite() || self.safe_zone_radius < 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "safe_zone_radius {} must be a finite, non-negative number",
                self.safe_zone_radius
            )));
        }
        Ok(())
    }
}

/// Top-level world configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World width in cells
    pub world_width: u32,
    /// World height in cells
    pub world_height: u32,
    /// Chunk edge length in cells
    pub chunk_size: u32,
    /// Chebyshev radius, in chunks, kept loaded around the reference point
    pub active_radius: u32,
    /// Soft bound on cached chunks
    pub max_cached_chunks: usize,
    /// World seed
    pub seed: u64,
    /// Generator parameters
    pub generation: GenerationParams,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_width: 256,
            world_height: 256,
            chunk_size: 16,
            active_radius: 2,
            max_cached_chunks: 64,
            seed: 1337,
            generation: GenerationParams::default(),
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded world config from {}", path.display());
        Ok(config)
    }

    /// Serializes the configuration to pretty TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Saves the configuration to a file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        info!("Saved world config to {}", path.display());
        Ok(())
    }

    /// Checks every configuration invariant.
    pub fn validate(&self) -> ConfigResult<()> {
        let layout = self.layout()?;
        self.generation.validate(self.chunk_size)?;

        // Border strips are unconditional, so the safe zone must stay clear of them.
        let spawn = layout.spawn_point();
        let clearance = spawn
            .x
            .min(spawn.y)
            .min(layout.width() as f32 - spawn.x)
            .min(layout.height() as f32 - spawn.y)
            - self.generation.border_thickness as f32;
        if self.generation.safe_zone_radius > clearance {
            return Err(ConfigError::InvalidValue(format!(
                "safe_zone_radius {} reaches the world border (clearance {clearance})",
                self.generation.safe_zone_radius
            )));
        }
        Ok(())
    }

    /// Builds the world geometry described by this configuration.
    pub fn layout(&self) -> ConfigResult<WorldLayout> {
        WorldLayout::new(
            self.world_width,
            self.world_height,
            self.chunk_size,
            self.generation.safe_zone_radius,
        )
    }
}
