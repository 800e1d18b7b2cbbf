//! Error types for Delve.
//!
//! World generation and streaming cannot fail at runtime; the only fallible
//! surface is configuration.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A world or chunk dimension is zero
    #[error("{field} must be greater than zero")]
    ZeroDimension {
        /// Name of the offending field
        field: &'static str,
    },

    /// World size is not a whole number of chunks
    #[error("world size {width}x{height} is not a multiple of chunk size {chunk_size}")]
    ChunkSizeMismatch {
        /// World width in cells
        width: u32,
        /// World height in cells
        height: u32,
        /// Chunk edge length in cells
        chunk_size: u32,
    },

    /// Wall palette has no entries
    #[error("wall palette is empty")]
    EmptyPalette,

    /// A value is outside its accepted range
    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
