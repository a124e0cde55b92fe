//! Error types for the cache
//!
//! A miss is never an error: lookups return `Ok(None)`. Malformed records are
//! recovered inside the store and only surface as counts.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when opening or writing the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing a cache record failed
    #[error("Cache I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entry could not be serialized
    #[error("Failed to encode cache entry '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A key contains characters that cannot name a cache record
    #[error("Invalid cache key: '{0}'")]
    InvalidKey(String),

    /// The cache cannot be constructed with the given settings
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
