//! Cache configuration
//!
//! Resolved once when a `Cache` is constructed. Environment variables:
//! `CACHE_DIR` (storage directory) and `CACHE_TTL` (seconds, or `-1` for
//! entries that never expire).

use std::path::PathBuf;

use crate::cache::Ttl;
use crate::error::CacheError;

/// Environment variable naming the cache directory
pub const CACHE_DIR_VAR: &str = "CACHE_DIR";

/// Environment variable holding the global TTL in seconds
pub const CACHE_TTL_VAR: &str = "CACHE_TTL";

/// Default cache directory, relative to the working directory
pub const DEFAULT_CACHE_DIR: &str = ".cache";

/// Settings a `Cache` is constructed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory where cache records are stored
    pub cache_dir: PathBuf,
    /// Global time-to-live for entries without an override
    pub ttl: Ttl,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            ttl: Ttl::DEFAULT,
        }
    }
}

impl CacheConfig {
    /// Creates a config for `cache_dir` with the default TTL
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// Sets the global TTL
    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }

    /// Resolves the config from the process environment
    pub fn from_env() -> Result<Self, CacheError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves the config through `lookup`, falling back to defaults for
    /// unset or empty variables.
    ///
    /// # Returns
    /// * `Err(CacheError::InvalidConfig)` if `CACHE_TTL` is not an integer
    ///   number of seconds or `-1`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CacheError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();
        if let Some(dir) = non_empty(CACHE_DIR_VAR) {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(ttl) = non_empty(CACHE_TTL_VAR) {
            config.ttl = Ttl::parse(&ttl).map_err(|e| match e {
                CacheError::InvalidConfig(msg) => {
                    CacheError::InvalidConfig(format!("{CACHE_TTL_VAR}: {msg}"))
                }
                other => other,
            })?;
        }
        Ok(config)
    }
}
