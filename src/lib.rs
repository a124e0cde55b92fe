//! Disease hallmark cache library
//!
//! Exposes the API-response cache, its configuration and the management CLI
//! for use by the binary and integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

pub use cache::{Cache, CacheRequest, CacheType, Ttl};
pub use config::CacheConfig;
pub use error::CacheError;
