//! Persistent cache for external API responses
//!
//! Responses from the ontology, target, enrichment and LLM collaborators are
//! stored one record per request under the cache directory. Entries carry
//! their provenance type and optional disease so they can be listed and
//! invalidated selectively; expiry is decided lazily against a TTL.

mod entry;
mod expiry;
mod facade;
mod key;
mod manager;
mod store;

pub use entry::{CacheEntry, CacheType, Ttl};
pub use expiry::{effective_ttl, is_expired};
pub use facade::{Cache, CachedData, ClearReport};
pub use key::{canonical_request, derive_key, normalize_disease, CacheRequest};
pub use manager::{format_age, format_size, CacheAnalysis, CacheManager, TypeSummary};
pub use store::{EntryFilter, EntryStore, Scan, StoredEntry};
