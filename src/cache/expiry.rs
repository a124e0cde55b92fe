//! Expiry policy

use chrono::{DateTime, Utc};

use super::entry::{CacheEntry, Ttl};

/// Returns the TTL that applies to an entry
pub fn effective_ttl(entry: &CacheEntry, global_ttl: Ttl) -> Ttl {
    entry.ttl_override.unwrap_or(global_ttl)
}

/// Whether an entry is stale at `now`.
///
/// An entry exactly at its TTL boundary is still valid; infinite entries
/// never expire.
pub fn is_expired(entry: &CacheEntry, now: DateTime<Utc>, global_ttl: Ttl) -> bool {
    match effective_ttl(entry, global_ttl) {
        Ttl::Infinite => false,
        Ttl::Seconds(secs) => {
            let age_ms = i128::from(now.signed_duration_since(entry.created_at).num_milliseconds());
            age_ms > i128::from(secs) * 1000
        }
    }
}
