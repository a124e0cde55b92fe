//! Cache record types
//!
//! A `CacheEntry` is the unit persisted by the store: one record per key,
//! carrying the opaque payload plus the metadata used for invalidation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CacheError;

/// Provenance of a cached payload: which external API produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// Enrichr pathway enrichment
    Enrichr,
    /// EBI Ontology Lookup Service
    Ols,
    /// Open Targets target-disease associations
    OpenTargets,
    /// Gene Ontology / QuickGO
    Go,
    /// LLM pathway classification
    Gpt4,
    /// Anything else, including unrecognized labels found on disk
    #[serde(other)]
    Other,
}

impl CacheType {
    /// All types, in report order
    pub const ALL: [CacheType; 6] = [
        CacheType::Enrichr,
        CacheType::Ols,
        CacheType::OpenTargets,
        CacheType::Go,
        CacheType::Gpt4,
        CacheType::Other,
    ];

    /// Parses a type label, accepting the historical aliases.
    ///
    /// Returns `None` if the label is not recognized. Use [`CacheType::classify`]
    /// where unknown provenance should fall back to `Other`.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "enrichr" => Some(CacheType::Enrichr),
            "ols" | "ols_search" => Some(CacheType::Ols),
            "opentargets" | "open_targets" => Some(CacheType::OpenTargets),
            "go" | "quickgo" => Some(CacheType::Go),
            "gpt4" | "gpt-4" | "pathway_analysis" => Some(CacheType::Gpt4),
            "other" => Some(CacheType::Other),
            _ => None,
        }
    }

    /// Parses a provenance label, mapping anything unrecognized to `Other`
    pub fn classify(s: &str) -> Self {
        Self::from_label(s).unwrap_or(CacheType::Other)
    }

    /// Canonical lowercase label, as persisted
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheType::Enrichr => "enrichr",
            CacheType::Ols => "ols",
            CacheType::OpenTargets => "opentargets",
            CacheType::Go => "go",
            CacheType::Gpt4 => "gpt4",
            CacheType::Other => "other",
        }
    }

    /// Human-readable name of the upstream service
    pub fn display_name(&self) -> &'static str {
        match self {
            CacheType::Enrichr => "Enrichr API",
            CacheType::Ols => "EBI Ontology Lookup Service",
            CacheType::OpenTargets => "Open Targets API",
            CacheType::Go => "Gene Ontology/QuickGO API",
            CacheType::Gpt4 => "GPT-4 Pathway Analysis",
            CacheType::Other => "Other/Unknown",
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-to-live of a cache entry
///
/// Persisted and configured as an integer number of seconds, where `-1`
/// means the entry never expires by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Ttl {
    /// Expires once older than this many seconds
    Seconds(u64),
    /// Never expires; only removed by explicit clears
    Infinite,
}

impl Ttl {
    /// Sentinel value for an infinite TTL
    pub const INFINITE_SENTINEL: i64 = -1;

    /// Default global TTL of 24 hours
    pub const DEFAULT: Ttl = Ttl::Seconds(86_400);

    /// Builds a TTL from its integer representation
    pub fn from_seconds(secs: i64) -> Result<Self, CacheError> {
        match secs {
            Self::INFINITE_SENTINEL => Ok(Ttl::Infinite),
            s if s >= 0 => Ok(Ttl::Seconds(s as u64)),
            s => Err(CacheError::InvalidConfig(format!(
                "TTL must be a non-negative number of seconds or -1, got {s}"
            ))),
        }
    }

    /// Parses a TTL from text such as an environment variable or CLI flag
    pub fn parse(s: &str) -> Result<Self, CacheError> {
        let secs: i64 = s.trim().parse().map_err(|_| {
            CacheError::InvalidConfig(format!(
                "TTL must be an integer number of seconds or -1, got '{s}'"
            ))
        })?;
        Self::from_seconds(secs)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Ttl::Infinite)
    }
}

impl TryFrom<i64> for Ttl {
    type Error = CacheError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Ttl::from_seconds(value)
    }
}

impl From<Ttl> for i64 {
    fn from(ttl: Ttl) -> Self {
        match ttl {
            Ttl::Seconds(s) => i64::try_from(s).unwrap_or(i64::MAX),
            Ttl::Infinite => Ttl::INFINITE_SENTINEL,
        }
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Seconds(s) => write!(f, "{s}s"),
            Ttl::Infinite => f.write_str("infinite"),
        }
    }
}

/// One stored cache record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Key derived from the logical request
    pub key: String,
    /// Which API produced the payload
    #[serde(rename = "type")]
    pub cache_type: CacheType,
    /// Normalized disease name the request was made for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease: Option<String>,
    /// Canonical request text the key was hashed from; absent on records
    /// written without a request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_key: Option<String>,
    /// The cached response, opaque to the cache
    pub payload: serde_json::Value,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
    /// Entry-specific TTL, overriding the global one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_override: Option<Ttl>,
}
