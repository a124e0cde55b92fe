//! Cache key derivation
//!
//! Keys are derived from a canonical JSON encoding of the request type,
//! the normalized disease and the sorted parameters, hashed with SHA-256.
//! The encoding is unambiguous, so distinct parameter sets cannot collide
//! by construction.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use super::entry::CacheType;

/// Number of hex characters of the digest kept in the key
const DIGEST_HEX_LEN: usize = 32;

/// Logical request whose response is being cached
///
/// Parameters are kept in a sorted map so insertion order never affects the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheRequest {
    disease: Option<String>,
    params: BTreeMap<String, String>,
}

impl CacheRequest {
    /// Creates an empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a request scoped to a disease
    pub fn for_disease(disease: &str) -> Self {
        Self::new().disease(disease)
    }

    /// Associates the request with a disease; the name is normalized
    pub fn disease(mut self, disease: &str) -> Self {
        self.disease = Some(normalize_disease(disease));
        self
    }

    /// Adds a named parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Adds a gene list parameter.
    ///
    /// Symbols are trimmed, deduplicated and sorted, so the same set of genes
    /// yields the same key regardless of order.
    pub fn genes<I, S>(self, genes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut symbols: Vec<String> = genes
            .into_iter()
            .map(|g| g.as_ref().trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        symbols.sort();
        symbols.dedup();
        self.param("genes", symbols.join(","))
    }

    /// Normalized disease, if the request has one
    pub fn disease_name(&self) -> Option<&str> {
        self.disease.as_deref()
    }
}

/// Canonical form hashed into the key
#[derive(Serialize)]
struct CanonicalRequest<'a> {
    #[serde(rename = "type")]
    cache_type: &'a str,
    disease: Option<&'a str>,
    params: &'a BTreeMap<String, String>,
}

/// Normalizes a disease name for key derivation and disease matching.
///
/// Trims, collapses internal whitespace to single spaces and lowercases.
/// Punctuation is kept, so "Alzheimer's disease" and "alzheimers disease"
/// remain distinct.
pub fn normalize_disease(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Renders the canonical JSON form of a request, the text that is hashed
/// into its key.
///
/// Stored on each entry as `original_key` so an operator can tell which
/// request produced a record.
pub fn canonical_request(cache_type: CacheType, request: &CacheRequest) -> String {
    let canonical = CanonicalRequest {
        cache_type: cache_type.as_str(),
        disease: request.disease.as_deref(),
        params: &request.params,
    };
    // Serializing strings and a BTreeMap cannot fail
    serde_json::to_string(&canonical).unwrap_or_default()
}

/// Derives the cache key for a request.
///
/// The key is `<type>_<digest>`, which keeps keys filesystem-safe and lets a
/// reader see the provenance at a glance.
pub fn derive_key(cache_type: CacheType, request: &CacheRequest) -> String {
    let encoded = canonical_request(cache_type, request);
    let digest = Sha256::digest(encoded.as_bytes());
    let digest_hex = hex::encode(digest);
    format!("{}_{}", cache_type.as_str(), &digest_hex[..DIGEST_HEX_LEN])
}
