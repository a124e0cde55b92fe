//! Read-only reporting over the entry store
//!
//! `CacheManager` aggregates counts, sizes and ages per cache type into a
//! `CacheAnalysis`, which renders as the human-facing report.

use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use super::entry::{CacheType, Ttl};
use super::expiry;
use super::store::{EntryFilter, EntryStore};

/// Approximate cost of one LLM pathway classification call, in USD
const LLM_CALL_COST_USD: f64 = 0.02;

/// Number of diseases listed in the printed report
const DISEASES_SHOWN: usize = 5;

/// Aggregates for one cache type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeSummary {
    /// Number of readable entries
    pub count: usize,
    /// Bytes on disk
    pub size_bytes: u64,
    /// Entries past their effective TTL
    pub expired: usize,
    /// Age of the oldest entry
    pub oldest_age: Option<Duration>,
    /// Age of the newest entry
    pub newest_age: Option<Duration>,
}

/// Aggregate view of the whole cache at one point in time
#[derive(Debug, Clone)]
pub struct CacheAnalysis {
    pub cache_dir: PathBuf,
    pub generated_at: DateTime<Utc>,
    /// Readable entries
    pub total_entries: usize,
    /// Size of all record files, including unreadable ones
    pub total_size_bytes: u64,
    /// Records that could not be read or decoded
    pub corrupt_entries: usize,
    pub by_type: BTreeMap<CacheType, TypeSummary>,
    /// Normalized diseases that have at least one entry
    pub diseases: BTreeSet<String>,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

impl CacheAnalysis {
    /// Summary for one type; empty if the type has no entries
    pub fn type_summary(&self, cache_type: CacheType) -> TypeSummary {
        self.by_type.get(&cache_type).cloned().unwrap_or_default()
    }

    /// Rough LLM spend avoided by the cached pathway classifications
    pub fn estimated_llm_savings_usd(&self) -> f64 {
        self.type_summary(CacheType::Gpt4).count as f64 * LLM_CALL_COST_USD
    }
}

impl fmt::Display for CacheAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n===== Cache Analysis =====")?;
        writeln!(f, "Cache directory: {}", self.cache_dir.display())?;
        writeln!(
            f,
            "Total cached items: {} ({})",
            self.total_entries,
            format_size(self.total_size_bytes)
        )?;
        if self.corrupt_entries > 0 {
            writeln!(f, "Corrupt items: {}", self.corrupt_entries)?;
        }

        writeln!(f, "\nAPI breakdown:")?;
        for cache_type in CacheType::ALL {
            let summary = self.type_summary(cache_type);
            write!(
                f,
                "- {}: {} items ({})",
                cache_type.display_name(),
                summary.count,
                format_size(summary.size_bytes)
            )?;
            if summary.expired > 0 {
                write!(f, ", {} expired", summary.expired)?;
            }
            if let (Some(oldest), Some(newest)) = (summary.oldest_age, summary.newest_age) {
                write!(
                    f,
                    ", oldest {} / newest {}",
                    format_age(oldest),
                    format_age(newest)
                )?;
            }
            writeln!(f)?;
        }

        if !self.diseases.is_empty() {
            writeln!(f, "\nCached disease queries (up to {DISEASES_SHOWN}):")?;
            for disease in self.diseases.iter().take(DISEASES_SHOWN) {
                writeln!(f, "- {disease}")?;
            }
            if self.diseases.len() > DISEASES_SHOWN {
                writeln!(f, "- ...and {} more", self.diseases.len() - DISEASES_SHOWN)?;
            }
        }

        if let (Some(oldest), Some(newest)) = (self.oldest, self.newest) {
            writeln!(f, "\nCache timestamp range:")?;
            writeln!(f, "- Oldest: {}", oldest.to_rfc3339())?;
            writeln!(f, "- Newest: {}", newest.to_rfc3339())?;
        }

        let gpt4 = self.type_summary(CacheType::Gpt4).count;
        if gpt4 > 0 {
            writeln!(f, "\nGPT-4 Pathway Analysis:")?;
            writeln!(f, "- {gpt4} cached pathway analyses")?;
            writeln!(
                f,
                "- Estimated cost savings: ${:.2}",
                self.estimated_llm_savings_usd()
            )?;
        }

        writeln!(f, "===========================")
    }
}

/// Read-only aggregation over an `EntryStore`
#[derive(Debug, Clone, Copy)]
pub struct CacheManager<'a> {
    store: &'a EntryStore,
    ttl: Ttl,
}

impl<'a> CacheManager<'a> {
    /// Creates a manager reporting on `store`, judging expiry with `ttl`
    pub fn new(store: &'a EntryStore, ttl: Ttl) -> Self {
        Self { store, ttl }
    }

    /// Analyzes the store as of now
    pub fn analyze(&self) -> CacheAnalysis {
        self.analyze_at(Utc::now())
    }

    /// Analyzes the store as of `now`
    pub fn analyze_at(&self, now: DateTime<Utc>) -> CacheAnalysis {
        let scan = self.store.scan(&EntryFilter::all());

        let mut analysis = CacheAnalysis {
            cache_dir: self.store.dir().to_path_buf(),
            generated_at: now,
            total_entries: scan.entries.len(),
            total_size_bytes: self.store.total_size_bytes(),
            corrupt_entries: scan.failures,
            by_type: BTreeMap::new(),
            diseases: BTreeSet::new(),
            oldest: None,
            newest: None,
        };

        for stored in &scan.entries {
            let entry = &stored.entry;
            let age = now.signed_duration_since(entry.created_at);

            let summary = analysis.by_type.entry(entry.cache_type).or_default();
            summary.count += 1;
            summary.size_bytes += stored.size_bytes;
            if expiry::is_expired(entry, now, self.ttl) {
                summary.expired += 1;
            }
            summary.oldest_age = Some(summary.oldest_age.map_or(age, |a| a.max(age)));
            summary.newest_age = Some(summary.newest_age.map_or(age, |a| a.min(age)));

            if let Some(disease) = &entry.disease {
                analysis.diseases.insert(disease.clone());
            }
            let created = entry.created_at;
            analysis.oldest = Some(analysis.oldest.map_or(created, |t| t.min(created)));
            analysis.newest = Some(analysis.newest.map_or(created, |t| t.max(created)));
        }

        analysis
    }
}

/// Formats a byte count as B, KB or MB
pub fn format_size(size_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if size_bytes < KB {
        format!("{size_bytes} B")
    } else if size_bytes < MB {
        format!("{:.2} KB", size_bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", size_bytes as f64 / MB as f64)
    }
}

/// Formats an age as its two most significant units, e.g. "3d 4h"
pub fn format_age(age: Duration) -> String {
    let secs = age.num_seconds().max(0);
    let (days, hours, minutes, seconds) =
        (secs / 86_400, secs % 86_400 / 3600, secs % 3600 / 60, secs % 60);

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
