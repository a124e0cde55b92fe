//! Public cache facade
//!
//! `Cache` ties key derivation, the entry store and the expiry policy
//! together. Lookups are lazy: expired entries read as misses and stay on
//! disk until overwritten or removed by `clear_expired`.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::entry::{CacheEntry, CacheType, Ttl};
use super::expiry;
use super::key::{canonical_request, derive_key, CacheRequest};
use super::manager::{CacheAnalysis, CacheManager};
use super::store::{EntryFilter, EntryStore, Scan};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Result of a metadata-aware read, including stale entries
#[derive(Debug)]
pub struct CachedData<T> {
    /// The cached payload
    pub payload: T,
    /// When the payload was cached
    pub created_at: DateTime<Utc>,
    /// Whether the entry has outlived its TTL
    pub is_expired: bool,
}

/// Outcome of a bulk clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Records actually removed
    pub cleared: usize,
    /// Matching records whose deletion failed
    pub failed: usize,
    /// Records that could not be read and were left in place
    pub skipped: usize,
}

/// Entries held in memory after `Cache::preload`, keyed by cache key
type Preloaded = HashMap<String, CacheEntry>;

/// Persistent API-response cache
///
/// Configuration is fixed at construction; open a new `Cache` to point at a
/// different directory or TTL. Clones share the preloaded entries.
#[derive(Debug, Clone)]
pub struct Cache {
    store: EntryStore,
    ttl: Ttl,
    memory: Arc<RwLock<Option<Preloaded>>>,
}

impl Cache {
    /// Opens a cache, creating its directory if needed
    ///
    /// # Returns
    /// * `Err(CacheError::InvalidConfig)` if the directory cannot be created,
    ///   the path is not a directory, or the directory is not writable
    pub fn open(config: CacheConfig) -> Result<Self> {
        let dir = &config.cache_dir;
        if dir.as_os_str().is_empty() {
            return Err(CacheError::InvalidConfig(
                "cache directory must not be empty".to_string(),
            ));
        }
        if dir.exists() && !dir.is_dir() {
            return Err(CacheError::InvalidConfig(format!(
                "cache path {} is not a directory",
                dir.display()
            )));
        }
        std::fs::create_dir_all(dir).map_err(|e| {
            CacheError::InvalidConfig(format!(
                "cannot create cache directory {}: {e}",
                dir.display()
            ))
        })?;
        NamedTempFile::new_in(dir).map_err(|e| {
            CacheError::InvalidConfig(format!(
                "cache directory {} is not writable: {e}",
                dir.display()
            ))
        })?;

        debug!(dir = %dir.display(), ttl = %config.ttl, "opened cache");
        Ok(Self {
            store: EntryStore::new(config.cache_dir),
            ttl: config.ttl,
            memory: Arc::new(RwLock::new(None)),
        })
    }

    /// Opens a cache configured from `CACHE_DIR` and `CACHE_TTL`
    pub fn from_env() -> Result<Self> {
        Self::open(CacheConfig::from_env()?)
    }

    /// Directory holding the cache records
    pub fn cache_dir(&self) -> &Path {
        self.store.dir()
    }

    /// Global TTL applied to entries without an override
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Underlying entry store
    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    /// Whether `entry` is stale at `now` under this cache's TTL
    pub fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        expiry::is_expired(entry, now, self.ttl)
    }

    /// Returns the cached payload for a request, or `None` on a miss.
    ///
    /// Expired entries, undecodable records and payloads that do not
    /// deserialize into `T` all read as a miss.
    pub fn get<T: DeserializeOwned>(
        &self,
        cache_type: CacheType,
        request: &CacheRequest,
    ) -> Result<Option<T>> {
        Ok(self
            .peek(cache_type, request)?
            .filter(|cached| !cached.is_expired)
            .map(|cached| cached.payload))
    }

    /// Reads an entry without applying expiry, reporting its freshness.
    ///
    /// Lets a caller fall back to stale data when the upstream API is down.
    pub fn peek<T: DeserializeOwned>(
        &self,
        cache_type: CacheType,
        request: &CacheRequest,
    ) -> Result<Option<CachedData<T>>> {
        let key = derive_key(cache_type, request);
        let Some(entry) = self.read_entry(&key)? else {
            debug!(%key, "cache miss");
            return Ok(None);
        };

        let is_expired = self.is_expired(&entry, Utc::now());
        match serde_json::from_value::<T>(entry.payload) {
            Ok(payload) => {
                debug!(%key, is_expired, "cache hit");
                Ok(Some(CachedData {
                    payload,
                    created_at: entry.created_at,
                    is_expired,
                }))
            }
            Err(e) => {
                warn!(%key, error = %e, "cached payload has unexpected shape");
                Ok(None)
            }
        }
    }

    /// Caches `payload` for a request under the global TTL.
    ///
    /// The disease tag is taken from the request. An existing entry for the
    /// same request is replaced.
    pub fn put<T: Serialize + ?Sized>(
        &self,
        cache_type: CacheType,
        request: &CacheRequest,
        payload: &T,
    ) -> Result<()> {
        self.write_entry(cache_type, request, payload, None)
    }

    /// Caches `payload` with an entry-specific TTL
    pub fn put_with_ttl<T: Serialize + ?Sized>(
        &self,
        cache_type: CacheType,
        request: &CacheRequest,
        payload: &T,
        ttl: Ttl,
    ) -> Result<()> {
        self.write_entry(cache_type, request, payload, Some(ttl))
    }

    fn write_entry<T: Serialize + ?Sized>(
        &self,
        cache_type: CacheType,
        request: &CacheRequest,
        payload: &T,
        ttl_override: Option<Ttl>,
    ) -> Result<()> {
        let key = derive_key(cache_type, request);
        let payload = serde_json::to_value(payload).map_err(|e| CacheError::Encode {
            key: key.clone(),
            source: e,
        })?;

        let entry = CacheEntry {
            key,
            cache_type,
            disease: request.disease_name().map(str::to_string),
            original_key: Some(canonical_request(cache_type, request)),
            payload,
            created_at: Utc::now(),
            ttl_override,
        };
        self.store.write(&entry)?;

        let mut memory = self.memory.write().unwrap_or_else(|e| e.into_inner());
        if let Some(preloaded) = memory.as_mut() {
            preloaded.insert(entry.key.clone(), entry);
        }
        Ok(())
    }

    /// Reads an entry from the preloaded set, falling back to disk
    fn read_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        {
            let memory = self.memory.read().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = memory.as_ref().and_then(|m| m.get(key)) {
                return Ok(Some(entry.clone()));
            }
        }
        self.store.read(key)
    }

    /// Loads every fresh, readable entry into memory so later lookups skip
    /// disk I/O.
    ///
    /// Entries written or cleared through this `Cache` (or its clones) keep
    /// the in-memory set current. Changes made by other processes are not
    /// seen for preloaded keys until the cache is reopened.
    ///
    /// # Returns
    /// The number of entries loaded
    pub fn preload(&self) -> usize {
        let now = Utc::now();
        let preloaded: Preloaded = self
            .store
            .list(&EntryFilter::all())
            .into_iter()
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| (entry.key.clone(), entry))
            .collect();

        let loaded = preloaded.len();
        *self.memory.write().unwrap_or_else(|e| e.into_inner()) = Some(preloaded);
        info!(loaded, "preloaded cache entries into memory");
        loaded
    }

    /// Drops a key from the preloaded set
    fn forget(&self, key: &str) {
        let mut memory = self.memory.write().unwrap_or_else(|e| e.into_inner());
        if let Some(preloaded) = memory.as_mut() {
            preloaded.remove(key);
        }
    }

    /// Returns the fresh cached value, or computes, caches and returns it.
    ///
    /// Errors from `compute` are returned as-is and never cached. Cache I/O
    /// failures are logged and do not fail the call.
    pub fn get_or_try_insert_with<T, E, F>(
        &self,
        cache_type: CacheType,
        request: &CacheRequest,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        match self.get(cache_type, request) {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "cache read failed, recomputing"),
        }

        let value = compute()?;
        if let Err(e) = self.put(cache_type, request, &value) {
            warn!(error = %e, "failed to cache computed value");
        }
        Ok(value)
    }

    /// Lists every readable entry
    pub fn list_all(&self) -> Vec<CacheEntry> {
        self.store.list(&EntryFilter::all())
    }

    /// Lists entries of one type
    pub fn list_cache_by_type(&self, cache_type: CacheType) -> Vec<CacheEntry> {
        self.store.list(&EntryFilter::all().with_type(cache_type))
    }

    /// Lists entries tagged with a disease
    pub fn list_disease_cache(&self, disease: &str) -> Vec<CacheEntry> {
        self.store.list(&EntryFilter::all().with_disease(disease))
    }

    /// Lists entries whose original request text contains `pattern`
    pub fn list_cache_items(&self, pattern: &str) -> Vec<CacheEntry> {
        self.store.list(&EntryFilter::all().with_pattern(pattern))
    }

    /// Scans the entries matching `filter` along with their on-disk sizes
    pub fn scan(&self, filter: &EntryFilter) -> Scan {
        self.store.scan(filter)
    }

    /// Deletes every entry of one type, returning how many were removed
    pub fn clear_cache_by_type(&self, cache_type: CacheType) -> usize {
        self.clear(&EntryFilter::all().with_type(cache_type)).cleared
    }

    /// Deletes every entry tagged with a disease; untagged entries are kept
    pub fn clear_disease_cache(&self, disease: &str) -> usize {
        self.clear(&EntryFilter::all().with_disease(disease)).cleared
    }

    /// Deletes every readable entry
    pub fn clear_all(&self) -> usize {
        self.clear(&EntryFilter::all()).cleared
    }

    /// Deletes every entry that has outlived its effective TTL
    pub fn clear_expired(&self) -> usize {
        self.clear_expired_at(Utc::now())
    }

    /// Deletes every entry that is expired as of `now`
    pub fn clear_expired_at(&self, now: DateTime<Utc>) -> usize {
        self.clear_expired_report(now).cleared
    }

    /// Deletes every entry matching `filter`, reporting what was skipped
    pub fn clear(&self, filter: &EntryFilter) -> ClearReport {
        self.clear_matching(filter, |_| true)
    }

    /// Deletes every entry expired as of `now`, reporting what was skipped
    pub fn clear_expired_report(&self, now: DateTime<Utc>) -> ClearReport {
        self.clear_matching(&EntryFilter::all(), |entry| self.is_expired(entry, now))
    }

    /// Deletes entries matching `filter` and `predicate`, skipping failures
    fn clear_matching<P>(&self, filter: &EntryFilter, predicate: P) -> ClearReport
    where
        P: Fn(&CacheEntry) -> bool,
    {
        let scan = self.store.scan(filter);
        let mut report = ClearReport {
            skipped: scan.failures,
            ..ClearReport::default()
        };

        for stored in scan.entries.iter().filter(|s| predicate(&s.entry)) {
            let key = &stored.entry.key;
            match self.store.delete(key) {
                Ok(true) => report.cleared += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(%key, error = %e, "failed to delete cache entry");
                    report.failed += 1;
                }
            }
            self.forget(key);
        }

        if report.failed > 0 || report.skipped > 0 {
            warn!(
                cleared = report.cleared,
                failed = report.failed,
                skipped = report.skipped,
                "cache clear left some records in place"
            );
        } else {
            debug!(cleared = report.cleared, "cleared cache entries");
        }
        report
    }

    /// Builds the aggregate report; never modifies the store
    pub fn get_analysis(&self) -> CacheAnalysis {
        CacheManager::new(&self.store, self.ttl).analyze()
    }

    /// Prints the aggregate report to stdout
    pub fn print_analysis(&self) {
        print!("{}", self.get_analysis());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde::Deserialize;
    use serde_json::json;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Targets {
        disease: String,
        genes: Vec<String>,
    }

    fn create_test_cache(ttl: Ttl) -> (Cache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = Cache::open(CacheConfig::new(temp_dir.path()).with_ttl(ttl))
            .expect("Cache should open");
        (cache, temp_dir)
    }

    fn targets() -> Targets {
        Targets {
            disease: "asthma".to_string(),
            genes: vec!["IL13".to_string(), "ORMDL3".to_string()],
        }
    }

    /// Writes an entry whose age and override are controlled by the test
    fn write_aged(cache: &Cache, key: &str, age_secs: i64, ttl_override: Option<Ttl>) {
        cache
            .store()
            .write(&CacheEntry {
                key: key.to_string(),
                cache_type: CacheType::Go,
                disease: None,
                original_key: None,
                payload: json!(key),
                created_at: Utc::now() - Duration::seconds(age_secs),
                ttl_override,
            })
            .unwrap();
    }

    #[test]
    fn test_put_then_get_returns_payload() {
        let (cache, _temp_dir) = create_test_cache(Ttl::DEFAULT);
        let request = CacheRequest::for_disease("Asthma").param("efo_id", "EFO_0000270");

        cache.put(CacheType::OpenTargets, &request, &targets()).unwrap();

        let cached: Option<Targets> = cache.get(CacheType::OpenTargets, &request).unwrap();
        assert_eq!(cached, Some(targets()));
    }

    #[test]
    fn test_get_missing_is_none() {
        let (cache, _temp_dir) = create_test_cache(Ttl::DEFAULT);
        let cached: Option<Targets> = cache
            .get(CacheType::Ols, &CacheRequest::for_disease("never cached"))
            .unwrap();
        assert!(cached.is_none());
    }

    #[test]
    fn test_type_is_part_of_the_key() {
        let (cache, _temp_dir) = create_test_cache(Ttl::DEFAULT);
        let request = CacheRequest::for_disease("asthma");
        cache.put(CacheType::Ols, &request, "ols").unwrap();

        let other: Option<String> = cache.get(CacheType::OpenTargets, &request).unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn test_expired_entry_reads_as_miss_but_peek_sees_it() {
        let (cache, _temp_dir) = create_test_cache(Ttl::Seconds(0));
        let request = CacheRequest::new().param("go_id", "GO:0006281");
        cache.put(CacheType::Go, &request, "dna repair").unwrap();

        // Backdate so the zero TTL has certainly elapsed
        let key = derive_key(CacheType::Go, &request);
        let mut entry = cache.store().read(&key).unwrap().unwrap();
        entry.created_at = Utc::now() - Duration::seconds(5);
        cache.store().write(&entry).unwrap();

        let fresh: Option<String> = cache.get(CacheType::Go, &request).unwrap();
        assert!(fresh.is_none());

        let stale: CachedData<String> = cache.peek(CacheType::Go, &request).unwrap().unwrap();
        assert_eq!(stale.payload, "dna repair");
        assert!(stale.is_expired);
    }

    #[test]
    fn test_put_with_infinite_ttl_survives_short_global_ttl() {
        let (cache, _temp_dir) = create_test_cache(Ttl::Seconds(1));
        let request = CacheRequest::new().param("pathway", "KEGG_AUTOPHAGY");
        cache
            .put_with_ttl(CacheType::Gpt4, &request, &json!(["autophagy"]), Ttl::Infinite)
            .unwrap();

        let later = Utc::now() + Duration::days(3653);
        let key = derive_key(CacheType::Gpt4, &request);
        let entry = cache.store().read(&key).unwrap().unwrap();
        assert!(!cache.is_expired(&entry, later));
        assert_eq!(cache.clear_expired_at(later), 0);
    }

    #[test]
    fn test_overwrite_keeps_latest_payload() {
        let (cache, _temp_dir) = create_test_cache(Ttl::DEFAULT);
        let request = CacheRequest::for_disease("psoriasis");

        cache.put(CacheType::Ols, &request, "first").unwrap();
        let first = cache.list_all()[0].created_at;
        cache.put(CacheType::Ols, &request, "second").unwrap();

        let entries = cache.list_all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].payload, json!("second"));
        assert!(entries[0].created_at >= first);
    }

    #[test]
    fn test_wrong_payload_shape_is_a_miss() {
        let (cache, _temp_dir) = create_test_cache(Ttl::DEFAULT);
        let request = CacheRequest::new().param("list_id", "42");
        cache.put(CacheType::Enrichr, &request, "not a struct").unwrap();

        let cached: Option<Targets> = cache.get(CacheType::Enrichr, &request).unwrap();
        assert!(cached.is_none());
    }

    #[test]
    fn test_get_or_try_insert_with_computes_once() {
        let (cache, _temp_dir) = create_test_cache(Ttl::DEFAULT);
        let request = CacheRequest::for_disease("asthma");
        let mut calls = 0;

        let first: std::result::Result<Targets, String> =
            cache.get_or_try_insert_with(CacheType::OpenTargets, &request, || {
                calls += 1;
                Ok(targets())
            });
        assert_eq!(first.unwrap(), targets());

        let second: std::result::Result<Targets, String> =
            cache.get_or_try_insert_with(CacheType::OpenTargets, &request, || {
                calls += 1;
                Ok(targets())
            });
        assert_eq!(second.unwrap(), targets());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_get_or_try_insert_with_does_not_cache_errors() {
        let (cache, _temp_dir) = create_test_cache(Ttl::DEFAULT);
        let request = CacheRequest::for_disease("asthma");

        let result: std::result::Result<Targets, String> = cache
            .get_or_try_insert_with(CacheType::OpenTargets, &request, || {
                Err("upstream unavailable".to_string())
            });
        assert_eq!(result.unwrap_err(), "upstream unavailable");
        assert!(cache.list_all().is_empty());
    }

    #[test]
    fn test_clear_expired_honors_overrides() {
        let (cache, _temp_dir) = create_test_cache(Ttl::Seconds(1));
        write_aged(&cache, "a", 10, Some(Ttl::Seconds(5)));
        write_aged(&cache, "b", 10, Some(Ttl::Seconds(20)));
        write_aged(&cache, "c", 10, Some(Ttl::Infinite));

        assert_eq!(cache.clear_expired(), 1);
        let keys: Vec<String> = cache.list_all().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_clear_expired_with_infinite_global_ttl_keeps_everything() {
        let (cache, _temp_dir) = create_test_cache(Ttl::Infinite);
        write_aged(&cache, "old", 10 * 365 * 86_400, None);
        assert_eq!(cache.clear_expired(), 0);
        assert_eq!(cache.list_all().len(), 1);
    }

    #[test]
    fn test_clear_all_reports_count() {
        let (cache, _temp_dir) = create_test_cache(Ttl::DEFAULT);
        cache.put(CacheType::Go, &CacheRequest::new().param("n", "1"), &1).unwrap();
        cache.put(CacheType::Ols, &CacheRequest::new().param("n", "2"), &2).unwrap();

        assert_eq!(cache.clear_all(), 2);
        assert_eq!(cache.clear_all(), 0);
    }

    #[test]
    fn test_open_rejects_file_path() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not_a_dir");
        std::fs::write(&file, "x").unwrap();

        let err = Cache::open(CacheConfig::new(&file)).unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfig(_)));
    }

    #[test]
    fn test_put_records_the_original_request() {
        let (cache, _temp_dir) = create_test_cache(Ttl::DEFAULT);
        let request = CacheRequest::for_disease("Asthma").genes(["TP53", "APOE"]);
        cache.put(CacheType::Enrichr, &request, "hits").unwrap();

        let entry = cache.list_all().remove(0);
        assert_eq!(
            entry.original_key.as_deref(),
            Some(r#"{"type":"enrichr","disease":"asthma","params":{"genes":"APOE,TP53"}}"#)
        );
        assert_eq!(cache.list_cache_items("APOE,TP53").len(), 1);
        assert!(cache.list_cache_items("psoriasis").is_empty());
    }

    #[test]
    fn test_preload_serves_fresh_entries_from_memory() {
        let (cache, temp_dir) = create_test_cache(Ttl::Seconds(60));
        let request = CacheRequest::for_disease("asthma");
        cache.put(CacheType::Ols, &request, "EFO_0000270").unwrap();
        write_aged(&cache, "go_stale", 120, None);

        assert_eq!(cache.preload(), 1);

        // Removing the record behind the cache's back leaves the preloaded copy
        let key = derive_key(CacheType::Ols, &request);
        std::fs::remove_file(temp_dir.path().join(format!("{key}.json"))).unwrap();
        let cached: Option<String> = cache.get(CacheType::Ols, &request).unwrap();
        assert_eq!(cached.as_deref(), Some("EFO_0000270"));
    }

    #[test]
    fn test_preloaded_entries_follow_puts_and_clears() {
        let (cache, _temp_dir) = create_test_cache(Ttl::DEFAULT);
        let request = CacheRequest::new().param("pathway", "R-HSA-1");
        cache.put(CacheType::Gpt4, &request, "first").unwrap();
        assert_eq!(cache.preload(), 1);

        cache.put(CacheType::Gpt4, &request, "second").unwrap();
        let cached: Option<String> = cache.get(CacheType::Gpt4, &request).unwrap();
        assert_eq!(cached.as_deref(), Some("second"));

        assert_eq!(cache.clear_cache_by_type(CacheType::Gpt4), 1);
        let cached: Option<String> = cache.get(CacheType::Gpt4, &request).unwrap();
        assert!(cached.is_none());
    }

    #[test]
    fn test_preload_of_empty_cache_loads_nothing() {
        let (cache, _temp_dir) = create_test_cache(Ttl::DEFAULT);
        assert_eq!(cache.preload(), 0);
    }

    #[test]
    fn test_clear_report_counts_skipped_records() {
        let (cache, temp_dir) = create_test_cache(Ttl::DEFAULT);
        cache.put(CacheType::Go, &CacheRequest::new().param("id", "1"), "x").unwrap();
        std::fs::write(temp_dir.path().join("go_broken.json"), "{oops").unwrap();

        let report = cache.clear(&EntryFilter::all());
        assert_eq!(
            report,
            ClearReport {
                cleared: 1,
                failed: 0,
                skipped: 1
            }
        );
        assert!(temp_dir.path().join("go_broken.json").exists());
    }

    #[test]
    fn test_put_propagates_storage_failure() {
        let (cache, temp_dir) = create_test_cache(Ttl::DEFAULT);
        // Replace the directory with a plain file after construction
        std::fs::remove_dir_all(temp_dir.path()).unwrap();
        std::fs::write(temp_dir.path(), "not a directory").unwrap();

        let err = cache
            .put(CacheType::Ols, &CacheRequest::for_disease("asthma"), "x")
            .unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));

        std::fs::remove_file(temp_dir.path()).unwrap();
        std::fs::create_dir(temp_dir.path()).unwrap();
    }

    #[test]
    fn test_get_propagates_storage_failure() {
        let (cache, temp_dir) = create_test_cache(Ttl::DEFAULT);
        let request = CacheRequest::for_disease("asthma");
        let key = derive_key(CacheType::Ols, &request);
        // A directory where the record should be cannot be read as a file
        std::fs::create_dir(temp_dir.path().join(format!("{key}.json"))).unwrap();

        let result: Result<Option<String>> = cache.get(CacheType::Ols, &request);
        assert!(matches!(result, Err(CacheError::Io { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_open_rejects_read_only_directory() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("read_only");
        std::fs::create_dir(&dir).unwrap();
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users bypass permission bits; nothing to check then
        if std::fs::write(dir.join("check"), "x").is_ok() {
            return;
        }

        let err = Cache::open(CacheConfig::new(&dir)).unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfig(_)));
        assert!(err.to_string().contains("not writable"));

        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_open_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("fresh").join("cache");
        let cache = Cache::open(CacheConfig::new(&dir)).unwrap();
        assert!(dir.is_dir());
        assert_eq!(cache.cache_dir(), dir.as_path());
    }
}
