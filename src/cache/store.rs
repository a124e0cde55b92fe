//! Durable storage of cache entries
//!
//! Each entry lives in its own `<key>.json` file under the cache directory.
//! Writes go to a temporary file in the same directory which is then renamed
//! over the record, so readers in other processes never observe a partial
//! entry. Concurrent writers to one key race on last-write-wins.

use serde_json::Error as JsonError;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::entry::{CacheEntry, CacheType};
use super::key::normalize_disease;
use crate::error::{CacheError, Result};

/// Extension of record files; temporary files never carry it
const RECORD_EXTENSION: &str = "json";

/// Selects entries by type, disease and/or request text; empty matches
/// everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    cache_type: Option<CacheType>,
    disease: Option<String>,
    pattern: Option<String>,
}

impl EntryFilter {
    /// Filter that matches every entry
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to entries of the given type
    pub fn with_type(mut self, cache_type: CacheType) -> Self {
        self.cache_type = Some(cache_type);
        self
    }

    /// Restricts to entries tagged with the given disease (after normalization)
    pub fn with_disease(mut self, disease: &str) -> Self {
        self.disease = Some(normalize_disease(disease));
        self
    }

    /// Restricts to entries whose original request text contains `pattern`.
    ///
    /// Records without an `original_key` are matched on their key instead.
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    /// Whether an entry passes the filter
    pub fn matches(&self, entry: &CacheEntry) -> bool {
        let type_ok = self.cache_type.map_or(true, |t| entry.cache_type == t);
        let disease_ok = match &self.disease {
            None => true,
            Some(wanted) => entry.disease.as_deref() == Some(wanted.as_str()),
        };
        let pattern_ok = match &self.pattern {
            None => true,
            Some(pattern) => entry
                .original_key
                .as_deref()
                .unwrap_or(&entry.key)
                .contains(pattern.as_str()),
        };
        type_ok && disease_ok && pattern_ok
    }
}

/// An entry together with the size of its record on disk
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub entry: CacheEntry,
    pub size_bytes: u64,
}

/// Result of scanning the store
///
/// Records that could not be read or decoded are skipped and counted in
/// `failures` rather than aborting the scan.
#[derive(Debug, Default)]
pub struct Scan {
    pub entries: Vec<StoredEntry>,
    pub failures: usize,
}

/// Record files found in the cache directory
#[derive(Debug, Default)]
struct RecordPaths {
    /// Record paths in sorted order
    paths: Vec<PathBuf>,
    /// Directory entries that could not be read
    unreadable: usize,
}

impl RecordPaths {
    /// Collects record files from directory entries, skipping and counting
    /// entries that fail to read
    fn collect<I>(dir_entries: I) -> Self
    where
        I: IntoIterator<Item = io::Result<PathBuf>>,
    {
        let mut records = Self::default();
        for dir_entry in dir_entries {
            match dir_entry {
                Ok(path) => {
                    if path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
                        && path.is_file()
                    {
                        records.paths.push(path);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "skipping unreadable cache directory entry");
                    records.unreadable += 1;
                }
            }
        }
        records.paths.sort();
        records
    }
}

/// Why a single record could not be loaded
#[derive(Debug)]
enum LoadError {
    /// The file disappeared between listing and reading
    Vanished,
    Io(io::Error),
    Malformed(String),
}

impl From<JsonError> for LoadError {
    fn from(e: JsonError) -> Self {
        LoadError::Malformed(e.to_string())
    }
}

/// File-per-key store for cache entries
#[derive(Debug, Clone)]
pub struct EntryStore {
    /// Directory where record files are stored
    dir: PathBuf,
}

impl EntryStore {
    /// Creates a store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the records
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of the record for `key`, rejecting keys that are not
    /// plain file names
    fn record_path(&self, key: &str) -> Option<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| self.dir.join(format!("{key}.{RECORD_EXTENSION}")))
    }

    /// Ensures the store directory exists
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))
    }

    /// Lists record files in a stable (sorted) order
    fn record_paths(&self) -> io::Result<RecordPaths> {
        match fs::read_dir(&self.dir) {
            Ok(read_dir) => Ok(RecordPaths::collect(
                read_dir.map(|dir_entry| dir_entry.map(|e| e.path())),
            )),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(RecordPaths::default()),
            Err(e) => Err(e),
        }
    }

    /// Reads and decodes one record file
    fn load(path: &Path) -> std::result::Result<StoredEntry, LoadError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LoadError::Vanished),
            Err(e) => return Err(LoadError::Io(e)),
        };
        let entry: CacheEntry = serde_json::from_slice(&bytes)?;

        let stem = path.file_stem().and_then(|s| s.to_str());
        if stem != Some(entry.key.as_str()) {
            return Err(LoadError::Malformed(format!(
                "record key '{}' does not match its file name",
                entry.key
            )));
        }

        Ok(StoredEntry {
            entry,
            size_bytes: bytes.len() as u64,
        })
    }

    /// Reads the entry stored under `key`.
    ///
    /// Returns `Ok(None)` for a missing key and for a record that cannot be
    /// decoded. I/O failures other than "not found" are returned as errors.
    pub fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        let Some(path) = self.record_path(key) else {
            return Ok(None);
        };
        match Self::load(&path) {
            Ok(stored) => Ok(Some(stored.entry)),
            Err(LoadError::Vanished) => Ok(None),
            Err(LoadError::Io(e)) => Err(CacheError::io(path, e)),
            Err(LoadError::Malformed(reason)) => {
                warn!(key, %reason, "ignoring malformed cache record");
                Ok(None)
            }
        }
    }

    /// Writes `entry`, fully replacing any record under the same key
    pub fn write(&self, entry: &CacheEntry) -> Result<()> {
        let path = self
            .record_path(&entry.key)
            .ok_or_else(|| CacheError::InvalidKey(entry.key.clone()))?;
        self.ensure_dir()?;

        let json = serde_json::to_vec_pretty(entry).map_err(|e| CacheError::Encode {
            key: entry.key.clone(),
            source: e,
        })?;

        let mut tmp =
            NamedTempFile::new_in(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        tmp.write_all(&json)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| CacheError::io(&path, e.error))?;

        debug!(
            key = %entry.key,
            cache_type = %entry.cache_type,
            bytes = json.len(),
            "wrote cache record"
        );
        Ok(())
    }

    /// Deletes the record for `key`, returning whether anything was removed
    pub fn delete(&self, key: &str) -> Result<bool> {
        let Some(path) = self.record_path(key) else {
            return Ok(false);
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Scans every record matching `filter`, skipping unreadable ones
    pub fn scan(&self, filter: &EntryFilter) -> Scan {
        let mut scan = Scan::default();

        let records = match self.record_paths() {
            Ok(records) => records,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cannot list cache directory");
                scan.failures += 1;
                return scan;
            }
        };
        scan.failures += records.unreadable;

        for path in records.paths {
            match Self::load(&path) {
                Ok(stored) => {
                    if filter.matches(&stored.entry) {
                        scan.entries.push(stored);
                    }
                }
                Err(LoadError::Vanished) => {}
                Err(LoadError::Io(e)) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "skipping unreadable cache record"
                    );
                    scan.failures += 1;
                }
                Err(LoadError::Malformed(reason)) => {
                    warn!(path = %path.display(), %reason, "skipping malformed cache record");
                    scan.failures += 1;
                }
            }
        }

        scan
    }

    /// Lists the entries matching `filter`
    pub fn list(&self, filter: &EntryFilter) -> Vec<CacheEntry> {
        self.scan(filter)
            .entries
            .into_iter()
            .map(|stored| stored.entry)
            .collect()
    }

    /// Number of record files, readable or not
    pub fn count(&self) -> usize {
        self.record_paths()
            .map(|records| records.paths.len())
            .unwrap_or(0)
    }

    /// Total size of all record files in bytes
    pub fn total_size_bytes(&self) -> u64 {
        self.record_paths()
            .unwrap_or_default()
            .paths
            .iter()
            .filter_map(|path| fs::metadata(path).ok())
            .map(|meta| meta.len())
            .sum()
    }
}
