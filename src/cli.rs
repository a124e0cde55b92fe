//! Command-line interface for managing the cache
//!
//! Parses arguments with clap and runs the analyze, list and clear commands
//! against a `Cache`. Global flags override `CACHE_DIR` / `CACHE_TTL`.

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::cache::{format_size, Cache, CacheType, ClearReport, EntryFilter, StoredEntry, Ttl};
use crate::config::{CacheConfig, CACHE_TTL_VAR};
use crate::error::CacheError;

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified cache type is not recognized
    #[error("Invalid cache type: '{0}'. Valid types: enrichr, ols, opentargets, go, gpt4, other")]
    InvalidCacheType(String),

    /// `clear` was run without choosing what to clear
    #[error("No clear option specified. Use --expired, --disease, --type, or --all")]
    NoClearTarget,

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Disease hallmarks cache manager - inspect, analyze and clear cached API responses
#[derive(Parser, Debug)]
#[command(name = "hallmark-cache")]
#[command(about = "Inspect, analyze and clear the disease hallmarks API cache")]
#[command(version)]
pub struct Cli {
    /// Cache directory path (default: CACHE_DIR env var or .cache)
    #[arg(long, global = true, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Cache TTL in seconds for expiry checks, -1 for never
    /// (default: CACHE_TTL env var or 86400)
    #[arg(long, global = true, value_name = "SECONDS", allow_hyphen_values = true)]
    pub ttl: Option<String>,

    /// Show debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze cache contents
    Analyze,
    /// List cache items
    List(ListArgs),
    /// Clear cache items
    Clear(ClearArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// List cache items for a specific disease
    #[arg(long)]
    pub disease: Option<String>,

    /// List cache items of a specific type
    #[arg(long = "type", value_name = "TYPE")]
    pub cache_type: Option<String>,

    /// List cache items whose original request contains PATTERN
    #[arg(long)]
    pub pattern: Option<String>,

    /// Show the original request, disease and TTL of each item
    #[arg(long, short = 'l')]
    pub long: bool,
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Clear expired cache items
    #[arg(long)]
    pub expired: bool,

    /// Clear cache items for a specific disease
    #[arg(long)]
    pub disease: Option<String>,

    /// Clear cache items of a specific type
    #[arg(long = "type", value_name = "TYPE")]
    pub cache_type: Option<String>,

    /// Clear all cache items
    #[arg(long)]
    pub all: bool,
}

/// Parses a cache type argument, accepting the historical aliases.
///
/// # Returns
/// * `Ok(CacheType)` if the string names a known type
/// * `Err(CliError::InvalidCacheType)` otherwise
pub fn parse_cache_type_arg(s: &str) -> Result<CacheType, CliError> {
    CacheType::from_label(s).ok_or_else(|| CliError::InvalidCacheType(s.to_string()))
}

impl Cli {
    /// Resolves the cache configuration from the process environment,
    /// with flags taking precedence
    pub fn cache_config(&self) -> Result<CacheConfig, CliError> {
        self.cache_config_with(|name| std::env::var(name).ok())
    }

    /// Resolves the cache configuration through `lookup`.
    ///
    /// A variable is only read when the matching flag is absent, so an
    /// invalid `CACHE_TTL` does not matter once `--ttl` is given.
    pub fn cache_config_with<F>(&self, lookup: F) -> Result<CacheConfig, CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CacheConfig::from_lookup(|name| {
            if name == CACHE_TTL_VAR && self.ttl.is_some() {
                None
            } else {
                lookup(name)
            }
        })?;
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(ttl) = &self.ttl {
            config.ttl = Ttl::parse(ttl)?;
        }
        Ok(config)
    }
}

/// Runs the parsed command, writing human-readable output to `out`
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<(), CliError> {
    let cache = Cache::open(cli.cache_config()?)?;
    writeln!(out, "Using cache directory: {}", cache.cache_dir().display())?;

    match &cli.command {
        Command::Analyze => write!(out, "{}", cache.get_analysis())?,
        Command::List(args) => list_command(&cache, args, out)?,
        Command::Clear(args) => clear_command(&cache, args, out)?,
    }
    Ok(())
}

fn list_command<W: Write>(cache: &Cache, args: &ListArgs, out: &mut W) -> Result<(), CliError> {
    let mut filter = EntryFilter::all();
    let mut scope = String::new();
    if let Some(type_arg) = &args.cache_type {
        let cache_type = parse_cache_type_arg(type_arg)?;
        filter = filter.with_type(cache_type);
        scope.push_str(&format!(" of type '{cache_type}'"));
    }
    if let Some(disease) = &args.disease {
        filter = filter.with_disease(disease);
        scope.push_str(&format!(" for disease '{disease}'"));
    }
    if let Some(pattern) = &args.pattern {
        filter = filter.with_pattern(pattern);
        scope.push_str(&format!(" matching '{pattern}'"));
    }

    let scan = cache.scan(&filter);
    if scan.entries.is_empty() {
        writeln!(out, "No cache items found{scope}")?;
    } else {
        writeln!(out, "Found {} cache items{scope}:", scan.entries.len())?;
        for item in &scan.entries {
            print_cache_item(cache, item, args.long, out)?;
        }
    }
    if scan.failures > 0 {
        writeln!(out, "Skipped {} unreadable cache items", scan.failures)?;
    }
    Ok(())
}

fn print_cache_item<W: Write>(
    cache: &Cache,
    stored: &StoredEntry,
    long: bool,
    out: &mut W,
) -> io::Result<()> {
    let item = &stored.entry;
    let expired = cache.is_expired(item, Utc::now());

    writeln!(out, "  - {}.json", item.key)?;
    writeln!(out, "    Type: {}", item.cache_type)?;
    writeln!(out, "    Size: {}", format_size(stored.size_bytes))?;
    writeln!(out, "    Timestamp: {}", item.created_at.to_rfc3339())?;
    writeln!(out, "    Expired: {}", if expired { "Yes" } else { "No" })?;
    if long {
        if let Some(original_key) = &item.original_key {
            writeln!(out, "    Key: {original_key}")?;
        }
        if let Some(disease) = &item.disease {
            writeln!(out, "    Disease: {disease}")?;
        }
        if let Some(ttl) = item.ttl_override {
            writeln!(out, "    TTL: {ttl}")?;
        }
    }
    writeln!(out)
}

fn clear_command<W: Write>(cache: &Cache, args: &ClearArgs, out: &mut W) -> Result<(), CliError> {
    let report = if args.expired {
        let report = cache.clear_expired_report(Utc::now());
        writeln!(out, "Cleared {} expired cache items", report.cleared)?;
        report
    } else if let Some(disease) = &args.disease {
        let report = cache.clear(&EntryFilter::all().with_disease(disease));
        writeln!(out, "Cleared {} cache items for disease '{disease}'", report.cleared)?;
        report
    } else if let Some(type_arg) = &args.cache_type {
        let cache_type = parse_cache_type_arg(type_arg)?;
        let report = cache.clear(&EntryFilter::all().with_type(cache_type));
        writeln!(out, "Cleared {} cache items of type '{cache_type}'", report.cleared)?;
        report
    } else if args.all {
        let report = cache.clear(&EntryFilter::all());
        writeln!(out, "Cleared {} cache items", report.cleared)?;
        report
    } else {
        return Err(CliError::NoClearTarget);
    };
    print_clear_leftovers(&report, out)?;
    Ok(())
}

fn print_clear_leftovers<W: Write>(report: &ClearReport, out: &mut W) -> io::Result<()> {
    if report.skipped > 0 {
        writeln!(out, "Skipped {} unreadable cache items", report.skipped)?;
    }
    if report.failed > 0 {
        writeln!(out, "Failed to delete {} cache items", report.failed)?;
    }
    Ok(())
}
