//! Log setup for the binary
//!
//! Diagnostics go to stderr so command output on stdout stays clean.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
const DEFAULT_LEVEL: &str = "warn";

/// Filter used with `--verbose` when `RUST_LOG` is unset
const VERBOSE_LEVEL: &str = "hallmark_cache=debug";

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` selects debug output for
/// this crate.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { VERBOSE_LEVEL } else { DEFAULT_LEVEL };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
