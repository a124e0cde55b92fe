//! Disease hallmarks cache manager - inspect, analyze and clear the API cache
//!
//! Reads `CACHE_DIR` and `CACHE_TTL` from the environment (or a `.env` file),
//! overridable with `--cache-dir` and `--ttl`.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use hallmark_cache::cli::{run, Cli};
use hallmark_cache::logging::init_logging;

fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut stdout = io::stdout().lock();
    match run(&cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
