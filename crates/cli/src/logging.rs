//! `tracing` subscriber setup. Diagnostics go to stderr so stdout stays
//! parseable when `--json` is used.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

const QUIET_DIRECTIVES: &str = "warn";
const VERBOSE_DIRECTIVES: &str = "warn,checker=debug,github=debug,nprt=debug";

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_DIRECTIVES
    } else {
        QUIET_DIRECTIVES
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides `--verbose`.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(default_directives(verbose))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}
