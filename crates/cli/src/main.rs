//! `nprt` entry point.
//!
//! This binary is the composition root:
//!
//! 1. **Parse input** with `clap` and resolve it into [`config::Settings`].
//! 2. **Wire logging** to stderr through `tracing-subscriber`.
//! 3. **Construct infrastructure** ([`github::RestClient`]) and inject it into
//!    [`checker::Checker`].
//! 4. **Run one check** under a cancellation token that fires on SIGINT,
//!    SIGTERM, or when `--timeout` elapses, then render the report.
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | report printed |
//! | 1 | API, network, or timeout failure |
//! | 2 | invalid arguments |
//! | 3 | GitHub rate limit exhausted |
//! | 130 | interrupted |

mod args;
mod config;
mod logging;
mod render;
mod signals;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use checker::Checker;
use clap::Parser;
use github::{RestClient, DEFAULT_REQUEST_TIMEOUT};
use tracing::{debug, info};
use tracker::{ApiError, CancelSource, RetryPolicy};

use crate::args::Cli;
use crate::config::Settings;
use crate::render::Renderer;

/// Why a run did not produce a report.
#[derive(Debug)]
enum Failure {
    Usage(anyhow::Error),
    Api(ApiError),
    Timeout(Duration),
    Interrupted,
    Other(anyhow::Error),
}

impl Failure {
    fn exit_code(&self) -> u8 {
        match self {
            Failure::Usage(_) => 2,
            Failure::Api(e) if e.is_rate_limited() => 3,
            Failure::Api(_) | Failure::Timeout(_) | Failure::Other(_) => 1,
            Failure::Interrupted => 130,
        }
    }

    fn report(&self) {
        let mut stderr = std::io::stderr().lock();
        let _ = match self {
            Failure::Usage(e) | Failure::Other(e) => writeln!(stderr, "Error: {e:#}"),
            Failure::Timeout(limit) => {
                writeln!(stderr, "Error: timed out after {}s", limit.as_secs())
            }
            Failure::Interrupted => Ok(()),
            Failure::Api(e) => {
                let _ = writeln!(stderr, "Error: {e}");
                match retry_hint(e) {
                    Some(hint) => writeln!(stderr, "{hint}"),
                    None => Ok(()),
                }
            }
        };
    }
}

/// Rate-limit messages already carry their reset delay, so only immediate
/// retries get a hint.
fn retry_hint(error: &ApiError) -> Option<&'static str> {
    match error.retry_policy() {
        RetryPolicy::Retryable { after: None } => Some("This looks transient; try again shortly."),
        RetryPolicy::Retryable { after: Some(_) } | RetryPolicy::NonRetryable => None,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            failure.report();
            ExitCode::from(failure.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), Failure> {
    let settings = Settings::from_cli(cli).map_err(Failure::Usage)?;

    let client = RestClient::with_options(
        &settings.api_url,
        settings.token.as_deref(),
        DEFAULT_REQUEST_TIMEOUT,
    )
    .map_err(|e| Failure::Usage(e.into()))?;
    if !client.is_authenticated() {
        debug!("no GITHUB_TOKEN set, using anonymous access");
    }
    debug!(api = %client.base_url(), pr = %settings.pr, channels = settings.channels.len(), "starting check");

    let checker = Checker::new(Arc::new(client));

    let source = Arc::new(CancelSource::new());
    let interrupt = source.token();
    let cancel = interrupt.with_timeout(settings.timeout);
    let signal_task = tokio::spawn(signals::cancel_on_signal(Arc::clone(&source)));

    let outcome = checker
        .check_pr(&cancel, settings.pr, &settings.channels)
        .await;
    signal_task.abort();

    let status = match outcome {
        Ok(status) => status,
        Err(e) if e.is_cancelled() && interrupt.is_cancelled() => {
            info!("interrupted");
            return Err(Failure::Interrupted);
        }
        Err(e) if e.is_cancelled() => return Err(Failure::Timeout(settings.timeout)),
        Err(e) => return Err(Failure::Api(e)),
    };

    let stdout = std::io::stdout().lock();
    let mut renderer = Renderer::new(stdout, settings.color, settings.hyperlinks);
    let rendered = if settings.json {
        renderer.render_json(&status)
    } else {
        renderer.render_table(&status)
    };
    rendered.map_err(Failure::Other)
}
