mod commands;
mod config;

use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vg_client::report::render_summary;
use vg_client::Console;

use crate::config::{AppConfig, CliArgs, Mode};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let dotenv = dotenvy::dotenv();
    let args = CliArgs::parse();
    init_tracing();
    if let Err(err) = dotenv {
        if !err.not_found() {
            warn!(error = %err, "could not read .env");
        }
    }

    let config = AppConfig::try_from(args)?;
    let jobs = match &config.mode {
        Mode::Single(_) => 1,
        Mode::Batch { jobs, .. } => *jobs,
    };
    info!(
        api_base = %config.api_base,
        flavor = %config.flavor,
        jobs,
        interval_secs = config.poll.interval.as_secs(),
        timeout_secs = config.poll.timeout.map(|t| t.as_secs()).unwrap_or(0),
        "starting"
    );

    let console = Console::stdout();
    let results = commands::execute(config, console.clone()).await?;
    console.println(render_summary(&results).trim_end());

    if results.iter().all(|r| r.status.is_success()) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Logs go to stderr so they never mix with the progress lines on stdout.
/// `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
