use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use vg_client::{ApiClient, Console, Downloader, FanOut, Workflow};
use vg_core::JobResult;

use crate::config::{AppConfig, Mode};

/// Runs the configured command and returns every job's result in job order.
pub async fn execute(config: AppConfig, console: Console) -> anyhow::Result<Vec<JobResult>> {
    let client = ApiClient::new(&config.api_base, &config.api_key).context("could not set up the API client")?;
    let downloader = Downloader::new(&config.output_dir).context("could not set up the downloader")?;
    let workflow = Workflow::new(client, config.flavor, config.poll, downloader, console)
        .with_results_dir(&config.results_dir);

    let results = match config.mode {
        Mode::Single(request) => vec![workflow.run(1, &request).await],
        Mode::Batch { request, jobs, workers } => {
            info!(jobs, workers, flavor = %config.flavor, "starting batch");
            FanOut::new(Arc::new(workflow), workers)
                .run(vec![request; jobs])
                .await
        }
    };
    Ok(results)
}
