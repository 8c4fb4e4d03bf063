use std::sync::Arc;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use vg_core::{GenerationRequest, JobResult};
use crate::report;
use crate::workflow::Workflow;

/// Runs independent workflows side by side on a bounded pool and gathers
/// their results in job order.
pub struct FanOut {
    workflow: Arc<Workflow>,
    workers: usize,
}

impl FanOut {
    pub fn new(workflow: Arc<Workflow>, workers: usize) -> Self {
        Self { workflow, workers: workers.max(1) }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs one workflow per request. Jobs are numbered from 1 in the order
    /// given; the returned list follows that numbering, not completion order.
    pub async fn run(&self, requests: Vec<GenerationRequest>) -> Vec<JobResult> {
        let total = requests.len();
        let permits = Arc::new(Semaphore::new(self.workers));
        info!(jobs = total, workers = self.workers, "starting jobs");

        let mut running: FuturesUnordered<_> = requests
            .into_iter()
            .enumerate()
            .map(|(i, request)| {
                let index = i + 1;
                let workflow = Arc::clone(&self.workflow);
                let permits = Arc::clone(&permits);
                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await.ok();
                    workflow.run(index, &request).await
                })
                .map(move |joined| (index, joined))
            })
            .collect();

        let mut results = Vec::with_capacity(total);
        while let Some((index, joined)) = running.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(err) => {
                    error!(job = index, error = %err, "worker died");
                    let result = JobResult::aborted(index, format!("worker died: {err}"));
                    if let Some(dir) = self.workflow.results_dir() {
                        if let Err(err) = report::write_job_result(dir, &result).await {
                            warn!(job = index, error = %err, "could not save job result");
                        }
                    }
                    result
                }
            };
            info!(job = index, status = ?result.status, done = results.len() + 1, total, "job finished");
            results.push(result);
        }

        results.sort_by_key(|r| r.index);

        if let Some(dir) = self.workflow.results_dir() {
            match report::write_aggregate(dir, &results).await {
                Ok(path) => self
                    .workflow
                    .console()
                    .println(format_args!("all results saved to {}", path.display())),
                Err(err) => warn!(error = %err, "could not save aggregate results"),
            }
        }
        results
    }
}
