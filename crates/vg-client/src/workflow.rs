use std::path::PathBuf;
use tracing::{info, info_span, warn, Instrument};
use vg_core::{GenerationRequest, JobResult, Stage};
use crate::console::{Console, JobConsole};
use crate::download::Downloader;
use crate::error::Error;
use crate::http::{ApiClient, ApiFlavor};
use crate::poll::{PollOutcome, PollSettings, Poller};
use crate::report;
use crate::submit::submit;

/// Submit, poll, and download for one job, in that order. A failing stage
/// ends the job; nothing here is retried except status queries.
pub struct Workflow {
    client: ApiClient,
    flavor: ApiFlavor,
    poll: PollSettings,
    downloader: Downloader,
    console: Console,
    results_dir: Option<PathBuf>,
}

impl Workflow {
    pub fn new(
        client: ApiClient,
        flavor: ApiFlavor,
        poll: PollSettings,
        downloader: Downloader,
        console: Console,
    ) -> Self {
        Self {
            client,
            flavor,
            poll,
            downloader,
            console,
            results_dir: None,
        }
    }

    /// Also write each job's result to `<dir>/job_<index>.json`.
    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = Some(dir.into());
        self
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn results_dir(&self) -> Option<&PathBuf> {
        self.results_dir.as_ref()
    }

    pub async fn run(&self, index: usize, request: &GenerationRequest) -> JobResult {
        let out = self.console.job(index);
        let result = self
            .execute(index, request, &out)
            .instrument(info_span!("job", index))
            .await;

        if let Some(dir) = &self.results_dir {
            match report::write_job_result(dir, &result).await {
                Ok(path) => out.say(format!("result saved to {}", path.display())),
                Err(err) => warn!(job = index, error = %err, "could not save job result"),
            }
        }
        result
    }

    async fn execute(&self, index: usize, request: &GenerationRequest, out: &JobConsole) -> JobResult {
        out.say(format!(
            "submitting {} ({}, {}) via {} endpoint",
            request.model.name(),
            request.duration,
            request.size,
            self.flavor
        ));
        let handle = match submit(&self.client, self.flavor, request).await {
            Ok(handle) => handle,
            Err(err) => {
                warn!(error = %err, "submission failed");
                out.say(format!("submission failed: {err}"));
                return JobResult::rejected(index, err.to_string());
            }
        };
        out.say(format!("task submitted: {handle}"));

        let outcome = Poller::new(&self.client, self.flavor, self.poll)
            .wait(&handle, out)
            .await;
        let (video_url, response) = match outcome {
            PollOutcome::Completed { video_url: Some(url), response, .. } => (url, response),
            PollOutcome::Completed { response, .. } => {
                out.say("task completed but returned no video url");
                return JobResult::failed(
                    index,
                    Stage::Poll,
                    handle,
                    None,
                    Error::MissingVideoUrl.to_string(),
                    Some(response),
                );
            }
            PollOutcome::Failed { detail, response, .. } => {
                let err = Error::TaskFailed { detail };
                out.say(&err);
                return JobResult::failed(index, Stage::Poll, handle, None, err.to_string(), Some(response));
            }
            PollOutcome::TimedOut { elapsed, .. } => {
                let err = Error::TaskTimedOut { elapsed };
                return JobResult::timed_out(index, handle, err.to_string());
            }
        };

        out.say(format!("downloading {video_url}"));
        match self.downloader.download(&video_url, &handle).await {
            Ok(file) => {
                out.say(format!("saved {} ({:.2} MB)", file.path.display(), file.megabytes()));
                info!(task_id = %handle, "job completed");
                JobResult::completed(index, handle, video_url, file.path, response)
            }
            Err(err) => {
                out.say(format!("download failed: {err}"));
                JobResult::failed(index, Stage::Download, handle, Some(video_url), err.to_string(), Some(response))
            }
        }
    }
}
