use std::time::Duration;
use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use vg_core::{StatusReport, TaskHandle, TaskStatus};
use crate::console::JobConsole;
use crate::error::{Error, Result};
use crate::http::{ApiClient, ApiFlavor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` polls until the vendor reports a terminal state.
    pub timeout: Option<Duration>,
}

impl PollSettings {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Some(Duration::from_secs(600)),
        }
    }
}

/// How a poll loop ended. `polls` counts status queries, so a task that
/// finishes on the third query was retried twice.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed { video_url: Option<String>, response: Value, polls: u32 },
    Failed { detail: Option<String>, response: Value, polls: u32 },
    TimedOut { elapsed: Duration, polls: u32 },
}

impl PollOutcome {
    pub fn polls(&self) -> u32 {
        match self {
            Self::Completed { polls, .. } | Self::Failed { polls, .. } | Self::TimedOut { polls, .. } => *polls,
        }
    }

    pub fn retries(&self) -> u32 {
        self.polls().saturating_sub(1)
    }
}

/// One status query.
pub async fn query_status(client: &ApiClient, flavor: ApiFlavor, handle: &TaskHandle) -> Result<StatusReport> {
    let resp = match flavor {
        ApiFlavor::Unified => {
            client
                .get(&["v1", "video", "query"], &[("id", handle.as_str())])
                .await?
        }
        ApiFlavor::Videos => client.get(&["v1", "videos", handle.as_str()], &[]).await?,
    };

    if !resp.is_success() {
        return Err(resp.api_error());
    }
    let raw: Value = resp.json()?;
    StatusReport::from_value(raw).map_err(|source| Error::ResponseParse {
        source,
        body: crate::error::snippet(&resp.body),
    })
}

pub struct Poller<'a> {
    client: &'a ApiClient,
    flavor: ApiFlavor,
    settings: PollSettings,
}

impl<'a> Poller<'a> {
    pub fn new(client: &'a ApiClient, flavor: ApiFlavor, settings: PollSettings) -> Self {
        Self { client, flavor, settings }
    }

    /// Queries `handle` until it completes, fails, or the time budget runs
    /// out. Transport and parse errors are logged and retried.
    pub async fn wait(&self, handle: &TaskHandle, out: &JobConsole) -> PollOutcome {
        let started = Instant::now();
        let mut polls = 0u32;
        out.say(format!(
            "polling {handle} every {}s",
            self.settings.interval.as_secs_f32()
        ));

        loop {
            let elapsed = started.elapsed();
            if let Some(limit) = self.settings.timeout {
                if elapsed >= limit {
                    warn!(task_id = %handle, polls, "gave up waiting for task");
                    out.say(format!("timed out after {}s", limit.as_secs()));
                    return PollOutcome::TimedOut { elapsed, polls };
                }
            }

            polls += 1;
            match query_status(self.client, self.flavor, handle).await {
                Ok(report) => {
                    debug!(task_id = %handle, status = report.status.label(), progress = ?report.progress, "status");
                    out.say(format!(
                        "[{}s] status: {} | progress: {}%",
                        elapsed.as_secs(),
                        report.status.label(),
                        report.progress.unwrap_or(0)
                    ));

                    match report.status {
                        TaskStatus::Completed { video_url } => {
                            info!(task_id = %handle, polls, "task completed");
                            return PollOutcome::Completed { video_url, response: report.raw, polls };
                        }
                        TaskStatus::Failed { detail } => {
                            warn!(task_id = %handle, polls, detail = detail.as_deref().unwrap_or("-"), "task failed");
                            return PollOutcome::Failed { detail, response: report.raw, polls };
                        }
                        TaskStatus::Queued | TaskStatus::Pending { .. } | TaskStatus::Unrecognized { .. } => {}
                    }
                }
                Err(err) => {
                    warn!(task_id = %handle, error = %err, "status query failed, retrying");
                    out.say(format!("status query failed, retrying: {err}"));
                }
            }

            let mut pause = self.settings.interval;
            if let Some(limit) = self.settings.timeout {
                pause = pause.min(limit.saturating_sub(started.elapsed()));
            }
            sleep(pause).await;
        }
    }
}
