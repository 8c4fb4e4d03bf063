use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::status::TaskHandle;

/// Terminal outcome of one workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Completed,
    Failed,
    TimedOut,
}

impl JobStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn icon(&self) -> &str {
        match self {
            Self::Completed => "✅",
            Self::Failed => "❌",
            Self::TimedOut => "⏱",
        }
    }
}

/// Workflow stage a job stopped at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Submit,
    Poll,
    Download,
}

/// Final record of one job. Built once by the workflow that ran it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobResult {
    pub index: usize,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    pub task_id: Option<TaskHandle>,
    pub video_url: Option<String>,
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Last status body the vendor returned for this task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl JobResult {
    pub fn completed(
        index: usize,
        task_id: TaskHandle,
        video_url: String,
        output_path: PathBuf,
        response: Value,
    ) -> Self {
        Self {
            index,
            status: JobStatus::Completed,
            failed_stage: None,
            task_id: Some(task_id),
            video_url: Some(video_url),
            output_path: Some(output_path),
            error: None,
            response: Some(response),
        }
    }

    /// Nothing was submitted, so there is no task to refer to.
    pub fn rejected(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            status: JobStatus::Failed,
            failed_stage: Some(Stage::Submit),
            task_id: None,
            video_url: None,
            output_path: None,
            error: Some(error.into()),
            response: None,
        }
    }

    pub fn failed(
        index: usize,
        stage: Stage,
        task_id: TaskHandle,
        video_url: Option<String>,
        error: impl Into<String>,
        response: Option<Value>,
    ) -> Self {
        Self {
            index,
            status: JobStatus::Failed,
            failed_stage: Some(stage),
            task_id: Some(task_id),
            video_url,
            output_path: None,
            error: Some(error.into()),
            response,
        }
    }

    pub fn timed_out(index: usize, task_id: TaskHandle, error: impl Into<String>) -> Self {
        Self {
            index,
            status: JobStatus::TimedOut,
            failed_stage: Some(Stage::Poll),
            task_id: Some(task_id),
            video_url: None,
            output_path: None,
            error: Some(error.into()),
            response: None,
        }
    }

    /// The worker running the job died before it could report.
    pub fn aborted(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            status: JobStatus::Failed,
            failed_stage: None,
            task_id: None,
            video_url: None,
            output_path: None,
            error: Some(error.into()),
            response: None,
        }
    }

    /// One human readable summary line.
    pub fn summary_line(&self) -> String {
        match (self.status, &self.output_path) {
            (JobStatus::Completed, Some(path)) => format!(
                "{} job {}: completed - {}",
                self.status.icon(),
                self.index,
                path.display()
            ),
            _ => format!(
                "{} job {}: {} at {} stage - {}",
                self.status.icon(),
                self.index,
                match self.status {
                    JobStatus::TimedOut => "timed out",
                    _ => "failed",
                },
                self.failed_stage.map(Stage::as_str).unwrap_or("unknown"),
                self.error.as_deref().unwrap_or("no result")
            ),
        }
    }
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Poll => "poll",
            Self::Download => "download",
        }
    }
}
