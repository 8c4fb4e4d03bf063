use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("response is not valid JSON ({source}): {body}")]
    ResponseParse {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("response has no task id: {body}")]
    MissingTaskId { body: String },

    #[error("reference image not supported here: {0}")]
    UnsupportedReference(String),

    #[error("task failed: {}", .detail.as_deref().unwrap_or("no reason given"))]
    TaskFailed { detail: Option<String> },

    #[error("task did not finish within {}s", .elapsed.as_secs())]
    TaskTimedOut { elapsed: Duration },

    #[error("task completed without a video url")]
    MissingVideoUrl,

    #[error("download failed: HTTP {status}")]
    DownloadFailed { status: u16 },

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not encode JSON: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Keeps error messages readable when the vendor answers with an HTML page.
pub(crate) fn snippet(body: &[u8]) -> String {
    const MAX: usize = 512;
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{cut}…")
    }
}
