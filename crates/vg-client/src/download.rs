use std::path::{Path, PathBuf};
use std::time::Duration;
use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use vg_core::TaskHandle;
use crate::error::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_EXTENSION: &str = "mp4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub bytes: u64,
}

impl DownloadedFile {
    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / 1024.0 / 1024.0
    }
}

/// Fetches finished videos into one output directory. Asset URLs are
/// pre-signed by the vendor, so no credentials are sent.
#[derive(Debug, Clone)]
pub struct Downloader {
    http: Client,
    output_dir: PathBuf,
}

impl Downloader {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_read_timeout(output_dir, READ_TIMEOUT)
    }

    /// A transfer that sends nothing for `read_timeout` is abandoned.
    pub fn with_read_timeout(output_dir: impl Into<PathBuf>, read_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .pool_max_idle_per_host(0)
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(read_timeout)
            .build()?;
        Ok(Self { http, output_dir: output_dir.into() })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Streams `url` into `<output_dir>/<task>_<nanos>.<ext>`. Anything but
    /// HTTP 200 is a failure and leaves no file behind.
    pub async fn download(&self, url: &str, handle: &TaskHandle) -> Result<DownloadedFile> {
        let parsed = parse_asset_url(url)?;
        let mut resp = self.http.get(parsed.clone()).send().await?;
        if resp.status() != StatusCode::OK {
            warn!(task_id = %handle, status = resp.status().as_u16(), %url, "download rejected");
            return Err(Error::DownloadFailed { status: resp.status().as_u16() });
        }

        fs::create_dir_all(&self.output_dir).await?;
        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let path = self.output_dir.join(file_name_for(handle, &parsed, stamp));

        let mut file = File::options().write(true).create_new(true).open(&path).await?;
        let written = async {
            let mut bytes = 0u64;
            while let Some(chunk) = resp.chunk().await? {
                file.write_all(&chunk).await?;
                bytes += chunk.len() as u64;
            }
            file.flush().await?;
            Ok::<u64, Error>(bytes)
        }
        .await;

        match written {
            Ok(bytes) => {
                let file = DownloadedFile { path, bytes };
                info!(task_id = %handle, path = %file.path.display(), megabytes = file.megabytes(), "video saved");
                Ok(file)
            }
            Err(err) => {
                drop(file);
                if let Err(rm) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %rm, "could not remove partial download");
                }
                Err(err)
            }
        }
    }
}

fn parse_asset_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim()).map_err(|e| Error::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(Error::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

/// File name for a downloaded asset: sanitized task id, timestamp, and the
/// extension of the URL path (`mp4` when there is none).
pub fn file_name_for(handle: &TaskHandle, url: &Url, stamp: i64) -> String {
    let ext = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    format!("{}_{stamp}.{ext}", handle.file_stem())
}
