use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use vg_client::{ApiFlavor, PollSettings};
use vg_core::{ClipDuration, FrameSize, GenerationRequest, Orientation, ReferenceImage, VideoModel};

pub const DEFAULT_API_BASE: &str = "https://api.vectorengine.ai";

/// Command line for the `vidgen` binary.
///
/// Every global option can also come from a `VG_*` environment variable or a
/// `.env` file in the working directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "vidgen", version, about = "Generate videos through the vendor video API")]
pub struct CliArgs {
    /// Base URL of the vendor API.
    #[arg(long, env = "VG_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    pub api_base: String,

    /// API key sent as a bearer token. Required.
    #[arg(long, env = "VG_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Endpoint layout: `unified` (JSON) or `videos` (multipart).
    /// Defaults to `videos` for `run` and `unified` for `batch`.
    #[arg(long, env = "VG_API_FLAVOR", global = true)]
    pub flavor: Option<ApiFlavor>,

    /// Seconds between status queries. Defaults to 10 for `run` and 3 for
    /// `batch`.
    #[arg(long, env = "VG_POLL_INTERVAL_SECS", global = true)]
    pub poll_interval_secs: Option<u64>,

    /// Give up on a task after this many seconds. `0` waits forever.
    #[arg(long, env = "VG_TIMEOUT_SECS", default_value_t = 600, global = true)]
    pub timeout_secs: u64,

    /// Where downloaded videos go.
    #[arg(long, env = "VG_OUTPUT_DIR", default_value = "output", global = true)]
    pub output_dir: PathBuf,

    /// Where `job_<n>.json` and `all_results.json` go.
    #[arg(long, env = "VG_RESULTS_DIR", default_value = ".", global = true)]
    pub results_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a single video.
    Run(GenerateArgs),
    /// Generate several videos from the same request concurrently.
    Batch(BatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// What the video should show.
    pub prompt: String,

    /// Reference image: an http(s) URL or a local file path.
    #[arg(long)]
    pub image: Option<String>,

    /// Clip length, `10` or `15` seconds.
    #[arg(long, default_value = "10")]
    pub duration: ClipDuration,

    /// Frame size, e.g. `1280x720`, `720x1280`, `large`, `small`.
    #[arg(long, default_value = "1280x720")]
    pub size: FrameSize,

    #[arg(long, default_value = "portrait")]
    pub orientation: Orientation,

    #[arg(long)]
    pub watermark: bool,

    #[arg(long, default_value = "sora-2")]
    pub model: VideoModel,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Number of jobs to launch.
    #[arg(long, env = "VG_JOBS", default_value_t = 4)]
    pub jobs: usize,

    /// Jobs allowed to run at once. Defaults to `--jobs`.
    #[arg(long, env = "VG_WORKERS")]
    pub workers: Option<usize>,

    #[command(flatten)]
    pub request: GenerateArgs,
}

impl GenerateArgs {
    fn into_request(self) -> GenerationRequest {
        let mut request = GenerationRequest::new(self.prompt)
            .with_duration(self.duration)
            .with_size(self.size)
            .with_orientation(self.orientation)
            .with_watermark(self.watermark);
        request.model = self.model;
        if let Some(image) = self.image.as_deref() {
            request = request.with_reference(ReferenceImage::parse(image));
        }
        request
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Single(GenerationRequest),
    Batch {
        request: GenerationRequest,
        jobs: usize,
        workers: usize,
    },
}

/// Validated settings the commands run with.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub api_key: String,
    pub flavor: ApiFlavor,
    pub poll: PollSettings,
    pub output_dir: PathBuf,
    pub results_dir: PathBuf,
    pub mode: Mode,
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let api_key = match args.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => bail!("VG_API_KEY is not set; pass --api-key or add it to .env"),
        };

        let (mode, default_flavor, default_interval) = match args.command {
            Command::Run(generate) => (Mode::Single(generate.into_request()), ApiFlavor::Videos, 10),
            Command::Batch(batch) => {
                if batch.jobs == 0 {
                    bail!("VG_JOBS must be greater than 0");
                }
                let workers = batch.workers.unwrap_or(batch.jobs);
                if workers == 0 {
                    bail!("VG_WORKERS must be greater than 0");
                }
                let mode = Mode::Batch {
                    request: batch.request.into_request(),
                    jobs: batch.jobs,
                    workers,
                };
                (mode, ApiFlavor::Unified, 3)
            }
        };

        let interval = args.poll_interval_secs.unwrap_or(default_interval);
        if interval == 0 {
            bail!("VG_POLL_INTERVAL_SECS must be greater than 0");
        }
        let timeout = match args.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            api_base: args.api_base,
            api_key,
            flavor: args.flavor.unwrap_or(default_flavor),
            poll: PollSettings::new(Duration::from_secs(interval), timeout),
            output_dir: args.output_dir,
            results_dir: args.results_dir,
            mode,
        })
    }
}
