//! Client for the vendor video generation API: submit a task, poll it until
//! it settles, and download the finished video. [`FanOut`] runs many of
//! these workflows at once.

pub mod console;
pub mod download;
pub mod fanout;
pub mod http;
pub mod poll;
pub mod report;
pub mod submit;
pub mod workflow;
mod error;

pub use console::Console;
pub use download::{DownloadedFile, Downloader};
pub use error::{Error, Result};
pub use fanout::FanOut;
pub use http::{ApiClient, ApiFlavor};
pub use poll::{PollOutcome, PollSettings, Poller};
pub use workflow::Workflow;
