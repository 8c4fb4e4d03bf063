pub mod error;
pub mod job;
pub mod request;
pub mod status;
mod model_types;

pub use job::{JobResult, JobStatus, Stage};
pub use model_types::{ClipDuration, FrameSize, Orientation, VideoModel};
pub use request::{GenerationRequest, ReferenceImage};
pub use status::{CreateEnvelope, StatusEnvelope, StatusReport, TaskHandle, TaskStatus};
