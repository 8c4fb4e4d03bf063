use std::path::PathBuf;
use serde::Serialize;
use crate::model_types::{ClipDuration, FrameSize, Orientation, VideoModel};

/// Optional image the vendor animates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceImage {
    /// Already hosted somewhere the vendor can fetch it.
    Url(String),
    /// Local file uploaded as a multipart part.
    File(PathBuf),
}

impl ReferenceImage {
    /// Anything with an http(s) scheme is a URL, everything else a path.
    pub fn parse(value: &str) -> Self {
        let lower = value.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(value.to_string())
        } else {
            Self::File(PathBuf::from(value))
        }
    }
}

/// One generation job as submitted to the vendor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub model: VideoModel,
    pub prompt: String,
    pub reference: Option<ReferenceImage>,
    pub duration: ClipDuration,
    pub size: FrameSize,
    pub orientation: Orientation,
    pub watermark: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: VideoModel::default(),
            prompt: prompt.into(),
            reference: None,
            duration: ClipDuration::default(),
            size: FrameSize::default(),
            orientation: Orientation::default(),
            watermark: false,
        }
    }

    pub fn with_reference(mut self, reference: ReferenceImage) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_duration(mut self, duration: ClipDuration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_size(mut self, size: FrameSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_watermark(mut self, watermark: bool) -> Self {
        self.watermark = watermark;
        self
    }
}
