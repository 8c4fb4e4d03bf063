use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::Error;

/// Video models the vendor accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoModel {
    #[serde(rename = "sora-2")]
    Sora2,
}

impl VideoModel {
    /// Model name for display
    pub fn name(&self) -> &str {
        match self {
            Self::Sora2 => "Sora 2",
        }
    }

    /// Model ID for API communication
    pub fn id(&self) -> &str {
        match self {
            Self::Sora2 => "sora-2",
        }
    }

    /// All available models
    pub fn all() -> [VideoModel; 1] {
        [Self::Sora2]
    }
}

impl Default for VideoModel {
    fn default() -> Self {
        Self::Sora2
    }
}

impl FromStr for VideoModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|m| m.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid("model", s))
    }
}

impl fmt::Display for VideoModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Clip length. The vendor only renders 10 or 15 second clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipDuration {
    #[default]
    Ten,
    Fifteen,
}

impl ClipDuration {
    pub fn seconds(&self) -> u32 {
        match self {
            Self::Ten => 10,
            Self::Fifteen => 15,
        }
    }
}

impl TryFrom<u32> for ClipDuration {
    type Error = Error;

    fn try_from(secs: u32) -> Result<Self, Self::Error> {
        match secs {
            10 => Ok(Self::Ten),
            15 => Ok(Self::Fifteen),
            other => Err(Error::invalid("duration", other.to_string())),
        }
    }
}

impl FromStr for ClipDuration {
    type Err = Error;

    /// Accepts `10`, `15`, `10s` or `15s`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches('s');
        let secs: u32 = digits.parse().map_err(|_| Error::invalid("duration", s))?;
        Self::try_from(secs)
    }
}

impl fmt::Display for ClipDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.seconds())
    }
}

impl Serialize for ClipDuration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.seconds())
    }
}

/// Requested frame size. Pixel sizes are used by the upload endpoint, the
/// `large`/`small` tiers by the unified endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrameSize {
    #[default]
    #[serde(rename = "1280x720")]
    Landscape720,
    #[serde(rename = "720x1280")]
    Portrait720,
    #[serde(rename = "large")]
    Large,
    #[serde(rename = "small")]
    Small,
}

impl FrameSize {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Landscape720 => "1280x720",
            Self::Portrait720 => "720x1280",
            Self::Large => "large",
            Self::Small => "small",
        }
    }

    fn all() -> [FrameSize; 4] {
        [Self::Landscape720, Self::Portrait720, Self::Large, Self::Small]
    }
}

impl FromStr for FrameSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|size| size.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid("size", s))
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            _ => Err(Error::invalid("orientation", s)),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
