use std::fmt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Opaque task identifier handed out by the vendor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    /// Empty identifiers are not handles.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier with characters that are reserved in file names replaced
    /// by `_`, e.g. `sora-2:task_01` becomes `sora-2_task_01`.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| match c {
                ':' | '/' | '\\' | '<' | '>' | '"' | '|' | '?' | '*' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of a task creation response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEnvelope {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl CreateEnvelope {
    /// The task identifier, when the vendor sent a non-empty string or number.
    pub fn handle(&self) -> Option<TaskHandle> {
        match self.id.as_ref()? {
            Value::String(s) => TaskHandle::new(s.as_str()),
            Value::Number(n) => TaskHandle::new(n.to_string()),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().and_then(error_text)
    }
}

/// Body of a status query response. The vendor has several shapes: flat
/// (`status`, `progress`, `video_url`), with a `detail` object carrying
/// `pending_info.progress_pct` and `url`, or wrapped in a `data` object.
/// A field of an unexpected type reads as absent; only malformed JSON fails.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusEnvelope {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub fail_reason: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default, deserialize_with = "nested_envelope")]
    pub data: Option<Box<StatusEnvelope>>,
}

impl StatusEnvelope {
    fn status_text(&self) -> Option<&str> {
        non_empty(self.status.as_deref())
            .or_else(|| self.detail_str("status"))
            .or_else(|| self.data.as_ref().and_then(|d| d.status_text()))
    }

    fn detail_str(&self, key: &str) -> Option<&str> {
        non_empty(self.detail.as_ref()?.get(key)?.as_str())
    }

    /// Progress in percent, clamped to 0..=100.
    pub fn progress(&self) -> Option<u8> {
        let top = self.progress.as_ref().and_then(number);
        let pending = || {
            self.detail
                .as_ref()?
                .get("pending_info")?
                .get("progress_pct")
                .and_then(number)
                .map(|pct| pct * 100.0)
        };
        let nested = || self.data.as_ref().and_then(|d| d.progress()).map(f64::from);

        top.or_else(pending)
            .or_else(nested)
            .map(|pct| pct.clamp(0.0, 100.0).round() as u8)
    }

    pub fn video_url(&self) -> Option<String> {
        non_empty(self.video_url.as_deref())
            .or_else(|| self.detail_str("url"))
            .map(str::to_string)
            .or_else(|| self.data.as_ref().and_then(|d| d.video_url()))
    }

    pub fn failure_detail(&self) -> Option<String> {
        non_empty(self.fail_reason.as_deref())
            .map(str::to_string)
            .or_else(|| self.error.as_ref().and_then(error_text))
            .or_else(|| self.data.as_ref().and_then(|d| d.failure_detail()))
    }
}

/// Normalized task state. Everything outside this module matches on this
/// instead of probing vendor JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Pending { progress: Option<u8> },
    Completed { video_url: Option<String> },
    Failed { detail: Option<String> },
    Unrecognized { raw: String },
}

impl TaskStatus {
    pub fn from_envelope(env: &StatusEnvelope) -> Self {
        let Some(status) = env.status_text() else {
            // No status at all but an explicit error means the task is gone.
            return match env.failure_detail() {
                Some(detail) => Self::Failed { detail: Some(detail) },
                None => Self::Unrecognized { raw: String::new() },
            };
        };

        match status.to_ascii_lowercase().as_str() {
            "completed" | "success" | "succeeded" => Self::Completed {
                video_url: env.video_url(),
            },
            "failed" | "failure" | "error" => Self::Failed {
                detail: env.failure_detail(),
            },
            "queued" => Self::Queued,
            "pending" | "processing" | "in_progress" | "running" => Self::Pending {
                progress: env.progress(),
            },
            _ => Self::Unrecognized { raw: status.to_string() },
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Pending { .. } => "pending",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Unrecognized { raw } if raw.is_empty() => "unknown",
            Self::Unrecognized { raw } => raw.as_str(),
        }
    }
}

/// A parsed status response together with the raw body it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub status: TaskStatus,
    pub progress: Option<u8>,
    pub raw: Value,
}

impl StatusReport {
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        let raw: Value = serde_json::from_slice(body)?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> serde_json::Result<Self> {
        let envelope = StatusEnvelope::deserialize(&raw)?;
        Ok(Self {
            status: TaskStatus::from_envelope(&envelope),
            progress: envelope.progress(),
            raw,
        })
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Reads any JSON value and keeps it only if it has the expected type.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| T::deserialize(v).ok()))
}

fn nested_envelope<'de, D>(deserializer: D) -> Result<Option<Box<StatusEnvelope>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(v @ Value::Object(_)) => Ok(StatusEnvelope::deserialize(v).ok().map(Box::new)),
        _ => Ok(None),
    }
}

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

fn error_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => non_empty(Some(s)).map(str::to_string),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .and_then(|s| non_empty(Some(s)))
            .map(str::to_string),
        _ => None,
    }
}
