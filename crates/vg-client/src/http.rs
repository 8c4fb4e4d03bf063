use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use crate::error::{snippet, Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// The two endpoint layouts the vendor exposes for the same service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `POST /v1/video/create` with a JSON body, `GET /v1/video/query?id=`.
    Unified,
    /// `POST /v1/videos` with a multipart body, `GET /v1/videos/{id}`.
    Videos,
}

impl ApiFlavor {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unified => "unified",
            Self::Videos => "videos",
        }
    }
}

impl FromStr for ApiFlavor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unified" => Ok(Self::Unified),
            "videos" => Ok(Self::Videos),
            other => Err(format!("unknown API flavor {other:?} (expected unified or videos)")),
        }
    }
}

impl fmt::Display for ApiFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File { filename: String, mime: String, bytes: Vec<u8> },
}

impl FormPart {
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        Self { name: name.to_string(), value: PartValue::Text(value.into()) }
    }

    pub fn file(name: &str, filename: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            value: PartValue::File { filename: filename.into(), mime: mime.into(), bytes },
        }
    }
}

fn into_form(parts: Vec<FormPart>) -> Result<Form> {
    let mut form = Form::new();
    for part in parts {
        form = match part.value {
            PartValue::Text(text) => form.text(part.name, text),
            PartValue::File { filename, mime, bytes } => {
                let file = Part::bytes(bytes).file_name(filename).mime_str(&mime)?;
                form.part(part.name, file)
            }
        };
    }
    Ok(form)
}

/// Status code and body of one API call.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|source| Error::ResponseParse {
            source,
            body: snippet(&self.body),
        })
    }

    /// Non-success response turned into an error, preferring the vendor's
    /// own `error.message` over the raw body.
    pub fn api_error(&self) -> Error {
        let message = serde_json::from_slice::<Value>(&self.body)
            .ok()
            .and_then(|v| {
                let err = v.get("error")?;
                err.get("message")
                    .and_then(Value::as_str)
                    .or_else(|| err.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| snippet(&self.body));
        Error::Api { status: self.status, message }
    }
}

/// Issues single authenticated requests against the vendor API. Idle
/// connections are never kept, so every call opens a fresh one.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| Error::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidUrl {
                url: base_url.to_string(),
                reason: "not a base URL".into(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&bearer(api_key))
            .map_err(|_| Error::Config("API key contains characters not allowed in a header".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(0)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Base URL extended by already-split path segments, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn send(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: RequestBody,
    ) -> Result<RawResponse> {
        let url = self.endpoint(segments);
        debug!(%method, %url, "api request");

        let mut req = self.http.request(method.clone(), url.clone());
        if !query.is_empty() {
            req = req.query(query);
        }
        req = match body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.json(&value),
            RequestBody::Multipart(parts) => req.multipart(into_form(parts)?),
        };

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        debug!(%method, %url, status, bytes = body.len(), "api response");

        Ok(RawResponse { status, body })
    }

    pub async fn get(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<RawResponse> {
        self.send(Method::GET, segments, query, RequestBody::Empty).await
    }

    pub async fn post(&self, segments: &[&str], body: RequestBody) -> Result<RawResponse> {
        self.send(Method::POST, segments, &[], body).await
    }
}

fn bearer(api_key: &str) -> String {
    let key = api_key.trim();
    match key.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => format!("Bearer {}", key[7..].trim()),
        _ => format!("Bearer {key}"),
    }
}
