use std::path::Path;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use vg_core::{CreateEnvelope, GenerationRequest, ReferenceImage, TaskHandle};
use crate::error::{snippet, Error, Result};
use crate::http::{ApiClient, ApiFlavor, FormPart, RequestBody};

/// Sends one creation request and returns the vendor's task handle.
pub async fn submit(client: &ApiClient, flavor: ApiFlavor, request: &GenerationRequest) -> Result<TaskHandle> {
    let body = creation_body(flavor, request).await?;
    let segments: &[&str] = match flavor {
        ApiFlavor::Unified => &["v1", "video", "create"],
        ApiFlavor::Videos => &["v1", "videos"],
    };

    let resp = client.post(segments, body).await?;
    if !resp.is_success() {
        let err = resp.api_error();
        warn!(%flavor, status = resp.status, "task creation rejected");
        return Err(err);
    }

    let envelope: CreateEnvelope = resp.json()?;
    let handle = envelope.handle().ok_or_else(|| Error::MissingTaskId {
        body: snippet(&resp.body),
    })?;
    info!(
        task_id = %handle,
        status = envelope.status.as_deref().unwrap_or("-"),
        "task created"
    );

    Ok(handle)
}

/// Request body for the creation endpoint of the given flavor.
pub async fn creation_body(flavor: ApiFlavor, request: &GenerationRequest) -> Result<RequestBody> {
    match flavor {
        ApiFlavor::Unified => unified_body(request).map(RequestBody::Json),
        ApiFlavor::Videos => videos_form(request).await.map(RequestBody::Multipart),
    }
}

fn unified_body(request: &GenerationRequest) -> Result<Value> {
    let mut body = Map::new();
    match &request.reference {
        Some(ReferenceImage::Url(url)) => {
            body.insert("images".into(), json!([url]));
        }
        Some(ReferenceImage::File(path)) => {
            return Err(Error::UnsupportedReference(format!(
                "{} is a local file; the unified endpoint only takes image URLs",
                path.display()
            )));
        }
        None => {}
    }
    body.insert("model".into(), json!(request.model.id()));
    body.insert("orientation".into(), json!(request.orientation.as_str()));
    body.insert("prompt".into(), json!(request.prompt));
    body.insert("size".into(), json!(request.size.as_str()));
    body.insert("duration".into(), json!(request.duration.seconds()));
    body.insert("watermark".into(), json!(request.watermark));
    Ok(Value::Object(body))
}

async fn videos_form(request: &GenerationRequest) -> Result<Vec<FormPart>> {
    let mut parts = vec![
        FormPart::text("model", request.model.id()),
        FormPart::text("prompt", request.prompt.as_str()),
        FormPart::text("seconds", request.duration.seconds().to_string()),
    ];

    match &request.reference {
        Some(ReferenceImage::File(path)) => {
            let bytes = tokio::fs::read(path).await?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "reference".to_string());
            parts.push(FormPart::file("input_reference", filename, guess_mime(path), bytes));
        }
        Some(ReferenceImage::Url(url)) => {
            return Err(Error::UnsupportedReference(format!(
                "{url} is a URL; the upload endpoint needs a local file"
            )));
        }
        None => {}
    }

    parts.push(FormPart::text("size", request.size.as_str()));
    Ok(parts)
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
