// In-process stand-in for the vendor API, bound to an ephemeral port.
#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use vg_client::{ApiClient, Console, Downloader, PollSettings};

pub const API_KEY: &str = "sk-test-key";
pub const VIDEO_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42fake-video-payload";

pub type Reply = (StatusCode, String);

pub struct StatusCall<'a> {
    pub task_id: &'a str,
    /// 1 for the first query of this task.
    pub poll: usize,
    pub base: &'a str,
}

type CreateFn = dyn Fn(usize) -> Reply + Send + Sync;
type StatusFn = dyn Fn(&StatusCall<'_>) -> Reply + Send + Sync;

#[derive(Debug, Clone)]
pub struct Captured {
    pub path: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

struct VendorState {
    base: OnceLock<String>,
    create: Box<CreateFn>,
    status: Box<StatusFn>,
    creates: Mutex<Vec<Captured>>,
    status_queries: Mutex<Vec<(String, Option<String>)>>,
    polls: Mutex<HashMap<String, usize>>,
    downloads: Mutex<Vec<String>>,
}

pub struct FakeVendor {
    pub base: String,
    state: Arc<VendorState>,
}

impl FakeVendor {
    pub async fn start(
        create: impl Fn(usize) -> Reply + Send + Sync + 'static,
        status: impl Fn(&StatusCall<'_>) -> Reply + Send + Sync + 'static,
    ) -> Self {
        let state = Arc::new(VendorState {
            base: OnceLock::new(),
            create: Box::new(create),
            status: Box::new(status),
            creates: Mutex::new(Vec::new()),
            status_queries: Mutex::new(Vec::new()),
            polls: Mutex::new(HashMap::new()),
            downloads: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/video/create", post(create_task))
            .route("/v1/videos", post(create_task))
            .route("/v1/video/query", get(query_unified))
            .route("/v1/videos/{id}", get(query_videos))
            .route("/files/{name}", get(serve_file))
            .route("/stall/{name}", get(stall_file))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let base = format!("http://{}", addr);
        state.base.set(base.clone()).unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base, state }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base, API_KEY).unwrap()
    }

    pub fn file_url(&self, name: &str) -> String {
        format!("{}/files/{}", self.base, name)
    }

    pub fn stalled_url(&self, name: &str) -> String {
        format!("{}/stall/{}", self.base, name)
    }

    pub fn creates(&self) -> Vec<Captured> {
        self.state.creates.lock().unwrap().clone()
    }

    /// `(task id, authorization header)` of every status query, in order.
    pub fn status_queries(&self) -> Vec<(String, Option<String>)> {
        self.state.status_queries.lock().unwrap().clone()
    }

    pub fn polls(&self, task_id: &str) -> usize {
        self.state.polls.lock().unwrap().get(task_id).copied().unwrap_or(0)
    }

    pub fn downloads(&self) -> Vec<String> {
        self.state.downloads.lock().unwrap().clone()
    }
}

async fn create_task(
    State(state): State<Arc<VendorState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let n = {
        let mut creates = state.creates.lock().unwrap();
        creates.push(Captured {
            path: String::new(),
            content_type: header_str(&headers, header::CONTENT_TYPE),
            authorization: header_str(&headers, header::AUTHORIZATION),
            body: body.to_vec(),
        });
        creates.len()
    };
    reply((state.create)(n))
}

async fn query_unified(
    State(state): State<Arc<VendorState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let id = params.get("id").cloned().unwrap_or_default();
    answer_status(&state, &headers, &id)
}

async fn query_videos(
    State(state): State<Arc<VendorState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    answer_status(&state, &headers, &id)
}

fn answer_status(state: &VendorState, headers: &HeaderMap, id: &str) -> Response {
    state
        .status_queries
        .lock()
        .unwrap()
        .push((id.to_string(), header_str(headers, header::AUTHORIZATION)));
    let poll = {
        let mut polls = state.polls.lock().unwrap();
        let count = polls.entry(id.to_string()).or_insert(0);
        *count += 1;
        *count
    };
    let base = state.base.get().cloned().unwrap_or_default();
    reply((state.status)(&StatusCall { task_id: id, poll, base: &base }))
}

async fn serve_file(State(state): State<Arc<VendorState>>, Path(name): Path<String>) -> Response {
    state.downloads.lock().unwrap().push(name.clone());
    if name.starts_with("missing") {
        return (StatusCode::NOT_FOUND, "no such file").into_response();
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "video/mp4")],
        VIDEO_BYTES.to_vec(),
    )
        .into_response()
}

/// Sends the first bytes of a video, then never finishes the body.
async fn stall_file(State(state): State<Arc<VendorState>>, Path(name): Path<String>) -> Response {
    state.downloads.lock().unwrap().push(name);
    let head = futures::stream::once(async { Ok::<_, Infallible>(Bytes::copy_from_slice(&VIDEO_BYTES[..8])) });
    let body = Body::from_stream(head.chain(futures::stream::pending()));
    (StatusCode::OK, [(header::CONTENT_TYPE, "video/mp4")], body).into_response()
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

fn reply((status, body): Reply) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

pub fn ok(value: Value) -> Reply {
    (StatusCode::OK, value.to_string())
}

/// Creation handler that hands out `task-1`, `task-2`, ...
pub fn sequential_ids(n: usize) -> Reply {
    ok(json!({ "id": format!("task-{n}"), "object": "video", "status": "queued", "progress": 0 }))
}

pub fn pending(progress: u8) -> Reply {
    ok(json!({ "status": "pending", "progress": progress }))
}

pub fn completed(url: &str) -> Reply {
    ok(json!({ "status": "completed", "progress": 100, "video_url": url }))
}

pub fn fast_polling() -> PollSettings {
    PollSettings::new(Duration::from_millis(10), Some(Duration::from_secs(10)))
}

pub fn downloader(dir: &std::path::Path) -> Downloader {
    Downloader::new(dir.join("videos")).unwrap()
}

pub fn quiet() -> Console {
    Console::silent()
}
