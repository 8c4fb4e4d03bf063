mod support;

use axum::http::StatusCode;
use serde_json::json;
use vg_client::http::RequestBody;
use vg_client::poll::query_status;
use vg_client::submit::submit;
use vg_client::{ApiClient, ApiFlavor, Error};
use vg_core::{ClipDuration, FrameSize, GenerationRequest, Orientation, ReferenceImage, TaskHandle, TaskStatus};

use support::{completed, ok, pending, sequential_ids, FakeVendor, API_KEY};

#[tokio::test]
async fn test_post_sends_json_with_bearer_token() {
    let vendor = FakeVendor::start(sequential_ids, |_| pending(0)).await;
    let client = vendor.client();

    let resp = client
        .post(&["v1", "video", "create"], RequestBody::Json(json!({ "prompt": "a cat" })))
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
    let creates = vendor.creates();
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0].authorization.as_deref(), Some(format!("Bearer {API_KEY}").as_str()));
    assert!(creates[0].content_type.as_deref().unwrap().starts_with("application/json"));
    assert_eq!(creates[0].json(), json!({ "prompt": "a cat" }));
}

#[tokio::test]
async fn test_unified_submit_returns_handle() {
    let vendor = FakeVendor::start(sequential_ids, |_| pending(0)).await;
    let request = GenerationRequest::new("a lighthouse at dusk")
        .with_reference(ReferenceImage::parse("https://img.example/ref.png"))
        .with_duration(ClipDuration::Fifteen)
        .with_size(FrameSize::Small)
        .with_orientation(Orientation::Landscape);

    let handle = submit(&vendor.client(), ApiFlavor::Unified, &request).await.unwrap();

    assert_eq!(handle.as_str(), "task-1");
    let body = vendor.creates()[0].json();
    assert_eq!(body["prompt"], "a lighthouse at dusk");
    assert_eq!(body["model"], "sora-2");
    assert_eq!(body["images"], json!(["https://img.example/ref.png"]));
    assert_eq!(body["duration"], 15);
    assert_eq!(body["orientation"], "landscape");
    assert_eq!(body["watermark"], false);
}

#[tokio::test]
async fn test_videos_submit_uploads_multipart_form() {
    let vendor = FakeVendor::start(sequential_ids, |_| pending(0)).await;
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("ref.png");
    std::fs::write(&image, b"\x89PNG-reference-bytes").unwrap();
    let request = GenerationRequest::new("waves").with_reference(ReferenceImage::File(image));

    let handle = submit(&vendor.client(), ApiFlavor::Videos, &request).await.unwrap();

    assert_eq!(handle.as_str(), "task-1");
    let capture = &vendor.creates()[0];
    assert!(capture
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("multipart/form-data; boundary="));
    let text = capture.body_text();
    assert!(text.contains("name=\"model\""));
    assert!(text.contains("sora-2"));
    assert!(text.contains("name=\"seconds\""));
    assert!(text.contains("name=\"input_reference\"; filename=\"ref.png\""));
    assert!(text.contains("image/png"));
    assert!(text.contains("PNG-reference-bytes"));
    assert!(text.contains("1280x720"));
}

#[tokio::test]
async fn test_missing_reference_file_fails_before_sending() {
    let vendor = FakeVendor::start(sequential_ids, |_| pending(0)).await;
    let request = GenerationRequest::new("waves")
        .with_reference(ReferenceImage::File("/definitely/not/here.png".into()));

    let err = submit(&vendor.client(), ApiFlavor::Videos, &request).await.unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert!(vendor.creates().is_empty());
}

#[tokio::test]
async fn test_response_without_id_is_an_error() {
    let vendor = FakeVendor::start(|_| ok(json!({ "status": "queued" })), |_| pending(0)).await;

    let err = submit(&vendor.client(), ApiFlavor::Unified, &GenerationRequest::new("x"))
        .await
        .unwrap_err();

    match err {
        Error::MissingTaskId { body } => assert!(body.contains("queued")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_submission_carries_vendor_message() {
    let vendor = FakeVendor::start(
        |_| {
            (
                StatusCode::UNAUTHORIZED,
                json!({ "error": { "message": "invalid api key", "type": "auth" } }).to_string(),
            )
        },
        |_| pending(0),
    )
    .await;

    let err = submit(&vendor.client(), ApiFlavor::Unified, &GenerationRequest::new("x"))
        .await
        .unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid api key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_creation_response() {
    let vendor = FakeVendor::start(|_| (StatusCode::OK, "<html>gateway</html>".into()), |_| pending(0)).await;

    let err = submit(&vendor.client(), ApiFlavor::Unified, &GenerationRequest::new("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ResponseParse { .. }));
}

#[tokio::test]
async fn test_status_query_routes_by_flavor() {
    let vendor = FakeVendor::start(sequential_ids, |call| {
        if call.task_id == "video_7" {
            completed("https://cdn.example/out.mp4")
        } else {
            pending(40)
        }
    })
    .await;
    let client = vendor.client();

    let unified = query_status(&client, ApiFlavor::Unified, &TaskHandle::new("sora-2:abc").unwrap())
        .await
        .unwrap();
    assert_eq!(unified.status, TaskStatus::Pending { progress: Some(40) });

    let videos = query_status(&client, ApiFlavor::Videos, &TaskHandle::new("video_7").unwrap())
        .await
        .unwrap();
    assert_eq!(
        videos.status,
        TaskStatus::Completed { video_url: Some("https://cdn.example/out.mp4".into()) }
    );

    let queries = vendor.status_queries();
    assert_eq!(queries[0].0, "sora-2:abc");
    assert_eq!(queries[1].0, "video_7");
    assert!(queries.iter().all(|(_, auth)| auth.as_deref() == Some("Bearer sk-test-key")));
}

#[tokio::test]
async fn test_unreachable_host_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(&format!("http://{addr}"), API_KEY).unwrap();
    let err = client.get(&["v1", "videos", "x"], &[]).await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
}

#[test]
fn test_invalid_base_url_is_rejected() {
    assert!(ApiClient::new("not a url", API_KEY).is_err());
}
