//! The HTTP front end, driven through the router without a socket.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use office_service::server::router;
use office_service::service::Service;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

async fn call(app: &Router, method: &str, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call(app, "POST", uri, body.to_string()).await
}

#[tokio::test]
async fn test_health() {
    let app = router(Service::new());
    let (status, body) = call(&app, "GET", "/health", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_create_then_read_workbook() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sales.xlsx");
    let app = router(Service::new());

    let (status, body) = post(
        &app,
        "/excel/create",
        json!({
            "file_path": path,
            "sheets": [{"name": "Q1", "headers": ["Region", "Total"], "rows": [["North", 12], ["South", 7.5]]}]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (status, body) = post(&app, "/excel/read", json!({"file_path": path})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["sheets"]["Q1"]["rows"],
        json!([["Region", "Total"], ["North", "12"], ["South", "7.5"]])
    );
}

#[tokio::test]
async fn test_unknown_operation_is_404() {
    let app = router(Service::new());
    let (status, body) = post(&app, "/excel/add_slide", json!({"file_path": "x.xlsx"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "UNKNOWN_OPERATION");
    assert_eq!(body["status"], "error");

    let (status, _) = post(&app, "/visio/read", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let app = router(Service::new());
    let (status, body) = call(&app, "POST", "/word/read", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");

    let (status, body) = post(&app, "/word/read", json!({"path": "a.docx"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_missing_file_is_404() {
    let dir = TempDir::new().unwrap();
    let app = router(Service::new());
    let (status, body) = post(
        &app,
        "/pptx/read",
        json!({"file_path": dir.path().join("missing.pptx")}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_out_of_range_slide_is_400() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deck.pptx");
    let app = router(Service::new());
    let (status, _) = post(
        &app,
        "/pptx/create",
        json!({"file_path": path, "slides": [{"title": "Only"}]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(
        &app,
        "/pptx/delete_slide",
        json!({"file_path": path, "slide_index": 3}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "OUT_OF_RANGE");

    let (status, body) = post(
        &app,
        "/pptx/get_slide_info",
        json!({"file_path": path, "slide_index": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["layout_name"], "Title and Content");
}
