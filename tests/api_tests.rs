//! HTTP surface tests that run the router in-process.
//!
//! Generation requests here only exercise validation, which rejects the
//! request before any external tool is invoked.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use subclip::api::build_router;
use subclip::config::Config;
use subclip::progress::ProgressTracker;

fn test_router() -> axum::Router {
    build_router(&Config::default(), Arc::new(ProgressTracker::new()))
}

fn multipart_body(boundary: &str, fields: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!("--{}\r\n", boundary));
        body.push_str(&format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
            name
        ));
        body.push_str(value);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", boundary));
    body
}

fn generate_request(boundary: &str, fields: &[(&str, &str)]) -> Request<Body> {
    Request::post("/generate")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart_body(boundary, fields)))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_ok() {
    let response = test_router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "subclip");
}

#[tokio::test]
async fn test_progress_starts_at_zero() {
    let response = test_router()
        .oneshot(Request::get("/progress").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["current"], 0);
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_generate_rejects_out_of_range_parts() {
    let response = test_router()
        .oneshot(generate_request("bound1", &[("parts", "99")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["detail"], "parts must be between 1 and 30");
}

#[tokio::test]
async fn test_generate_rejects_zero_parts() {
    let response = test_router()
        .oneshot(generate_request("bound2", &[("parts", "0")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["detail"], "parts must be between 1 and 30");
}

#[tokio::test]
async fn test_generate_rejects_non_integer_parts() {
    let response = test_router()
        .oneshot(generate_request("bound3", &[("parts", "three")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["detail"], "parts must be an integer");
}

#[tokio::test]
async fn test_generate_requires_parts_field() {
    let response = test_router()
        .oneshot(generate_request("bound4", &[("language", "fr")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["detail"], "missing form field: parts");
}

#[tokio::test]
async fn test_generate_requires_file_fields() {
    let response = test_router()
        .oneshot(generate_request("bound5", &[("parts", "3")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["detail"], "missing file field: audio");
}
