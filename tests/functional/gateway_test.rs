//! Functional tests for the generation endpoint

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{app_state, png_bytes, RecordingProvider};
use image_restyler::{api::routes::create_router, config::Settings, payload, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn post_json(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/generate-image")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_generate_success() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let app = create_router(app_state(provider.clone()));

    let image = payload::encode(&png_bytes(8, 4));
    let (status, body) = send(
        app,
        post_json(json!({"base64Image": image, "prompt": "make it look like a painting"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"url": "https://example/result.png"}));

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].prompt, "make it look like a painting");
    assert_eq!(calls[0].n, 1);
    assert_eq!(calls[0].size, "1024x1024");
    assert_eq!(calls[0].response_format.as_str(), "url");
}

#[tokio::test]
async fn test_data_url_prefix_is_stripped() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let app = create_router(app_state(provider.clone()));

    let png = png_bytes(3, 3);
    let data_url = payload::create_data_url(&png, "image/png");
    let (status, _) = send(app, post_json(json!({"base64Image": data_url, "prompt": "x"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.calls()[0].image, png);
}

#[tokio::test]
async fn test_missing_image_never_reaches_provider() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let app = create_router(app_state(provider.clone()));

    let (status, body) = send(app, post_json(json!({"prompt": "make it look like a painting"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No image provided");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_empty_image_rejected() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let app = create_router(app_state(provider.clone()));

    let (status, body) = send(app, post_json(json!({"base64Image": "", "prompt": "x"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No image provided");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_base64_rejected() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let app = create_router(app_state(provider.clone()));

    let (status, body) = send(app, post_json(json!({"base64Image": "not valid base64!!!"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Invalid base64"));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_oversized_payload_never_reaches_provider() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let app = create_router(app_state(provider.clone()));

    let mut oversized = png_bytes(1, 1);
    oversized.resize(4 * 1024 * 1024 + 1, 0);
    let (status, body) = send(
        app,
        post_json(json!({"base64Image": payload::encode(&oversized), "prompt": "x"})),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["message"].as_str().unwrap().contains("too large"));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_unsupported_format_rejected() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let app = create_router(app_state(provider.clone()));

    let (status, body) = send(
        app,
        post_json(json!({"base64Image": payload::encode(b"plain text, not pixels")})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Unsupported image format");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_absent_prompt_sent_as_empty() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let app = create_router(app_state(provider.clone()));

    let (status, _) = send(
        app,
        post_json(json!({"base64Image": payload::encode(&png_bytes(2, 2))})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.calls()[0].prompt, "");
}

#[tokio::test]
async fn test_first_entry_without_url_is_upstream_error() {
    let provider = RecordingProvider::with_urls(vec![None, Some("https://example/second.png")]);
    let app = create_router(app_state(provider.clone()));

    let (status, body) = send(
        app,
        post_json(json!({"base64Image": payload::encode(&png_bytes(2, 2)), "prompt": "x"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "No image URL returned");
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn test_empty_provider_result_is_upstream_error() {
    let provider = RecordingProvider::with_urls(vec![]);
    let app = create_router(app_state(provider.clone()));

    let (status, body) = send(
        app,
        post_json(json!({"base64Image": payload::encode(&png_bytes(2, 2))})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "No image URL returned");
}

#[tokio::test]
async fn test_provider_failure_is_relayed_once() {
    let provider = RecordingProvider::failing("Image provider returned 401 Unauthorized");
    let app = create_router(app_state(provider.clone()));

    let (status, body) = send(
        app,
        post_json(json!({"base64Image": payload::encode(&png_bytes(2, 2))})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Image provider returned 401 Unauthorized");
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn test_slow_provider_times_out_with_message() {
    let provider = RecordingProvider::slow("https://example/late.png", Duration::from_secs(5));
    let mut settings = Settings::default();
    settings.server.request_timeout_secs = 1;
    let app = create_router(Arc::new(AppState::new(settings, provider.clone())));

    let (status, body) = send(
        app,
        post_json(json!({"base64Image": payload::encode(&png_bytes(2, 2)), "prompt": "x"})),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["message"], "Image generation timed out");
    assert_eq!(body["type"], "timeout_error");
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let app = create_router(app_state(provider.clone()));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/generate-image")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = create_router(app_state(RecordingProvider::returning("https://example/r.png")));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/generate-image")
                .header(header::ORIGIN, "https://elsewhere.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_health() {
    let app = create_router(app_state(RecordingProvider::returning("https://example/r.png")));

    let (status, body) = send(
        app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}
