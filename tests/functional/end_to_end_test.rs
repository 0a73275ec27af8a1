//! Upload → style → generate through a real gateway listening on a local port

mod common;

use common::{app_state, png_bytes, RecordingProvider};
use image_restyler::api::routes::create_router;
use image_restyler::client::{EditorSession, GatewayClient, ImageFile, Style};
use image_restyler::config::ClientConfig;
use image::GenericImageView;
use std::sync::Arc;
use tokio::net::TcpListener;

async fn spawn_gateway(provider: Arc<RecordingProvider>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(app_state(provider));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api/generate-image", addr)
}

fn session_for(gateway_url: String) -> EditorSession {
    let client = GatewayClient::new(&ClientConfig {
        gateway_url,
        ..Default::default()
    })
    .unwrap();
    EditorSession::new(Arc::new(client))
}

fn painting() -> Style {
    Style {
        id: "painting".into(),
        name: "Painting".into(),
        prompt: "make it look like a painting".into(),
        preview: "/styles/painting.png".into(),
    }
}

#[tokio::test]
async fn test_restyle_wide_image() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let session = session_for(spawn_gateway(provider.clone()).await);

    session
        .set_original_image(ImageFile::new("wide.png", "image/png", png_bytes(2000, 1000)))
        .await
        .unwrap();
    session.set_selected_style(Some(painting()));
    session.generate_image().await;

    let state = session.snapshot();
    assert!(!state.is_generating);
    assert_eq!(state.last_error, None);
    assert_eq!(state.generated_image_url.as_deref(), Some("https://example/result.png"));

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].prompt, "make it look like a painting");

    let received = image::load_from_memory(&calls[0].image).unwrap();
    assert_eq!(received.dimensions(), (1024, 512));
}

#[tokio::test]
async fn test_small_image_is_not_upscaled() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let session = session_for(spawn_gateway(provider.clone()).await);

    session
        .set_original_image(ImageFile::new("small.png", "image/png", png_bytes(300, 200)))
        .await
        .unwrap();
    session.set_selected_style(Some(painting()));
    session.generate_image().await;

    let received = image::load_from_memory(&provider.calls()[0].image).unwrap();
    assert_eq!(received.dimensions(), (300, 200));
}

#[tokio::test]
async fn test_gateway_error_reaches_session() {
    let provider = RecordingProvider::with_urls(vec![None]);
    let session = session_for(spawn_gateway(provider.clone()).await);

    session
        .set_original_image(ImageFile::new("tall.png", "image/png", png_bytes(10, 40)))
        .await
        .unwrap();
    session.set_selected_style(Some(painting()));
    session.generate_image().await;

    let state = session.snapshot();
    assert!(!state.is_generating);
    assert_eq!(state.last_error.as_deref(), Some("No image URL returned"));
    assert_eq!(state.generated_image_url, None);
}

#[tokio::test]
async fn test_non_image_upload_never_reaches_gateway() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let session = session_for(spawn_gateway(provider.clone()).await);

    session
        .set_original_image(ImageFile::new("notes.txt", "text/plain", b"hello".to_vec()))
        .await
        .unwrap();
    session.set_selected_style(Some(painting()));
    session.generate_image().await;

    assert_eq!(
        session.snapshot().last_error.as_deref(),
        Some("Invalid file type. Please upload an image.")
    );
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_undecodable_upload_reports_decode_error() {
    let provider = RecordingProvider::returning("https://example/result.png");
    let session = session_for(spawn_gateway(provider.clone()).await);

    session
        .set_original_image(ImageFile::new("broken.png", "image/png", b"not really a png".to_vec()))
        .await
        .unwrap();
    session.set_selected_style(Some(painting()));
    session.generate_image().await;

    let error = session.snapshot().last_error.unwrap();
    assert!(error.starts_with("Failed to load image"));
    assert!(provider.calls().is_empty());
}
