//! HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::gateway::{GenerateImageRequest, GenerateImageResponse};
use crate::AppState;

/// `POST /api/generate-image`
pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>> {
    let request_id = Uuid::new_v4();

    async move {
        let Json(request) = body.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::RequestTooLarge
            } else {
                AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
            }
        })?;

        info!(
            prompt_chars = request.prompt.as_deref().map_or(0, |p| p.chars().count()),
            "Received generation request"
        );

        let budget = Duration::from_secs(state.settings.server.request_timeout_secs);
        let outcome = tokio::time::timeout(budget, state.gateway.generate(request))
            .await
            .unwrap_or_else(|_| Err(AppError::Timeout));

        outcome.map(Json).map_err(|e| {
            let (status, kind) = e.classify();
            if status.is_server_error() {
                error!(status = %status, kind, error = %e, "Generation failed");
            } else {
                warn!(status = %status, kind, error = %e, "Generation rejected");
            }
            e
        })
    }
    .instrument(info_span!("generate_image", %request_id))
    .await
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
