//! OpenAI-compatible image edit client

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::payload::{self, ImageKind};
use crate::provider::traits::{EditRequest, EditResponse, ImageEditProvider};

/// Provider backed by the `/v1/images/edits` endpoint
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

impl OpenAiProvider {
    /// Create a new provider client from configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn edits_url(&self) -> String {
        format!("{}/v1/images/edits", self.base_url)
    }

    fn build_form(&self, request: EditRequest) -> Result<Form> {
        let kind = payload::detect_image_kind(&request.image).unwrap_or(ImageKind::Png);

        let image = Part::bytes(request.image)
            .file_name(format!("image.{}", kind.extension()))
            .mime_str(kind.media_type())?;

        let mut form = Form::new()
            .part("image", image)
            .text("prompt", request.prompt)
            .text("n", request.n.to_string())
            .text("size", request.size)
            .text("response_format", request.response_format.as_str());

        if let Some(model) = &self.model {
            form = form.text("model", model.clone());
        }

        Ok(form)
    }
}

#[async_trait]
impl ImageEditProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn edit_image(&self, request: EditRequest) -> Result<EditResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Upstream("Image provider credential is not configured".to_string()))?;

        let url = self.edits_url();
        debug!(url = %url, bytes = request.image.len(), "Sending image edit request");

        let form = self.build_form(request)?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Upstream("Image provider timed out".to_string())
                } else {
                    AppError::Upstream(format!("Image provider request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message);
            warn!(status = %status, body = %body, "Image provider returned an error");

            return Err(AppError::Upstream(match detail {
                Some(message) => format!("Image provider returned {}: {}", status, message),
                None => format!("Image provider returned {}", status),
            }));
        }

        response
            .json::<EditResponse>()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse provider response: {}", e)))
    }
}
