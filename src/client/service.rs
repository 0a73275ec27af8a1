//! Client request service: normalize the upload and call the gateway once

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::normalizer::{self, ImageFile};
use crate::config::ClientConfig;
use crate::error::{AppError, Result};
use crate::gateway::GenerateImageRequest;

const FALLBACK_ERROR: &str = "Failed to generate image";

/// Shown when the gateway could not be reached or did not answer in time
const TRANSPORT_ERROR: &str = "Failed to generate image. Please try again.";

/// Anything that turns an image and a prompt into a result URL
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, image: &ImageFile, prompt: &str) -> Result<String>;
}

/// HTTP client for `POST /api/generate-image`
pub struct GatewayClient {
    http: Client,
    endpoint: String,
    max_dimension: u32,
}

impl GatewayClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.gateway_url.clone(),
            max_dimension: config.max_dimension,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageGenerator for GatewayClient {
    async fn generate(&self, image: &ImageFile, prompt: &str) -> Result<String> {
        if !image.is_image() {
            return Err(AppError::InvalidInput(
                "Invalid file type. Please upload an image.".to_string(),
            ));
        }

        let normalized = normalizer::normalize_image(image, self.max_dimension).await?;

        let body = GenerateImageRequest {
            base64_image: Some(normalized.data_url),
            prompt: Some(prompt.trim().to_string()),
        };

        debug!(
            endpoint = %self.endpoint,
            width = normalized.width,
            height = normalized.height,
            "Requesting generation"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(endpoint = %self.endpoint, error = %e, "Gateway request failed");
                AppError::Gateway(TRANSPORT_ERROR.to_string())
            })?;
        let status = response.status();
        let payload = response.json::<Value>().await.ok();

        if !status.is_success() {
            let message = payload
                .as_ref()
                .and_then(|v| v.get("message"))
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(FALLBACK_ERROR)
                .to_string();
            warn!(status = %status, message = %message, "Gateway rejected generation");
            return Err(AppError::Gateway(message));
        }

        payload
            .as_ref()
            .and_then(|v| v.get("url"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(String::from)
            .ok_or(AppError::MissingResult)
    }
}
