//! Validation and relay pipeline behind `POST /api/generate-image`

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::{AppError, Result};
use crate::payload;
use crate::provider::{EditRequest, ImageEditProvider, ResultFormat};

/// Wire body accepted by the gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    /// Base64 image, optionally wrapped in a data URL
    #[serde(default)]
    pub base64_image: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Wire body returned on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateImageResponse {
    pub url: String,
}

/// Stateless gateway: every request is validated, forwarded once, relayed
pub struct GenerationGateway {
    provider: Arc<dyn ImageEditProvider>,
    max_image_bytes: usize,
    output_size: String,
}

impl GenerationGateway {
    pub fn new(
        provider: Arc<dyn ImageEditProvider>,
        config: &GatewayConfig,
        output_size: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            max_image_bytes: config.max_image_bytes,
            output_size: output_size.into(),
        }
    }

    /// Decode and check the uploaded payload without touching the provider
    pub fn validate(&self, request: &GenerateImageRequest) -> Result<Vec<u8>> {
        let raw = request
            .base64_image
            .as_deref()
            .map(payload::strip_data_url_prefix)
            .transpose()?
            .filter(|data| !data.is_empty())
            .ok_or_else(|| AppError::BadRequest("No image provided".to_string()))?;

        let bytes = payload::decode_base64(raw)?;

        if bytes.len() > self.max_image_bytes {
            return Err(AppError::PayloadTooLarge {
                size: bytes.len(),
                limit: self.max_image_bytes,
            });
        }

        let kind = payload::detect_image_kind(&bytes)
            .ok_or_else(|| AppError::BadRequest("Unsupported image format".to_string()))?;
        debug!(bytes = bytes.len(), format = kind.extension(), "Payload accepted");

        Ok(bytes)
    }

    /// Run one generation: validate, call the provider once, relay its first URL
    pub async fn generate(&self, request: GenerateImageRequest) -> Result<GenerateImageResponse> {
        let image = self.validate(&request)?;

        let edit = EditRequest {
            image,
            prompt: request.prompt.unwrap_or_default(),
            n: 1,
            size: self.output_size.clone(),
            response_format: ResultFormat::Url,
        };

        let response = self.provider.edit_image(edit).await?;

        match response.first_url() {
            Some(url) => {
                info!(provider = self.provider.name(), "Image generated");
                Ok(GenerateImageResponse { url: url.to_string() })
            }
            None => {
                warn!(
                    provider = self.provider.name(),
                    entries = response.data.len(),
                    "Provider response carried no usable URL"
                );
                Err(AppError::Upstream("No image URL returned".to_string()))
            }
        }
    }
}
