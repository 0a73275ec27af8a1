//! Common traits and types for image-edit providers

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How the provider should hand back its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultFormat {
    /// A hosted URL
    Url,
    /// Inline base64 image data
    B64Json,
}

impl ResultFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultFormat::Url => "url",
            ResultFormat::B64Json => "b64_json",
        }
    }
}

/// Request to edit an image
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// Decoded source image
    pub image: Vec<u8>,

    /// Text instructions for the edit
    pub prompt: String,

    /// Number of images to generate
    pub n: u32,

    /// Output resolution, `<width>x<height>`
    pub size: String,

    pub response_format: ResultFormat,
}

/// One result entry from the provider; nothing in it is guaranteed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditedImage {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub b64_json: Option<String>,

    /// Revised prompt if the model modified it
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

/// Response from an image edit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditResponse {
    #[serde(default)]
    pub data: Vec<EditedImage>,
}

impl EditResponse {
    /// URL of the first entry, if it carries a non-empty one. Later entries are ignored.
    pub fn first_url(&self) -> Option<&str> {
        self.data
            .first()
            .and_then(|image| image.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Trait for image-edit providers
#[async_trait]
pub trait ImageEditProvider: Send + Sync {
    /// Provider name, for logs
    fn name(&self) -> &str;

    /// Edit an image according to a prompt
    async fn edit_image(&self, request: EditRequest) -> Result<EditResponse>;
}
