//! Base64 and data URL helpers shared by the client and the gateway

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{AppError, Result};

/// Encode binary data to base64 string
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Strip a `data:<mime>;base64,` preamble, if present
pub fn strip_data_url_prefix(payload: &str) -> Result<&str> {
    let payload = payload.trim();
    if !payload.starts_with("data:") {
        return Ok(payload);
    }

    payload
        .split_once(',')
        .map(|(_, data)| data.trim())
        .ok_or_else(|| AppError::BadRequest("Malformed data URL: missing ',' separator".to_string()))
}

/// Decode base64 text, with or without a data URL preamble, to binary data
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    decode_base64(strip_data_url_prefix(encoded)?)
}

/// Decode bare base64 text; any data URL preamble must already be gone
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(data)
        .map_err(|e| AppError::BadRequest(format!("Invalid base64 data: {}", e)))
}

/// Get the media type declared by a data URL, e.g. `image/png`
pub fn media_type_from_data_url(data_url: &str) -> Option<&str> {
    let rest = data_url.strip_prefix("data:")?;
    let end = rest.find([';', ','])?;
    let media_type = &rest[..end];
    (!media_type.is_empty()).then_some(media_type)
}

/// Create a data URL from binary data
pub fn create_data_url(data: &[u8], media_type: &str) -> String {
    format!("data:{};base64,{}", media_type, encode(data))
}

/// Raster formats the gateway accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
            ImageKind::Bmp => "bmp",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Gif => "image/gif",
            ImageKind::Webp => "image/webp",
            ImageKind::Bmp => "image/bmp",
        }
    }
}

/// Detect image format from binary data using magic bytes
pub fn detect_image_kind(data: &[u8]) -> Option<ImageKind> {
    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageKind::Png);
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageKind::Jpeg);
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some(ImageKind::Gif);
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some(ImageKind::Webp);
    }

    if data.len() >= 14 && data.starts_with(b"BM") {
        return Some(ImageKind::Bmp);
    }

    None
}
