//! Image normalization: decode, downscale to fit, re-encode as a PNG data URL

use image::{
    imageops::FilterType, DynamicImage, GenericImageView, ImageDecoder, ImageFormat, ImageReader,
};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::payload;

/// Longest side allowed when no other limit is configured
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// An uploaded file: raw bytes plus the media type the uploader declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its media type from the extension
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;

        let media_type = ImageFormat::from_path(path)
            .map(|format| format.to_mime_type())
            .unwrap_or(FALLBACK_MEDIA_TYPE);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(name, media_type, bytes))
    }

    /// Whether the declared media type is an image type
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// Data URL of the untouched file, as shown in an upload preview
    pub fn preview_data_url(&self) -> String {
        let media_type = if self.media_type.is_empty() {
            FALLBACK_MEDIA_TYPE
        } else {
            &self.media_type
        };
        payload::create_data_url(&self.bytes, media_type)
    }
}

/// Result of normalization
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// `data:image/png;base64,...`
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// Dimensions that fit within `max` on both sides, keeping the aspect ratio.
/// Never upscales.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let scale = |side: u32, long: u32| -> u32 {
        // round(side * max / long), at least one pixel
        let scaled = (u64::from(side) * u64::from(max) + u64::from(long) / 2) / u64::from(long);
        scaled.max(1) as u32
    };

    if width >= height {
        if width > max {
            (max, scale(height, width))
        } else {
            (width, height)
        }
    } else if height > max {
        (scale(width, height), max)
    } else {
        (width, height)
    }
}

/// Decode `bytes` upright, honouring any EXIF orientation tag
fn decode_upright(bytes: &[u8]) -> Result<DynamicImage> {
    let decode_error = |e: image::ImageError| AppError::Decode(e.to_string());

    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()
        .map_err(decode_error)?;
    let orientation = decoder.orientation().map_err(decode_error)?;

    let mut decoded = DynamicImage::from_decoder(decoder).map_err(decode_error)?;
    decoded.apply_orientation(orientation);
    Ok(decoded)
}

/// Decode `bytes`, downscale to fit `max_dimension` and encode as PNG.
///
/// The decoded image and the resized copy live only for the duration of the call.
pub fn normalize(bytes: &[u8], max_dimension: u32) -> Result<NormalizedImage> {
    let decoded = decode_upright(bytes)?;

    let (width, height) = decoded.dimensions();
    let (new_width, new_height) = fit_within(width, height, max_dimension);

    let rendered = if (new_width, new_height) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(new_width, new_height, FilterType::Lanczos3)
    };
    let rendered = DynamicImage::ImageRgba8(rendered.to_rgba8());

    let mut buffer = Cursor::new(Vec::new());
    rendered
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("Failed to encode PNG: {}", e)))?;
    let png = buffer.into_inner();

    debug!(
        from = %format!("{}x{}", width, height),
        to = %format!("{}x{}", new_width, new_height),
        bytes = png.len(),
        "Normalized image"
    );

    Ok(NormalizedImage {
        data_url: payload::create_data_url(&png, "image/png"),
        width: new_width,
        height: new_height,
    })
}

/// Async wrapper around [`normalize`]; decoding and resizing run on the blocking pool
pub async fn normalize_image(file: &ImageFile, max_dimension: u32) -> Result<NormalizedImage> {
    let bytes = file.bytes.clone();
    tokio::task::spawn_blocking(move || normalize(&bytes, max_dimension))
        .await
        .map_err(|e| AppError::Internal(format!("Normalization task failed: {}", e)))?
}
