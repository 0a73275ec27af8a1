//! Common error types for the restyling pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type, shared by the gateway and the client side
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The uploaded file could not be decoded as a raster image
    #[error("Failed to load image: {0}")]
    Decode(String),

    /// Wrong file type or a missing field on the client side
    #[error("{0}")]
    InvalidInput(String),

    /// Malformed or missing payload received by the gateway
    #[error("{0}")]
    BadRequest(String),

    #[error("Image is too large ({size} bytes, limit is {limit} bytes)")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The raw request body exceeded the configured ceiling
    #[error("Request body is too large")]
    RequestTooLarge,

    /// The provider call failed or returned nothing usable
    #[error("{0}")]
    Upstream(String),

    /// The gateway answered with success but without a result URL
    #[error("No image URL returned")]
    MissingResult,

    /// Error message relayed from the gateway to the client
    #[error("{0}")]
    Gateway(String),

    /// The whole generation outlived the server's request budget
    #[error("Image generation timed out")]
    Timeout,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and error type used when this error crosses the gateway boundary
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Json(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
            AppError::Decode(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
            AppError::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::RequestTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AppError::MissingResult => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AppError::Gateway(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AppError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "timeout_error"),
            AppError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "rate_limit_error"),
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "server_error")
            }
        }
    }
}

/// Error body returned by the gateway
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub r#type: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.classify();

        let body = Json(ErrorResponse {
            message: self.to_string(),
            r#type: error_type.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
