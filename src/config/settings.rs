//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable consulted when no provider key is configured
pub const PROVIDER_KEY_ENV: &str = "OPENAI_API_KEY";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    150
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// External image-generation provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Secret credential; only checked when the provider is actually called
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Output resolution requested from the provider, `<width>x<height>`
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_size() -> String {
    "1024x1024".to_string()
}

fn default_provider_timeout() -> u64 {
    120_000
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: None,
            size: default_size(),
            timeout_ms: default_provider_timeout(),
        }
    }
}

/// Gateway payload limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Ceiling on the decoded image size
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    /// Ceiling on the raw request body (base64 inflates by a third)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_max_image_bytes() -> usize {
    4 * 1024 * 1024
}

fn default_max_body_bytes() -> usize {
    8 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_rps() -> u32 {
    5
}

fn default_burst() -> u32 {
    10
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

/// Settings for the client side of the pipeline
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    #[serde(default = "default_client_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

fn default_gateway_url() -> String {
    "http://localhost:3000/api/generate-image".to_string()
}

fn default_client_timeout() -> u64 {
    180_000
}

fn default_max_dimension() -> u32 {
    1024
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            timeout_ms: default_client_timeout(),
            max_dimension: default_max_dimension(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("gateway.max_image_bytes", default_max_image_bytes() as i64)?
            .set_default("rate_limit.enabled", false)?
            .add_source(File::with_name(path.as_ref().to_str().unwrap_or("config/default")).required(false))
            // Override with environment variables (e.g. RESTYLE__SERVER__PORT)
            .add_source(
                Environment::with_prefix("RESTYLE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;

        if settings.provider.api_key.as_deref().map_or(true, str::is_empty) {
            settings.provider.api_key = std::env::var(PROVIDER_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }

        if self.provider.base_url.trim().is_empty() {
            return Err(invalid("Provider base URL cannot be empty"));
        }

        if parse_size(&self.provider.size).is_none() {
            return Err(invalid(format!(
                "Provider size '{}' must look like '<width>x<height>'",
                self.provider.size
            )));
        }

        // The provider's own timeout has to fire first so its 502 reaches the caller
        if self.server.request_timeout_secs.saturating_mul(1000) <= self.provider.timeout_ms {
            return Err(invalid(format!(
                "Server request timeout ({}s) must exceed the provider timeout ({}ms)",
                self.server.request_timeout_secs, self.provider.timeout_ms
            )));
        }

        if self.gateway.max_image_bytes == 0 || self.gateway.max_body_bytes == 0 {
            return Err(invalid("Gateway limits must be greater than 0"));
        }

        if self.client.max_dimension == 0 {
            return Err(invalid("Client max dimension must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Config(config::ConfigError::Message(message.into()))
}

/// Parse a `<width>x<height>` resolution string
pub fn parse_size(size: &str) -> Option<(u32, u32)> {
    let (width, height) = size.split_once('x')?;
    let width: u32 = width.trim().parse().ok()?;
    let height: u32 = height.trim().parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}
