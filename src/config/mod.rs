//! Configuration module

pub mod settings;

pub use settings::{
    ClientConfig, GatewayConfig, LoggingConfig, ProviderConfig, RateLimitConfig, ServerConfig,
    Settings,
};
