//! Image Restyler
//!
//! Restyles an uploaded image with a preset prompt by way of an external
//! image-edit provider. The crate holds both halves of the pipeline: the
//! client side (normalization, gateway requests, editor session state) and
//! the gateway that validates uploads and relays them to the provider.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod payload;
pub mod provider;

pub use error::{AppError, Result};

use std::sync::Arc;

use gateway::GenerationGateway;
use provider::ImageEditProvider;

/// Application state shared across all handlers; built once at startup
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub gateway: Arc<GenerationGateway>,
}

impl AppState {
    pub fn new(settings: config::Settings, provider: Arc<dyn ImageEditProvider>) -> Self {
        let gateway = GenerationGateway::new(provider, &settings.gateway, settings.provider.size.clone());
        Self {
            settings: Arc::new(settings),
            gateway: Arc::new(gateway),
        }
    }
}
