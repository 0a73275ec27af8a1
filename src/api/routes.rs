//! Router construction

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::handlers;
use crate::middleware::rate_limit::RateLimitLayer;
use crate::AppState;

/// Build the gateway router
pub fn create_router(state: Arc<AppState>) -> Router {
    let settings = state.settings.clone();

    // Reachable cross-origin: any origin, method and header
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/api/generate-image", post(handlers::generate_image))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(settings.gateway.max_body_bytes));

    if settings.rate_limit.enabled {
        router = router.layer(RateLimitLayer::from_config(&settings.rate_limit));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
