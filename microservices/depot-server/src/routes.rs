//! Router configuration for the depot API

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::AppState;

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Health & Metrics
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/stats", get(handlers::stats))
        // Images
        .route("/upload/", post(handlers::upload_image))
        .route("/upload", post(handlers::upload_image))
        .route("/get/{filename}", get(handlers::get_image))
        // Channel log
        .route("/log/{channel_id}/", post(handlers::log_message))
        .route("/log/{channel_id}", post(handlers::log_message))
        .route("/last_record/{channel_id}", get(handlers::last_record))
        .layer(DefaultBodyLimit::max(body_limit))
        // Any origin, method and header; credentials allowed
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
