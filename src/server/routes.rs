//! Router configuration for the web console.

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.settings.max_upload_bytes;

    Router::new()
        // Upload console
        .route("/", get(handlers::index))
        // One-shot OCR API
        .route("/api/ocr", post(handlers::api_ocr))
        .route("/api/ocr-url", post(handlers::api_ocr_url))
        .route("/api/device-info", get(handlers::api_device_info))
        // Upload queue
        .route(
            "/api/queue",
            get(handlers::queue_state).post(handlers::queue_admit),
        )
        .route("/api/queue/process", post(handlers::queue_process))
        .route("/api/queue/clear", post(handlers::queue_clear))
        .route("/api/queue/:index", delete(handlers::queue_remove))
        // Artifacts and static assets
        .route("/pdf/:filename", get(handlers::serve_pdf))
        .route("/static/style.css", get(handlers::serve_css))
        .route("/static/app.js", get(handlers::serve_js))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
