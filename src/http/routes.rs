use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Capture
        .route("/api/record", post(handlers::record))
        .route("/api/record/start", post(handlers::start_recording))
        .route(
            "/api/record/stop/:session_id",
            post(handlers::stop_recording),
        )
        .route(
            "/api/record/:session_id/status",
            get(handlers::get_session_status),
        )
        // Cipher
        .route("/api/encrypt", post(handlers::encrypt_audio))
        .route("/api/decrypt", post(handlers::decrypt_audio))
        .route("/api/decrypt/raw", post(handlers::decrypt_raw))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
