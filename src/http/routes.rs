use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/backend/health", get(handlers::backend_health))
        // Monitoring control
        .route("/monitor/start", post(handlers::start_monitoring))
        .route("/monitor/stop", post(handlers::stop_monitoring))
        .route("/monitor/status", get(handlers::get_status))
        .route("/monitor/error", delete(handlers::dismiss_error))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
