use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Build the HTTP router for the recording service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/recordings/start", post(handlers::start_recording))
        .route("/recordings/stop", post(handlers::stop_recording))
        .route("/recordings/status", get(handlers::get_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
