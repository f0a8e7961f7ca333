use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::health;
use super::jobs;
use super::state::AppState;
use super::status;

/// Create the service router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .route("/tools", get(status::tools))
        .route("/env", get(status::env_info))
        .route("/api/jobs", post(jobs::create_job))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
