use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::server::AppState;

/// Build the axum router with all CCL endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/events", post(handler::submit_event))
        .route("/v1/timeline", get(handler::timeline))
        .route("/v1/health", get(handler::health))
        .route("/v1/info", get(handler::info))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
