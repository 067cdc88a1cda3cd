pub mod health;
pub mod webhook;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::limit::RequestBodyLimitLayer;

use crate::state::AppState;

/// GitHub caps webhook payloads at 25 MB. Anything larger is answered with
/// `413` instead of the usual `OK`.
const MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build the complete router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(webhook::router(&state.config.webhook_path))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_PAYLOAD_BYTES))
        .with_state(state)
}
