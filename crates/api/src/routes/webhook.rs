//! GitHub webhook receiver.
//!
//! The sender always gets `200 OK`: filtered events, formatting failures and
//! Slack errors are all handled (and reported) on our side. Bodies above the
//! router's size limit never reach this handler and get `413`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Router;
use uuid::Uuid;

use crate::state::AppState;

const EVENT_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";

pub fn router(path: &str) -> Router<AppState> {
    Router::new().route(path, post(receive))
}

/// POST {WEBHOOK_PATH}: relay one GitHub event to Slack.
async fn receive(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> &'static str {
    let category = header(&headers, EVENT_HEADER).unwrap_or_default();
    let delivery_id = header(&headers, DELIVERY_HEADER)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let outcome = state
        .dispatcher
        .handle_request(category, &delivery_id, &body, &state.notifier)
        .await;
    tracing::debug!(category, %delivery_id, ?outcome, "Webhook processed");

    "OK"
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
