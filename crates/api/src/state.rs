//! Shared application state for the Axum server.

use std::sync::Arc;

use herald_common::config::AppConfig;
use herald_engine::{DispatchSettings, EventDispatcher, UsernameMap};
use herald_notifier::SlackNotifier;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<EventDispatcher>,
    pub notifier: SlackNotifier,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, usernames: Arc<UsernameMap>) -> Self {
        let dispatcher = EventDispatcher::new(DispatchSettings::from(&config), usernames);
        Self {
            dispatcher: Arc::new(dispatcher),
            notifier: SlackNotifier::new(config.slack_webhook_url.clone()),
            config,
        }
    }
}
