//! Event dispatcher: decides whether a webhook is worth a notification and
//! routes it to the matching formatter.
//!
//! Flow for one delivery:
//! 1. Drop ignored and unknown categories
//! 2. Apply the per-category filter (status state/context, action)
//! 3. Format, map usernames, assemble the Slack message
//! 4. Deliver; any error along the way becomes a diagnostic message on the
//!    same channel

use std::iter::successors;
use std::sync::Arc;

use regex::Regex;
use tracing::Instrument;

use herald_common::config::AppConfig;
use herald_common::error::RelayError;
use herald_common::types::{Action, DeliveryStatus, EventCategory, Notification};
use herald_notifier::NotificationSink;

use crate::formatter::{self, Formatted};
use crate::payload::Payload;
use crate::recipients::UsernameMap;

/// Upper bound on diagnostic lines appended to an error notification.
const MAX_DIAGNOSTIC_FRAMES: usize = 5;

/// One inbound webhook delivery.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub category: EventCategory,
    /// `X-GitHub-Delivery` header value, used for log correlation
    pub delivery_id: String,
    pub payload: Payload,
}

impl EventEnvelope {
    pub fn new(category: EventCategory, delivery_id: impl Into<String>, payload: Payload) -> Self {
        Self {
            category,
            delivery_id: delivery_id.into(),
            payload,
        }
    }
}

/// The slice of [`AppConfig`] the dispatcher cares about.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub channel: String,
    pub ignored_events: Vec<String>,
    pub status_events: Vec<String>,
    pub status_contexts: Regex,
    pub hide_diffs: bool,
}

impl From<&AppConfig> for DispatchSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            channel: config.slack_channel.clone(),
            ignored_events: config.ignored_events.clone(),
            status_events: config.status_events.clone(),
            status_contexts: config.status_contexts.clone(),
            hide_diffs: config.hide_diffs,
        }
    }
}

/// What happened to a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Filtered out or not a category we handle
    Skipped,
    /// A notification reached the delivery endpoint
    Delivered(DeliveryStatus),
    /// Formatting or delivery failed; a diagnostic was attempted
    Failed,
}

pub struct EventDispatcher {
    settings: DispatchSettings,
    usernames: Arc<UsernameMap>,
}

impl EventDispatcher {
    pub fn new(settings: DispatchSettings, usernames: Arc<UsernameMap>) -> Self {
        Self {
            settings,
            usernames,
        }
    }

    /// Handle a raw request body. Ignored and unknown categories are skipped
    /// before the body is even parsed; a malformed body for a category we
    /// do handle is reported like any other formatting error.
    pub async fn handle_request<S: NotificationSink>(
        &self,
        category: &str,
        delivery_id: &str,
        body: &[u8],
        sink: &S,
    ) -> DispatchOutcome {
        let category = EventCategory::parse(category);
        if !self.accepts(&category) {
            tracing::debug!(%category, delivery_id, "Event skipped");
            return DispatchOutcome::Skipped;
        }

        match Payload::from_slice(body) {
            Ok(payload) => {
                self.handle(&EventEnvelope::new(category, delivery_id, payload), sink)
                    .await
            }
            Err(err) => {
                self.report(&err, &category, delivery_id, sink).await;
                DispatchOutcome::Failed
            }
        }
    }

    /// Route, format and deliver one event. Never fails: errors are turned
    /// into a diagnostic notification.
    pub async fn handle<S: NotificationSink>(
        &self,
        envelope: &EventEnvelope,
        sink: &S,
    ) -> DispatchOutcome {
        let span = tracing::info_span!(
            "dispatch",
            category = %envelope.category,
            delivery_id = %envelope.delivery_id
        );

        async {
            let result = match self.route(envelope) {
                Ok(None) => {
                    tracing::debug!("Event skipped");
                    return DispatchOutcome::Skipped;
                }
                Ok(Some(notification)) => sink
                    .deliver(&notification)
                    .await
                    .map_err(RelayError::from),
                Err(err) => Err(err),
            };

            match result {
                Ok(status) => {
                    match status {
                        DeliveryStatus::Sent => tracing::info!("Notification delivered"),
                        DeliveryStatus::Rejected { .. } => {
                            tracing::warn!(%status, "Notification rejected by Slack")
                        }
                    }
                    DispatchOutcome::Delivered(status)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Event handling failed");
                    self.report(&err, &envelope.category, &envelope.delivery_id, sink)
                        .await;
                    DispatchOutcome::Failed
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Decide and build. `Ok(None)` means the event is deliberately ignored.
    pub fn route(&self, envelope: &EventEnvelope) -> Result<Option<Notification>, RelayError> {
        if !self.accepts(&envelope.category) {
            return Ok(None);
        }

        let payload = &envelope.payload;
        let action = Action::parse(payload.str("action").unwrap_or_default());

        let formatted = match &envelope.category {
            EventCategory::Status => {
                if !self.status_passes(payload) {
                    return Ok(None);
                }
                formatter::status(payload)?
            }
            EventCategory::Issues => {
                if action != Action::Opened {
                    return Ok(None);
                }
                formatter::issue(&envelope.category, payload)?
            }
            EventCategory::IssueComment | EventCategory::PullRequestReviewComment => {
                if !matches!(action, Action::Created | Action::Edited | Action::Opened) {
                    return Ok(None);
                }
                formatter::issue_comment(&envelope.category, payload, self.settings.hide_diffs)?
            }
            EventCategory::CommitComment => formatter::commit_comment(&envelope.category, payload)?,
            EventCategory::Other(_) => return Ok(None),
        };

        Ok(Some(self.assemble(formatted)))
    }

    /// Map recipients to Slack names and wrap the attachments.
    pub fn assemble(&self, formatted: Formatted) -> Notification {
        let names = self.usernames.resolve(&formatted.recipients);
        Notification::new(&self.settings.channel, format!("To: {}", names.join(", ")))
            .with_attachments(formatted.attachments)
    }

    /// Diagnostic message for a failed delivery.
    pub fn error_notification(
        &self,
        err: &(dyn std::error::Error + 'static),
        category: &EventCategory,
        delivery_id: &str,
    ) -> Notification {
        let mut frames: Vec<String> = successors(err.source(), |e| e.source())
            .map(ToString::to_string)
            .collect();
        frames.push(format!(
            "while handling `{}` event (delivery {})",
            category, delivery_id
        ));

        let mut text = format!("Error: {}", err);
        for frame in frames.iter().take(MAX_DIAGNOSTIC_FRAMES) {
            text.push('\n');
            text.push_str(frame);
        }
        Notification::new(&self.settings.channel, text)
    }

    fn accepts(&self, category: &EventCategory) -> bool {
        let ignored = self
            .settings
            .ignored_events
            .iter()
            .any(|e| e == category.as_str());
        !ignored && !matches!(category, EventCategory::Other(_))
    }

    fn status_passes(&self, payload: &Payload) -> bool {
        let state_allowed = payload
            .str("state")
            .is_some_and(|state| self.settings.status_events.iter().any(|s| s == state));
        let context_allowed = payload
            .str("context")
            .is_some_and(|context| self.settings.status_contexts.is_match(context));
        state_allowed && context_allowed
    }

    /// Best-effort: a failure to deliver the diagnostic is only logged.
    async fn report<S: NotificationSink>(
        &self,
        err: &RelayError,
        category: &EventCategory,
        delivery_id: &str,
        sink: &S,
    ) {
        let notification = self.error_notification(err, category, delivery_id);
        if let Err(e) = sink.deliver(&notification).await {
            tracing::error!(
                error = %e,
                original_error = %err,
                delivery_id,
                "Failed to deliver error notification"
            );
        }
    }
}
