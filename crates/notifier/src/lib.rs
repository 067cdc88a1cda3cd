//! Slack delivery adapter.
//!
//! One notification is one form-encoded POST to the configured incoming
//! webhook (`payload=<json>`). There is no retry: a non-200 answer is logged
//! together with the response body and reported as
//! [`DeliveryStatus::Rejected`]; only transport-level failures surface as
//! errors.

use std::future::Future;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use herald_common::error::RelayError;
use herald_common::types::{DeliveryStatus, Notification};

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to serialize notification: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<NotifierError> for RelayError {
    fn from(err: NotifierError) -> Self {
        RelayError::Delivery(err.to_string())
    }
}

/// Anything that can carry a notification to the chat platform.
pub trait NotificationSink: Send + Sync {
    fn deliver(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<DeliveryStatus, NotifierError>> + Send;
}

/// Posts notifications to a Slack incoming webhook.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.into(),
        }
    }
}

impl NotificationSink for SlackNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<DeliveryStatus, NotifierError> {
        let payload = serde_json::to_string(notification)?;
        tracing::debug!(channel = %notification.channel, %payload, "Posting to Slack");

        let response = self
            .client
            .post(&self.webhook_url)
            .form(&[("payload", payload.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(DeliveryStatus::Sent);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = status.as_u16(), %body, "Slack rejected notification");
        Ok(DeliveryStatus::Rejected {
            status: status.as_u16(),
        })
    }
}
