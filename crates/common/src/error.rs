use thiserror::Error;

/// Errors raised while turning a webhook into a Slack notification.
///
/// Filtered or unknown events are not errors; the dispatcher reports those
/// as a skip.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing required field: {path}")]
    FieldMissing { path: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Delivery error: {0}")]
    Delivery(String),
}

impl RelayError {
    pub fn field_missing(path: impl Into<String>) -> Self {
        RelayError::FieldMissing { path: path.into() }
    }
}
