//! Webhook classification and notification building.
//!
//! [`dispatcher::EventDispatcher`] is the entry point: it filters incoming
//! GitHub events, formats the survivors via [`formatter`], resolves who to
//! mention via [`recipients`], and hands the result to a
//! [`herald_notifier::NotificationSink`].

pub mod dispatcher;
pub mod formatter;
pub mod payload;
pub mod recipients;

pub use dispatcher::{DispatchOutcome, DispatchSettings, EventDispatcher, EventEnvelope};
pub use payload::Payload;
pub use recipients::UsernameMap;
