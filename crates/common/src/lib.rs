//! Shared building blocks for the herald relay: configuration, the error
//! taxonomy, and the event / Slack notification types every crate speaks.

pub mod config;
pub mod error;
pub mod types;
