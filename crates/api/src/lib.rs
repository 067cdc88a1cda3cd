//! HTTP surface of the relay: the GitHub webhook receiver and a health
//! probe.

pub mod routes;
pub mod state;
