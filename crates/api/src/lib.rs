//! HTTP side of the audit desk: the demo-seed function and a health check.

pub mod app;
pub mod middleware;
