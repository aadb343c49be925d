//! HTTP API handlers.

pub mod auth_handlers;
pub mod health_handlers;
