//! Health check API handlers.

#![allow(clippy::disallowed_methods)] // json! macro

use axum::{extract::State, response::Json};
use serde_json::json;
use std::sync::Arc;

use crate::app_state::AppState;

/// Health check endpoint
///
/// @route GET /healthz
/// @output topology counts of the running site
pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "sitesrv",
        "site": state.site.title(),
        "meters": state.registries.meters.len(),
        "chargers": state.registries.chargers.len(),
        "vehicles": state.registries.vehicles.len(),
        "loadpoints": state.site.loadpoints().len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
