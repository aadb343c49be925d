//! Vehicle auth lookup handlers.

use axum::{extract::State, response::Json};
use std::sync::Arc;

use crate::app_state::AppState;
use crate::auth::AuthRouteEntry;

/// Published auth route lookup
///
/// @route GET /api/auth/vehicles
/// @output auth route path and vehicle title, in id order
pub async fn list_auth_vehicles(State(state): State<Arc<AppState>>) -> Json<Vec<AuthRouteEntry>> {
    Json(state.auth.entries())
}
