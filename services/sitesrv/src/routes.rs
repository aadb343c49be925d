//! HTTP route assembly.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::{auth_handlers, health_handlers};
use crate::app_state::AppState;

/// Assemble the service router
pub fn create_router(state: Arc<AppState>) -> Router {
    let oauth = state.auth.router();

    Router::new()
        .route("/healthz", get(health_handlers::healthz))
        .route("/api/auth/vehicles", get(auth_handlers::list_auth_vehicles))
        .nest("/oauth", oauth)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
