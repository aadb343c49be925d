//! Vehicle auth routing integration tests
//!
//! Boots a site with a mixed vehicle fleet and exercises the HTTP surface:
//! per-vehicle login/logout routes, the published lookup endpoint and the
//! health check.

#![allow(clippy::disallowed_methods)] // Integration test - unwrap is acceptable

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{memory_store, parse_config};
use sitesrv::device::resolver::DriverCatalog;
use sitesrv::routes::create_router;
use sitesrv::{configure_site, AppState};
use tower::util::ServiceExt;

const FLEET_YAML: &str = r#"
chargers:
  - name: wallbox
    type: demo
vehicles:
  - name: family car
    type: demo
    soc: 60
  - name: blue
    type: demo
    title: Blue EV
    auth: true
    authorize_uri: https://example.org/authorize
loadpoints:
  - charger: wallbox
site:
  title: Home
"#;

async fn build_app() -> (Arc<AppState>, axum::Router) {
    let store = memory_store().await;
    let config = parse_config(FLEET_YAML);
    let catalog = DriverCatalog::with_builtin();
    let system = configure_site(&config, &store, &catalog)
        .await
        .expect("bootstrap");

    let state = Arc::new(AppState::new(system, store));
    let app = create_router(state.clone());
    (state, app)
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn test_only_auth_capable_vehicles_are_collected() {
    let (state, _app) = build_app().await;

    // Two vehicles, ids count the auth-capable ones only
    assert_eq!(state.registries.vehicles.len(), 2);
    assert_eq!(state.auth.len(), 1);

    let entries = state.auth.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "oauth/vehicles/1");
    assert_eq!(entries[0].title, "Blue EV");

    assert_eq!(
        state.auth.title_for("oauth/vehicles/1"),
        Some("Blue EV".to_string())
    );
    assert_eq!(state.auth.title_for("oauth/vehicles/2"), None);
}

#[tokio::test]
async fn test_login_returns_authorize_uri_with_callback() {
    let (_state, app) = build_app().await;

    let req = Request::builder()
        .uri("/oauth/vehicles/1/login")
        .method("POST")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(
        json["loginUri"],
        "https://example.org/authorize?redirect_uri=http://localhost:7070/oauth/vehicles/1/callback"
    );
}

#[tokio::test]
async fn test_logout_succeeds() {
    let (_state, app) = build_app().await;

    let req = Request::builder()
        .uri("/oauth/vehicles/1/logout")
        .method("POST")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_routes_exist_only_for_collected_vehicles() {
    let (_state, app) = build_app().await;

    // The non-auth vehicle never received an id, so no route exists
    let req = Request::builder()
        .uri("/oauth/vehicles/2/login")
        .method("POST")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Login is POST-only
    let req = Request::builder()
        .uri("/oauth/vehicles/1/login")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_auth_lookup_endpoint() {
    let (_state, app) = build_app().await;

    let req = Request::builder()
        .uri("/api/auth/vehicles")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    let entries = json.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["path"], "oauth/vehicles/1");
    assert_eq!(entries[0]["title"], "Blue EV");
}

#[tokio::test]
async fn test_healthz_reports_topology_counts() {
    let (_state, app) = build_app().await;

    let req = Request::builder()
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "sitesrv");
    assert_eq!(json["site"], "Home");
    assert_eq!(json["chargers"], 1);
    assert_eq!(json["vehicles"], 2);
    assert_eq!(json["loadpoints"], 1);
}
