//! Vehicle authentication routing.
//!
//! After bootstrap, vehicles exposing the authentication capability get
//! sequential 1-based ids and per-vehicle login/logout routes under
//! `/oauth/vehicles/<id>/`. The path to title lookup is published for the
//! routing layer and served at `/api/auth/vehicles`.

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use errors::AmpError;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::config::NetworkConfig;
use crate::device::registry::DeviceRegistry;
use crate::device::traits::Vehicle;

/// One auth-capable vehicle and its route prefix
pub struct AuthVehicle {
    pub id: usize,
    /// Route prefix, e.g. `oauth/vehicles/1`
    pub path: String,
    vehicle: Arc<dyn Vehicle>,
}

/// Auth-capable vehicles in registry order
#[derive(Default)]
pub struct AuthCollection {
    vehicles: Vec<AuthVehicle>,
}

/// Serializable view of one lookup entry
#[derive(Debug, Clone, Serialize)]
pub struct AuthRouteEntry {
    pub path: String,
    pub title: String,
}

impl AuthCollection {
    /// Scan vehicles in registry order and wire their callback parameters.
    ///
    /// Ids are sequential and 1-based over the auth-capable vehicles only,
    /// so callback paths stay stable across restarts as long as the vehicle
    /// order does.
    pub fn configure(network: &NetworkConfig, vehicles: &DeviceRegistry<dyn Vehicle>) -> Self {
        let base_uri = network.uri();
        let base_auth_uri = format!("{base_uri}/oauth");

        let mut collection = Self::default();
        for handle in vehicles.handles() {
            let Some(vehicle) = handle.instance() else {
                continue;
            };
            if vehicle.auth_provider().is_none() {
                continue;
            }

            let id = collection.vehicles.len() + 1;
            let base_path = format!("vehicles/{id}");
            let callback_uri = format!("{base_auth_uri}/{base_path}/callback");

            if let Some(provider) = vehicle.auth_provider() {
                provider.set_callback_params(&base_uri, &callback_uri);
            }

            collection.vehicles.push(AuthVehicle {
                id,
                path: format!("oauth/{base_path}"),
                vehicle,
            });
        }

        collection.publish();
        collection
    }

    fn publish(&self) {
        for entry in self.entries() {
            info!(path = %entry.path, title = %entry.title, "vehicle auth route");
        }
    }

    /// Path to title lookup entries, in id order
    pub fn entries(&self) -> Vec<AuthRouteEntry> {
        self.vehicles
            .iter()
            .map(|v| AuthRouteEntry {
                path: v.path.clone(),
                title: v.vehicle.title(),
            })
            .collect()
    }

    /// Title registered under a route path
    pub fn title_for(&self, path: &str) -> Option<String> {
        self.vehicles
            .iter()
            .find(|v| v.path == path)
            .map(|v| v.vehicle.title())
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Per-vehicle login/logout routes, meant to be nested under `/oauth`
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let mut router = Router::new();
        for auth_vehicle in &self.vehicles {
            let login = auth_vehicle.vehicle.clone();
            let logout = auth_vehicle.vehicle.clone();
            router = router
                .route(
                    &format!("/vehicles/{}/login", auth_vehicle.id),
                    post(move || login_handler(login)),
                )
                .route(
                    &format!("/vehicles/{}/logout", auth_vehicle.id),
                    post(move || logout_handler(logout)),
                );
        }
        router
    }
}

async fn login_handler(vehicle: Arc<dyn Vehicle>) -> Response {
    let Some(provider) = vehicle.auth_provider() else {
        return AmpError::device("vehicle has no auth provider").into_response();
    };
    match provider.login().await {
        Ok(uri) => Json(json!({ "loginUri": uri })).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn logout_handler(vehicle: Arc<dyn Vehicle>) -> Response {
    let Some(provider) = vehicle.auth_provider() else {
        return AmpError::device("vehicle has no auth provider").into_response();
    };
    match provider.logout().await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(e) => e.into_response(),
    }
}
