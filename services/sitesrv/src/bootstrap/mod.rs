//! Site topology bootstrap.
//!
//! Six sequential stages turn the configuration document into a runnable
//! site: Meters → Chargers → Vehicles → Loadpoints → Tariffs → Site.
//! A stage failure aborts the sequence; later stages never run. Once the
//! site stands, vehicle auth callbacks and the messaging hub are wired.

pub mod builder;

use std::fmt;
use std::sync::Arc;

use errors::{AmpError, AmpResult};
use tokio::sync::mpsc;
use tracing::info;

use crate::auth::AuthCollection;
use crate::config::SiteConfig;
use crate::device::registry::SiteRegistries;
use crate::device::resolver::{DriverCatalog, DriverRegistry};
use crate::device::store::DeviceStore;
use crate::device::traits::Messenger;
use crate::device::{merge_devices, DeviceClass};
use crate::loadpoint::Loadpoint;
use crate::push::{MessageHub, MessagingConfig, PushEvent};
use crate::site::Site;
use crate::tariff::configure_tariffs;

use builder::{build_class, build_vehicles};

/// Outputs of a successful bootstrap
pub struct SiteSystem {
    pub site: Arc<Site>,
    pub registries: Arc<SiteRegistries>,
    pub auth: AuthCollection,
    pub message_tx: mpsc::Sender<PushEvent>,
}

impl fmt::Debug for SiteSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteSystem")
            .field("site", &self.site.title())
            .field("meters", &self.registries.meters.len())
            .field("chargers", &self.registries.chargers.len())
            .field("vehicles", &self.registries.vehicles.len())
            .field("auth", &self.auth.len())
            .finish_non_exhaustive()
    }
}

fn stage_error(stage: &str, err: AmpError) -> AmpError {
    let msg = format!("failed configuring {stage}: {err}");
    if err.is_config_error() {
        AmpError::Configuration(msg)
    } else {
        AmpError::Device(msg)
    }
}

/// Run the full topology bootstrap
pub async fn configure_site(
    config: &SiteConfig,
    store: &DeviceStore,
    catalog: &DriverCatalog,
) -> AmpResult<SiteSystem> {
    let mut registries = SiteRegistries::new();

    let meters = merge_devices(store, DeviceClass::Meter, &config.meters)
        .await
        .map_err(|e| stage_error("meters", e))?;
    build_class(DeviceClass::Meter, meters, &catalog.meters, &mut registries.meters)
        .await
        .map_err(|e| stage_error("meters", e))?;
    info!(count = registries.meters.len(), "meters configured");

    let chargers = merge_devices(store, DeviceClass::Charger, &config.chargers)
        .await
        .map_err(|e| stage_error("chargers", e))?;
    build_class(
        DeviceClass::Charger,
        chargers,
        &catalog.chargers,
        &mut registries.chargers,
    )
    .await
    .map_err(|e| stage_error("chargers", e))?;
    info!(count = registries.chargers.len(), "chargers configured");

    let vehicles = merge_devices(store, DeviceClass::Vehicle, &config.vehicles)
        .await
        .map_err(|e| stage_error("vehicles", e))?;
    build_vehicles(vehicles, &catalog.vehicles, &mut registries.vehicles)
        .await
        .map_err(|e| stage_error("vehicles", e))?;
    info!(count = registries.vehicles.len(), "vehicles configured");

    let loadpoints =
        configure_loadpoints(config, &registries).map_err(|e| stage_error("loadpoints", e))?;
    info!(count = loadpoints.len(), "loadpoints configured");

    let tariffs = configure_tariffs(&config.tariffs, &catalog.tariffs)
        .await
        .map_err(|e| stage_error("tariffs", e))?;

    let site = Site::from_config(&config.site, loadpoints, &registries, tariffs)
        .map_err(|e| stage_error("site", e))?;
    info!(title = %site.title(), "site configured");

    // Side wiring once the topology stands
    let auth = AuthCollection::configure(&config.network, &registries.vehicles);
    let message_tx = configure_messaging(&config.messaging, &catalog.messengers).await?;

    Ok(SiteSystem {
        site: Arc::new(site),
        registries: Arc::new(registries),
        auth,
        message_tx,
    })
}

/// Build all loadpoints; an empty list is a configuration error
fn configure_loadpoints(
    config: &SiteConfig,
    registries: &SiteRegistries,
) -> AmpResult<Vec<Loadpoint>> {
    if config.loadpoints.is_empty() {
        return Err(AmpError::MissingLoadpoints);
    }

    let mut loadpoints = Vec::with_capacity(config.loadpoints.len());
    for (index, raw) in config.loadpoints.iter().enumerate() {
        loadpoints.push(Loadpoint::from_config(index + 1, raw, registries)?);
    }
    Ok(loadpoints)
}

async fn configure_messaging(
    config: &MessagingConfig,
    registry: &DriverRegistry<dyn Messenger>,
) -> AmpResult<mpsc::Sender<PushEvent>> {
    let hub = MessageHub::from_config(config, registry).await?;
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(hub.run(rx));
    Ok(tx)
}
