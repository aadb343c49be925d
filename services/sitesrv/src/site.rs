//! The site aggregate produced by a successful bootstrap.
//!
//! Consumes the populated class registries, the loadpoints and the tariff
//! bundle. The control algorithm proper is out of scope; `run` is a
//! periodic poll that keeps the topology observable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use errors::{AmpError, AmpResult};
use serde::Deserialize;
use tracing::{info, warn};

use crate::device::registry::SiteRegistries;
use crate::device::traits::{Meter, Vehicle};
use crate::loadpoint::Loadpoint;
use crate::tariff::TariffBundle;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SiteMeterRefs {
    grid: Option<String>,
    pv: Option<String>,
    battery: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SiteSettings {
    title: Option<String>,
    meters: SiteMeterRefs,
}

/// The runnable site
pub struct Site {
    title: String,
    grid_meter: Option<Arc<dyn Meter>>,
    pv_meter: Option<Arc<dyn Meter>>,
    battery_meter: Option<Arc<dyn Meter>>,
    loadpoints: Vec<Loadpoint>,
    vehicles: Vec<Arc<dyn Vehicle>>,
    tariffs: TariffBundle,
}

impl Site {
    /// Assemble the site from its configuration map and the bootstrap outputs
    pub fn from_config(
        raw: &HashMap<String, serde_yaml::Value>,
        loadpoints: Vec<Loadpoint>,
        registries: &SiteRegistries,
        tariffs: TariffBundle,
    ) -> AmpResult<Self> {
        let settings: SiteSettings = serde_yaml::from_value(serde_yaml::to_value(raw)?)?;

        Ok(Self {
            title: settings.title.unwrap_or_else(|| "Home".to_string()),
            grid_meter: resolve_meter(&settings.meters.grid, registries)?,
            pv_meter: resolve_meter(&settings.meters.pv, registries)?,
            battery_meter: resolve_meter(&settings.meters.battery, registries)?,
            loadpoints,
            vehicles: registries.vehicles.devices(),
            tariffs,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn loadpoints(&self) -> &[Loadpoint] {
        &self.loadpoints
    }

    pub fn vehicles(&self) -> &[Arc<dyn Vehicle>] {
        &self.vehicles
    }

    pub fn tariffs(&self) -> &TariffBundle {
        &self.tariffs
    }

    pub fn grid_meter(&self) -> Option<&Arc<dyn Meter>> {
        self.grid_meter.as_ref()
    }

    /// Periodic site update loop; runs until the task is aborted
    pub async fn run(&self, interval: Duration) {
        info!(
            title = %self.title,
            loadpoints = self.loadpoints.len(),
            vehicles = self.vehicles.len(),
            currency = %self.tariffs.currency,
            "site running"
        );

        for loadpoint in &self.loadpoints {
            if let Err(e) = loadpoint.prepare().await {
                warn!(loadpoint = %loadpoint.log_name(), "prepare failed: {e}");
            }
        }

        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            self.update().await;
        }
    }

    async fn update(&self) {
        if let Some(grid) = &self.grid_meter {
            match grid.current_power().await {
                Ok(power) => info!(power, "grid power"),
                Err(e) => warn!("grid meter unreachable: {e}"),
            }
        }
        if let Some(pv) = &self.pv_meter {
            if let Ok(power) = pv.current_power().await {
                info!(power, "pv power");
            }
        }
        if let Some(battery) = &self.battery_meter {
            if let Ok(power) = battery.current_power().await {
                info!(power, "battery power");
            }
        }

        for loadpoint in &self.loadpoints {
            loadpoint.update().await;
        }
    }
}

fn resolve_meter(
    name: &Option<String>,
    registries: &SiteRegistries,
) -> AmpResult<Option<Arc<dyn Meter>>> {
    match name {
        Some(name) => match registries.meters.get(name) {
            Some(handle) => Ok(Some(handle.bound()?)),
            None => Err(AmpError::config(format!("unknown meter: {name}"))),
        },
        None => Ok(None),
    }
}
