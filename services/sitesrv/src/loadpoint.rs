//! Charging loadpoints.
//!
//! A loadpoint couples one charger with an optional charge meter and an
//! optional default vehicle. Loadpoint configuration arrives as an opaque
//! attribute map; device references are resolved against the class
//! registries when the loadpoint is built.

use std::collections::HashMap;
use std::sync::Arc;

use errors::{AmpError, AmpResult};
use serde::Deserialize;
use tracing::{info, warn};

use crate::device::registry::SiteRegistries;
use crate::device::traits::{Charger, Meter, Vehicle};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LoadpointSettings {
    title: Option<String>,
    charger: Option<String>,
    meter: Option<String>,
    vehicle: Option<String>,
    maxcurrent: Option<i64>,
}

/// One charging position at the site
pub struct Loadpoint {
    log_name: String,
    title: String,
    charger: Arc<dyn Charger>,
    meter: Option<Arc<dyn Meter>>,
    vehicle: Option<Arc<dyn Vehicle>>,
    max_current: i64,
}

impl Loadpoint {
    /// Build loadpoint `index` (1-based) from its raw configuration map
    pub fn from_config(
        index: usize,
        raw: &HashMap<String, serde_yaml::Value>,
        registries: &SiteRegistries,
    ) -> AmpResult<Self> {
        let settings: LoadpointSettings = serde_yaml::from_value(serde_yaml::to_value(raw)?)?;

        let charger_name = settings
            .charger
            .ok_or_else(|| AmpError::config("missing charger"))?;
        let charger = match registries.chargers.get(&charger_name) {
            Some(handle) => handle.bound()?,
            None => {
                return Err(AmpError::config(format!("unknown charger: {charger_name}")));
            },
        };

        let meter = match &settings.meter {
            Some(name) => match registries.meters.get(name) {
                Some(handle) => Some(handle.bound()?),
                None => return Err(AmpError::config(format!("unknown meter: {name}"))),
            },
            None => None,
        };

        let vehicle = match &settings.vehicle {
            Some(name) => match registries.vehicles.get(name) {
                Some(handle) => Some(handle.bound()?),
                None => return Err(AmpError::config(format!("unknown vehicle: {name}"))),
            },
            None => None,
        };

        Ok(Self {
            log_name: format!("lp-{index}"),
            title: settings.title.unwrap_or_else(|| format!("Loadpoint {index}")),
            charger,
            meter,
            vehicle,
            max_current: settings.maxcurrent.unwrap_or(16),
        })
    }

    pub fn log_name(&self) -> &str {
        &self.log_name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn vehicle(&self) -> Option<&Arc<dyn Vehicle>> {
        self.vehicle.as_ref()
    }

    /// Apply the configured current limit to the charger
    pub async fn prepare(&self) -> AmpResult<()> {
        self.charger.set_max_current(self.max_current).await
    }

    /// One control sample: read devices and log the loadpoint state
    pub async fn update(&self) {
        let enabled = match self.charger.enabled().await {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!(loadpoint = %self.log_name, "charger unreachable: {e}");
                return;
            },
        };

        let power = match &self.meter {
            Some(meter) => meter.current_power().await.ok(),
            None => None,
        };

        let soc = match &self.vehicle {
            Some(vehicle) => vehicle.soc().await.ok(),
            None => None,
        };

        info!(
            loadpoint = %self.log_name,
            title = %self.title,
            enabled,
            power,
            soc,
            "loadpoint status"
        );
    }
}
