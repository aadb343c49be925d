//! Tariff bundle assembly.
//!
//! Four independently optional tariff slots (grid price, feed-in price,
//! carbon intensity, planner) plus a currency unit. A slot whose driver
//! fails to construct degrades to absent instead of aborting the stage;
//! only an unparseable currency code is fatal.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use errors::{AmpError, AmpResult};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::device::resolver::DriverRegistry;
use crate::device::traits::{Tariff, TariffKind};
use crate::device::RawTypedConfig;

/// Currency unit for price tariffs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Chf,
    Dkk,
    Nok,
    Sek,
    Pln,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Chf => "CHF",
            Currency::Dkk => "DKK",
            Currency::Nok => "NOK",
            Currency::Sek => "SEK",
            Currency::Pln => "PLN",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = AmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            "CHF" => Ok(Currency::Chf),
            "DKK" => Ok(Currency::Dkk),
            "NOK" => Ok(Currency::Nok),
            "SEK" => Ok(Currency::Sek),
            "PLN" => Ok(Currency::Pln),
            other => Err(AmpError::InvalidCurrency(other.to_string())),
        }
    }
}

/// The `tariffs:` section of the site configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TariffsConfig {
    pub currency: Option<String>,
    pub grid: Option<RawTypedConfig>,
    pub feedin: Option<RawTypedConfig>,
    pub co2: Option<RawTypedConfig>,
    pub planner: Option<RawTypedConfig>,
}

/// Constructed tariffs, one optional handle per slot
#[derive(Default)]
pub struct TariffBundle {
    pub currency: Currency,
    pub grid: Option<Arc<dyn Tariff>>,
    pub feedin: Option<Arc<dyn Tariff>>,
    pub co2: Option<Arc<dyn Tariff>>,
    pub planner: Option<Arc<dyn Tariff>>,
}

/// Construct the tariff bundle from its configuration section
pub async fn configure_tariffs(
    config: &TariffsConfig,
    registry: &DriverRegistry<dyn Tariff>,
) -> AmpResult<TariffBundle> {
    let mut bundle = TariffBundle::default();

    if let Some(code) = &config.currency {
        bundle.currency = code.parse()?;
    }

    bundle.grid = build_slot("grid", config.grid.as_ref(), registry).await;
    bundle.feedin = build_slot("feedin", config.feedin.as_ref(), registry).await;
    bundle.co2 = build_slot("co2", config.co2.as_ref(), registry).await;
    bundle.planner = build_slot("planner", config.planner.as_ref(), registry).await;

    if let Some(planner) = &bundle.planner {
        if planner.kind() == TariffKind::Co2 {
            warn!("tariff configuration changed, use co2 instead of planner");
        }
    }

    Ok(bundle)
}

async fn build_slot(
    slot: &str,
    config: Option<&RawTypedConfig>,
    registry: &DriverRegistry<dyn Tariff>,
) -> Option<Arc<dyn Tariff>> {
    let raw = config?;

    let typed = match raw.typed() {
        Ok(typed) => typed,
        Err(e) => {
            error!("failed configuring {slot} tariff: {e}");
            return None;
        },
    };

    match registry.create(&typed.device_type, typed.attributes).await {
        Ok(tariff) => Some(tariff),
        Err(e) => {
            error!("failed configuring {slot} tariff: {e}");
            None
        },
    }
}
