//! Built-in tariff drivers with static rates.

use async_trait::async_trait;
use chrono::{Duration, DurationRound, Utc};
use errors::{AmpError, AmpResult};

use crate::device::traits::{Rate, Tariff, TariffKind};
use crate::device::{parse_attribute, Attributes};

/// Hourly rate windows covering the next 24 hours at a constant value
fn constant_rates(value: f64) -> AmpResult<Vec<Rate>> {
    let hour = Duration::hours(1);
    let start = Utc::now()
        .duration_trunc(hour)
        .map_err(|e| AmpError::device(format!("rate window alignment: {e}")))?;

    Ok((0..24)
        .map(|slot| Rate {
            start: start + hour * slot,
            end: start + hour * (slot + 1),
            value,
        })
        .collect())
}

/// Fixed price tariff
#[derive(Debug)]
pub struct FixedTariff {
    price: f64,
}

impl FixedTariff {
    pub fn from_attributes(attributes: &Attributes) -> AmpResult<Self> {
        let price = parse_attribute(attributes, "price")?
            .ok_or_else(|| AmpError::config("missing price"))?;
        Ok(Self { price })
    }
}

#[async_trait]
impl Tariff for FixedTariff {
    fn kind(&self) -> TariffKind {
        TariffKind::Price
    }

    async fn rates(&self) -> AmpResult<Vec<Rate>> {
        constant_rates(self.price)
    }
}

/// Fixed carbon intensity tariff
pub struct Co2Tariff {
    intensity: f64,
}

impl Co2Tariff {
    pub fn from_attributes(attributes: &Attributes) -> AmpResult<Self> {
        let intensity = parse_attribute(attributes, "co2")?
            .ok_or_else(|| AmpError::config("missing co2"))?;
        Ok(Self { intensity })
    }
}

#[async_trait]
impl Tariff for Co2Tariff {
    fn kind(&self) -> TariffKind {
        TariffKind::Co2
    }

    async fn rates(&self) -> AmpResult<Vec<Rate>> {
        constant_rates(self.intensity)
    }
}
