//! Built-in device drivers.
//!
//! Real hardware integrations live in their own crates and register through
//! the same `DriverCatalog` API. The built-ins here keep a fresh install
//! runnable without hardware and double as the construction fixtures for
//! tests: every demo driver accepts a `broken` attribute that makes its
//! constructor fail.

use std::sync::Arc;

use crate::device::resolver::DriverCatalog;
use crate::device::traits::{Charger, Messenger, Meter, Tariff, Vehicle};

pub mod demo;
pub mod fallback;
pub mod messenger;
pub mod tariff;

pub use fallback::FallbackVehicle;

/// Register every built-in driver with the catalog
pub fn register_all(catalog: &mut DriverCatalog) {
    catalog.meters.register("demo", |attrs| async move {
        let meter = demo::DemoMeter::from_attributes(&attrs)?;
        Ok(Arc::new(meter) as Arc<dyn Meter>)
    });

    catalog.chargers.register("demo", |attrs| async move {
        let charger = demo::DemoCharger::from_attributes(&attrs)?;
        Ok(Arc::new(charger) as Arc<dyn Charger>)
    });

    catalog.vehicles.register("demo", |attrs| async move {
        let vehicle = demo::DemoVehicle::from_attributes(&attrs)?;
        Ok(Arc::new(vehicle) as Arc<dyn Vehicle>)
    });

    catalog.tariffs.register("fixed", |attrs| async move {
        let tariff = tariff::FixedTariff::from_attributes(&attrs)?;
        Ok(Arc::new(tariff) as Arc<dyn Tariff>)
    });

    catalog.tariffs.register("co2", |attrs| async move {
        let tariff = tariff::Co2Tariff::from_attributes(&attrs)?;
        Ok(Arc::new(tariff) as Arc<dyn Tariff>)
    });

    catalog.messengers.register("log", |attrs| async move {
        let messenger = messenger::LogMessenger::from_attributes(&attrs);
        Ok(Arc::new(messenger) as Arc<dyn Messenger>)
    });
}
