//! Capability interfaces implemented by device drivers.
//!
//! Driver implementations live behind the resolver registries; the bootstrap
//! core only depends on these traits. All trait objects are `Send + Sync` so
//! construction can fan out across tasks and the bound instances can be
//! shared behind `Arc`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use errors::AmpResult;
use serde::{Deserialize, Serialize};

/// Power meter capability
#[async_trait]
pub trait Meter: Send + Sync {
    /// Current power reading in watts, positive for import
    async fn current_power(&self) -> AmpResult<f64>;
}

/// Charger control capability
#[async_trait]
pub trait Charger: Send + Sync {
    /// Current charging enabled state
    async fn enabled(&self) -> AmpResult<bool>;

    /// Enable or disable charging
    async fn enable(&self, enable: bool) -> AmpResult<()>;

    /// Set the maximum charge current in amperes
    async fn set_max_current(&self, current: i64) -> AmpResult<()>;
}

/// Vehicle integration capability
#[async_trait]
pub trait Vehicle: Send + Sync {
    /// Display title shown to operators
    fn title(&self) -> String;

    /// Replace the display title
    fn set_title(&self, title: String);

    /// Battery capacity in kWh
    fn capacity(&self) -> f64;

    /// Battery state of charge in percent
    async fn soc(&self) -> AmpResult<f64>;

    /// Authentication capability, when the integration requires a login flow
    fn auth_provider(&self) -> Option<&dyn AuthProvider> {
        None
    }
}

/// Authentication flows optionally exposed by a vehicle integration
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Start a login flow and return the authorization URL to visit
    async fn login(&self) -> AmpResult<String>;

    /// Terminate the current session
    async fn logout(&self) -> AmpResult<()>;

    /// Wire the redirect endpoints the provider calls back into
    fn set_callback_params(&self, base_uri: &str, callback_uri: &str);
}

/// What a tariff's rate values measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffKind {
    /// Monetary price per kWh
    Price,
    /// Carbon intensity in gCO2e/kWh
    Co2,
}

/// A single tariff rate window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub value: f64,
}

/// Tariff capability
#[async_trait]
pub trait Tariff: Send + Sync {
    fn kind(&self) -> TariffKind;

    /// Upcoming rate windows, earliest first
    async fn rates(&self) -> AmpResult<Vec<Rate>>;
}

/// Push notification capability
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver one message to the backing channel
    async fn send(&self, title: &str, body: &str) -> AmpResult<()>;
}
