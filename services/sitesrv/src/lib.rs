//! AmpFlow site service.
//!
//! Boots a charging site from declarative device configuration: descriptors
//! from the site file and the SQLite store are merged, resolved to driver
//! instances concurrently, and assembled into a runnable site in a fixed
//! stage order. The library surface exists so tests and the marshal tool
//! can drive the same code paths as the binary.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod device;
pub mod drivers;
pub mod loadpoint;
pub mod push;
pub mod routes;
pub mod site;
pub mod tariff;

pub use app_state::AppState;
pub use bootstrap::{configure_site, SiteSystem};
pub use config::SiteConfig;
