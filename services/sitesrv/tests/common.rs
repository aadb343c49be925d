//! Shared test scaffolding
//!
//! Provides an in-memory device store and bootstrap helpers reused by the
//! integration test binaries.

#![allow(clippy::disallowed_methods)] // Integration test - unwrap is acceptable
#![allow(dead_code)] // Not every test binary uses every helper

use ampflow_common::SqliteClient;
use errors::AmpResult;
use sitesrv::config::SiteConfig;
use sitesrv::device::resolver::DriverCatalog;
use sitesrv::device::store::DeviceStore;
use sitesrv::device::Attributes;
use sitesrv::{configure_site, SiteSystem};
use sqlx::sqlite::SqlitePoolOptions;

/// In-memory device store with initialized schema.
///
/// A single connection is required; every pooled connection of an
/// in-memory SQLite database would otherwise see its own empty database.
pub async fn memory_store() -> DeviceStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .expect("enable foreign keys");

    let client = SqliteClient::from_pool(pool);
    let store = DeviceStore::new(client.pool().clone());
    store.init_schema().await.expect("init schema");
    store
}

/// Build an attribute map from string pairs
pub fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Parse a YAML configuration document
pub fn parse_config(yaml: &str) -> SiteConfig {
    serde_yaml::from_str(yaml).expect("parse config yaml")
}

/// Run the full bootstrap against `store` with the built-in drivers
pub async fn run_bootstrap(yaml: &str, store: &DeviceStore) -> AmpResult<SiteSystem> {
    let config = parse_config(yaml);
    let catalog = DriverCatalog::with_builtin();
    configure_site(&config, store, &catalog).await
}

/// Bootstrap against a fresh in-memory store
pub async fn bootstrap(yaml: &str) -> AmpResult<SiteSystem> {
    let store = memory_store().await;
    run_bootstrap(yaml, &store).await
}
