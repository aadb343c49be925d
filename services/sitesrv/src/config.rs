//! Site configuration schema.
//!
//! The whole deployment is described by one YAML document, overridable
//! through `AMPFLOW_`-prefixed environment variables. Device sections stay
//! raw here; flattening and validation happen during bootstrap so errors
//! carry stage context.

use std::collections::HashMap;
use std::path::Path;

use errors::AmpResult;
use serde::Deserialize;

use crate::device::RawDeviceConfig;
use crate::push::MessagingConfig;
use crate::tariff::TariffsConfig;

fn default_interval() -> u64 {
    10
}

fn default_log() -> String {
    "info".to_string()
}

/// Network settings for externally reachable URIs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub schema: String,
    pub host: String,
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            schema: "http".to_string(),
            host: "localhost".to_string(),
            port: 7070,
        }
    }
}

impl NetworkConfig {
    /// Host with the port elided when it is the schema default
    pub fn host_port(&self) -> String {
        if (self.schema == "http" && self.port == 80)
            || (self.schema == "https" && self.port == 443)
        {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Externally visible base URI
    pub fn uri(&self) -> String {
        format!("{}://{}", self.schema, self.host_port())
    }

    /// Local socket address the HTTP server binds
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// SQLite database location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/ampflow.db".to_string(),
        }
    }
}

/// Root configuration document
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub network: NetworkConfig,
    /// Site update interval in seconds
    pub interval: u64,
    pub database: DatabaseConfig,
    /// Default log level, overridable by `RUST_LOG` and `--log-level`
    pub log: String,
    pub meters: Vec<RawDeviceConfig>,
    pub chargers: Vec<RawDeviceConfig>,
    pub vehicles: Vec<RawDeviceConfig>,
    pub loadpoints: Vec<HashMap<String, serde_yaml::Value>>,
    pub tariffs: TariffsConfig,
    pub site: HashMap<String, serde_yaml::Value>,
    pub messaging: MessagingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            interval: default_interval(),
            database: DatabaseConfig::default(),
            log: default_log(),
            meters: Vec::new(),
            chargers: Vec::new(),
            vehicles: Vec::new(),
            loadpoints: Vec::new(),
            tariffs: TariffsConfig::default(),
            site: HashMap::new(),
            messaging: MessagingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load from a YAML file with the `AMPFLOW_` environment overlay
    pub fn load(path: impl AsRef<Path>) -> AmpResult<Self> {
        ampflow_common::load_config_from_file(path)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;

    #[test]
    fn test_host_port_elides_default_ports() {
        let mut network = NetworkConfig {
            schema: "http".to_string(),
            host: "ampflow.local".to_string(),
            port: 80,
        };
        assert_eq!(network.host_port(), "ampflow.local");
        assert_eq!(network.uri(), "http://ampflow.local");

        network.port = 7070;
        assert_eq!(network.host_port(), "ampflow.local:7070");
        assert_eq!(network.uri(), "http://ampflow.local:7070");

        network.schema = "https".to_string();
        network.port = 443;
        assert_eq!(network.uri(), "https://ampflow.local");
    }

    #[test]
    fn test_minimal_document_fills_defaults() {
        let config: SiteConfig = serde_yaml::from_str("site:\n  title: Home\n").expect("parse");
        assert_eq!(config.interval, 10);
        assert_eq!(config.log, "info");
        assert_eq!(config.network.port, 7070);
        assert!(config.meters.is_empty());
        assert!(config.loadpoints.is_empty());
    }

    #[test]
    fn test_device_sections_parse() {
        let yaml = r#"
meters:
  - name: grid
    type: demo
    power: 1000
loadpoints:
  - charger: wallbox
    title: Garage
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(config.meters.len(), 1);
        assert_eq!(config.meters[0].name, "grid");
        assert_eq!(config.meters[0].device_type, "demo");
        assert_eq!(config.loadpoints.len(), 1);
    }
}
