//! Configuration loading built on figment.
//!
//! Site configuration lives in a single YAML file. Environment variables
//! prefixed with `AMPFLOW_` overlay the file so deployments can override
//! individual keys without editing it.

use std::path::Path;

use errors::{AmpError, AmpResult};
use figment::{
    providers::{Env, Format, Json, Toml, Yaml},
    Figment,
};
use serde::Deserialize;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "AMPFLOW_";

/// Load configuration from a specific file with environment overlay
pub fn load_config_from_file<T, P>(path: P) -> AmpResult<T>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Err(AmpError::config(format!(
            "config file not found: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| AmpError::config("config file must have an extension"))?;

    let figment = match extension {
        "toml" => Figment::new().merge(Toml::file(path)),
        "yaml" | "yml" => Figment::new().merge(Yaml::file(path)),
        "json" => Figment::new().merge(Json::file(path)),
        _ => {
            return Err(AmpError::config(format!(
                "unsupported config file format: {extension}"
            )))
        }
    };

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| AmpError::config(format!("failed to load configuration: {e}")))
}
