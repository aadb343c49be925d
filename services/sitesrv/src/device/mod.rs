//! Device descriptor model
//!
//! A descriptor names one device: its class, a driver type tag and a
//! flattened string attribute map. Descriptors come from two sources, the
//! static site configuration file and the SQLite device store, and are
//! merged per class into deferred-binding handles before construction.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use errors::{AmpError, AmpResult};
use serde::{Deserialize, Serialize};

pub mod handle;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod traits;

pub use handle::{DeviceHandle, DeviceSource};
pub use registry::DeviceRegistry;
pub use resolver::{DriverCatalog, DriverRegistry};
pub use store::{name_for_id, DeviceConfigRow, DeviceStore};

/// Flattened device attribute map
pub type Attributes = HashMap<String, String>;

/// Device class enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Meter,
    Charger,
    Vehicle,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Meter => "meter",
            DeviceClass::Charger => "charger",
            DeviceClass::Vehicle => "vehicle",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceClass {
    type Err = AmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meter" => Ok(DeviceClass::Meter),
            "charger" => Ok(DeviceClass::Charger),
            "vehicle" => Ok(DeviceClass::Vehicle),
            other => Err(AmpError::config(format!("unknown device class: {other}"))),
        }
    }
}

/// A named device descriptor ready for construction
#[derive(Debug, Clone, PartialEq)]
pub struct NamedConfig {
    pub name: String,
    pub device_type: String,
    pub attributes: Attributes,
}

/// A name-less descriptor for devices addressed positionally (tariffs, messengers)
#[derive(Debug, Clone, PartialEq)]
pub struct TypedConfig {
    pub device_type: String,
    pub attributes: Attributes,
}

/// Device entry as written in the site configuration file.
/// A missing name deserializes empty so the class builder can report the
/// device position instead of a bare parse error.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDeviceConfig {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(flatten)]
    pub other: HashMap<String, serde_yaml::Value>,
}

impl RawDeviceConfig {
    pub fn named(&self) -> AmpResult<NamedConfig> {
        Ok(NamedConfig {
            name: self.name.clone(),
            device_type: self.device_type.clone(),
            attributes: flatten_attributes(&self.other)?,
        })
    }
}

/// Typed entry as written in the site configuration file (no name)
#[derive(Debug, Clone, Deserialize)]
pub struct RawTypedConfig {
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(flatten)]
    pub other: HashMap<String, serde_yaml::Value>,
}

impl RawTypedConfig {
    pub fn typed(&self) -> AmpResult<TypedConfig> {
        Ok(TypedConfig {
            device_type: self.device_type.clone(),
            attributes: flatten_attributes(&self.other)?,
        })
    }
}

/// Flatten raw configuration values to the canonical string attribute form.
///
/// Strings are kept verbatim, scalars use their display form, nested
/// sequences and mappings render as compact JSON.
pub fn flatten_attributes(raw: &HashMap<String, serde_yaml::Value>) -> AmpResult<Attributes> {
    let mut attributes = Attributes::with_capacity(raw.len());
    for (key, value) in raw {
        attributes.insert(key.clone(), flatten_value(value)?);
    }
    Ok(attributes)
}

fn flatten_value(value: &serde_yaml::Value) -> AmpResult<String> {
    Ok(match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_json::to_string(other)?,
    })
}

/// Parse an optional attribute into its typed form
pub fn parse_attribute<T>(attributes: &Attributes, key: &str) -> AmpResult<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match attributes.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AmpError::config(format!("invalid {key}: {e}"))),
        None => Ok(None),
    }
}

/// Title-case a device name for use as a display title
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Merge statically declared descriptors with persisted store rows for one class.
///
/// Static entries keep their declared order; store rows follow, ordered by id
/// ascending under their synthesized `db:<id>` names. The two sources are not
/// deduplicated; an overlapping name surfaces later as a registry error.
pub async fn merge_devices<T: ?Sized>(
    store: &DeviceStore,
    class: DeviceClass,
    static_configs: &[RawDeviceConfig],
) -> AmpResult<Vec<DeviceHandle<T>>> {
    let mut handles = Vec::with_capacity(static_configs.len());
    for raw in static_configs {
        handles.push(DeviceHandle::new(raw.named()?, DeviceSource::Static));
    }
    for row in store.list_by_class(class).await? {
        let source = DeviceSource::Persisted { id: row.id };
        handles.push(DeviceHandle::new(row.named(), source));
    }
    Ok(handles)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;

    #[test]
    fn test_flatten_keeps_strings_verbatim() {
        let mut raw = HashMap::new();
        raw.insert(
            "host".to_string(),
            serde_yaml::Value::String("127.0.0.1".to_string()),
        );
        raw.insert("power".to_string(), serde_yaml::from_str("4200").expect("yaml"));
        raw.insert("enabled".to_string(), serde_yaml::Value::Bool(true));

        let attrs = flatten_attributes(&raw).expect("flatten");
        assert_eq!(attrs.get("host").map(String::as_str), Some("127.0.0.1"));
        assert_eq!(attrs.get("power").map(String::as_str), Some("4200"));
        assert_eq!(attrs.get("enabled").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_flatten_renders_nested_values_as_json() {
        let mut raw = HashMap::new();
        raw.insert(
            "phases".to_string(),
            serde_yaml::from_str("[1, 2, 3]").expect("yaml"),
        );

        let attrs = flatten_attributes(&raw).expect("flatten");
        assert_eq!(attrs.get("phases").map(String::as_str), Some("[1,2,3]"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("garage"), "Garage");
        assert_eq!(title_case("white model 3"), "White Model 3");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_device_class_round_trip() {
        for class in [DeviceClass::Meter, DeviceClass::Charger, DeviceClass::Vehicle] {
            assert_eq!(class.as_str().parse::<DeviceClass>().expect("parse"), class);
        }
        assert!("tariff".parse::<DeviceClass>().is_err());
    }
}
