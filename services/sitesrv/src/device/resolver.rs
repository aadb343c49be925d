//! Driver resolution registries.
//!
//! One registry per device class maps a driver type tag to an async
//! constructor. Registries are the sole extension point for new device
//! kinds; driver crates register their constructors here and the class
//! builders resolve against them. An unknown tag is a configuration error.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use errors::{AmpError, AmpResult};
use futures::future::BoxFuture;

use super::traits::{Charger, Messenger, Meter, Tariff, Vehicle};
use super::Attributes;

type Factory<T> = Box<dyn Fn(Attributes) -> BoxFuture<'static, AmpResult<Arc<T>>> + Send + Sync>;

/// Type-tag keyed constructor registry for one device class
pub struct DriverRegistry<T: ?Sized> {
    class: &'static str,
    factories: HashMap<String, Factory<T>>,
}

impl<T: ?Sized> DriverRegistry<T> {
    pub fn new(class: &'static str) -> Self {
        Self {
            class,
            factories: HashMap::new(),
        }
    }

    /// Register a constructor under its type tag, replacing any previous one
    pub fn register<F, Fut>(&mut self, device_type: &str, factory: F)
    where
        F: Fn(Attributes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AmpResult<Arc<T>>> + Send + 'static,
    {
        self.factories
            .insert(device_type.to_string(), Box::new(move |attrs| Box::pin(factory(attrs))));
    }

    pub fn contains(&self, device_type: &str) -> bool {
        self.factories.contains_key(device_type)
    }

    /// Registered type tags, sorted for stable output
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Construct an instance of `device_type` from `attributes`
    pub async fn create(&self, device_type: &str, attributes: Attributes) -> AmpResult<Arc<T>> {
        self.construct(device_type, attributes).await
    }

    /// Detached construction future for `device_type`.
    ///
    /// The returned future owns everything it needs, so callers can spawn
    /// it onto a task while the registry itself stays borrowed.
    pub fn construct(
        &self,
        device_type: &str,
        attributes: Attributes,
    ) -> BoxFuture<'static, AmpResult<Arc<T>>> {
        match self.factories.get(device_type) {
            Some(factory) => factory(attributes),
            None => {
                let err = AmpError::UnknownDeviceType {
                    class: self.class.to_string(),
                    device_type: device_type.to_string(),
                };
                Box::pin(async move { Err(err) })
            },
        }
    }
}

/// All driver registries consumed by a bootstrap run
pub struct DriverCatalog {
    pub meters: DriverRegistry<dyn Meter>,
    pub chargers: DriverRegistry<dyn Charger>,
    pub vehicles: DriverRegistry<dyn Vehicle>,
    pub tariffs: DriverRegistry<dyn Tariff>,
    pub messengers: DriverRegistry<dyn Messenger>,
}

impl DriverCatalog {
    /// Empty catalog, for callers that register their own drivers
    pub fn new() -> Self {
        Self {
            meters: DriverRegistry::new("meter"),
            chargers: DriverRegistry::new("charger"),
            vehicles: DriverRegistry::new("vehicle"),
            tariffs: DriverRegistry::new("tariff"),
            messengers: DriverRegistry::new("messenger"),
        }
    }

    /// Catalog pre-populated with the built-in drivers
    pub fn with_builtin() -> Self {
        let mut catalog = Self::new();
        crate::drivers::register_all(&mut catalog);
        catalog
    }
}

impl Default for DriverCatalog {
    fn default() -> Self {
        Self::new()
    }
}
