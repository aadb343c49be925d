//! Class-scoped device registries.
//!
//! One registry per device class, populated exactly once during bootstrap
//! and read-only afterwards. Registries are owned by the bootstrap context
//! and passed to consumers by reference, never process-global.

use std::collections::HashMap;
use std::sync::Arc;

use errors::{AmpError, AmpResult};

use super::handle::DeviceHandle;
use super::traits::{Charger, Meter, Vehicle};

/// Ordered collection of bound handles for one device class
pub struct DeviceRegistry<T: ?Sized> {
    handles: Vec<Arc<DeviceHandle<T>>>,
    by_name: HashMap<String, usize>,
}

impl<T: ?Sized> Default for DeviceRegistry<T> {
    fn default() -> Self {
        Self {
            handles: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T: ?Sized> DeviceRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bound handle under its descriptor name.
    ///
    /// Empty and duplicate names are rejected.
    pub fn add(&mut self, handle: Arc<DeviceHandle<T>>) -> AmpResult<()> {
        let name = handle.name().to_string();
        if name.is_empty() {
            return Err(AmpError::config("missing device name"));
        }
        if self.by_name.contains_key(&name) {
            return Err(AmpError::DuplicateDevice(name));
        }
        self.by_name.insert(name, self.handles.len());
        self.handles.push(handle);
        Ok(())
    }

    /// Look up a handle by descriptor name
    pub fn get(&self, name: &str) -> Option<&Arc<DeviceHandle<T>>> {
        self.by_name.get(name).map(|&idx| &self.handles[idx])
    }

    /// The bound instance registered under `name`
    pub fn device(&self, name: &str) -> AmpResult<Arc<T>> {
        match self.get(name) {
            Some(handle) => handle.bound(),
            None => Err(AmpError::device(format!("unknown device: {name}"))),
        }
    }

    /// All handles in registration order
    pub fn handles(&self) -> &[Arc<DeviceHandle<T>>] {
        &self.handles
    }

    /// All bound instances in registration order
    pub fn devices(&self) -> Vec<Arc<T>> {
        self.handles.iter().filter_map(|h| h.instance()).collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// The three class registries produced by a bootstrap run
#[derive(Default)]
pub struct SiteRegistries {
    pub meters: DeviceRegistry<dyn Meter>,
    pub chargers: DeviceRegistry<dyn Charger>,
    pub vehicles: DeviceRegistry<dyn Vehicle>,
}

impl SiteRegistries {
    pub fn new() -> Self {
        Self::default()
    }
}
