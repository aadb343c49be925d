//! Two-phase device handles.
//!
//! A handle starts out holding only its descriptor. Construction binds the
//! driver instance through `connect`, exactly once; afterwards the handle is
//! read-only for the rest of the process lifetime.

use std::sync::{Arc, OnceLock};

use errors::{AmpError, AmpResult};

use super::NamedConfig;

/// Where a descriptor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSource {
    /// Declared in the site configuration file
    Static,
    /// Persisted row in the device store
    Persisted { id: i64 },
}

/// A descriptor bound to its driver instance in two phases.
pub struct DeviceHandle<T: ?Sized> {
    config: NamedConfig,
    source: DeviceSource,
    instance: OnceLock<Arc<T>>,
}

impl<T: ?Sized> DeviceHandle<T> {
    pub fn new(config: NamedConfig, source: DeviceSource) -> Self {
        Self {
            config,
            source,
            instance: OnceLock::new(),
        }
    }

    /// The descriptor this handle was created from
    pub fn config(&self) -> &NamedConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn source(&self) -> DeviceSource {
        self.source
    }

    /// Bind the constructed instance.
    ///
    /// The slot is single-assignment; a second call is rejected instead of
    /// overwriting the first binding.
    pub fn connect(&self, instance: Arc<T>) -> AmpResult<()> {
        self.instance
            .set(instance)
            .map_err(|_| AmpError::AlreadyBound(self.config.name.clone()))
    }

    /// The bound instance, if `connect` has completed
    pub fn instance(&self) -> Option<Arc<T>> {
        self.instance.get().cloned()
    }

    /// The bound instance, erroring while the handle is still unbound
    pub fn bound(&self) -> AmpResult<Arc<T>> {
        self.instance().ok_or_else(|| {
            AmpError::device(format!("device '{}' not connected", self.config.name))
        })
    }
}
