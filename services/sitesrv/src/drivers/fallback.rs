//! Stand-in vehicle substituted when a vehicle driver fails to construct.
//!
//! A mis-configured or unreachable vehicle integration must not block
//! charging on an otherwise healthy site. The fallback satisfies the
//! `Vehicle` surface and surfaces the original construction error from
//! every vehicle-specific operation.

use async_trait::async_trait;
use errors::{AmpError, AmpResult};
use parking_lot::RwLock;

use crate::device::traits::Vehicle;
use crate::device::{parse_attribute, Attributes};

pub struct FallbackVehicle {
    title: RwLock<String>,
    capacity: f64,
    error: String,
}

impl FallbackVehicle {
    /// Wrap a failed construction, salvaging what the attributes still tell us
    pub fn new(attributes: &Attributes, error: &AmpError) -> Self {
        let capacity = parse_attribute(attributes, "capacity")
            .ok()
            .flatten()
            .unwrap_or(0.0);
        Self {
            title: RwLock::new(String::new()),
            capacity,
            error: error.to_string(),
        }
    }

    fn unavailable(&self) -> AmpError {
        AmpError::device(format!("vehicle not available: {}", self.error))
    }
}

#[async_trait]
impl Vehicle for FallbackVehicle {
    fn title(&self) -> String {
        self.title.read().clone()
    }

    fn set_title(&self, title: String) {
        *self.title.write() = title;
    }

    fn capacity(&self) -> f64 {
        self.capacity
    }

    async fn soc(&self) -> AmpResult<f64> {
        Err(self.unavailable())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;

    #[tokio::test]
    async fn test_fallback_reports_original_error() {
        let mut attributes = Attributes::new();
        attributes.insert("capacity".to_string(), "58".to_string());

        let cause = AmpError::device("connection refused");
        let vehicle = FallbackVehicle::new(&attributes, &cause);

        assert_eq!(vehicle.title(), "");
        assert_eq!(vehicle.capacity(), 58.0);
        assert!(vehicle.auth_provider().is_none());

        let err = vehicle.soc().await.expect_err("unavailable");
        assert!(err.to_string().contains("vehicle not available"));
        assert!(err.to_string().contains("connection refused"));
    }
}
