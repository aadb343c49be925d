//! Concurrent per-class device construction.
//!
//! The builder fans construction of one class out across tasks, joins all
//! of them unconditionally, then applies the class failure policy on the
//! collected results. Only afterwards are handles connected and registered,
//! in merged order, so a failing class never registers partially.

use std::sync::Arc;

use errors::{AmpError, AmpResult};
use futures::future::join_all;
use tokio::task::JoinError;
use tracing::{debug, error};

use crate::device::registry::DeviceRegistry;
use crate::device::resolver::DriverRegistry;
use crate::device::traits::Vehicle;
use crate::device::{title_case, DeviceClass, DeviceHandle};
use crate::drivers::FallbackVehicle;

/// Reject descriptors without a name, citing the 1-based merged position
fn validate_names<T: ?Sized>(class: DeviceClass, handles: &[DeviceHandle<T>]) -> AmpResult<()> {
    for (index, handle) in handles.iter().enumerate() {
        if handle.name().is_empty() {
            return Err(AmpError::config(format!(
                "cannot create {class} {}: missing name",
                index + 1
            )));
        }
    }
    Ok(())
}

fn wrap_device_error(class: DeviceClass, name: &str, err: &AmpError) -> AmpError {
    let msg = format!("cannot create {class} '{name}': {err}");
    if err.is_config_error() {
        AmpError::Configuration(msg)
    } else {
        AmpError::Device(msg)
    }
}

fn flatten_join<T: ?Sized>(joined: Result<AmpResult<Arc<T>>, JoinError>) -> AmpResult<Arc<T>> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(AmpError::device(format!("construction task failed: {e}"))),
    }
}

/// Fan construction out, one task per handle, and join all results
async fn construct_all<T>(
    handles: &[DeviceHandle<T>],
    drivers: &DriverRegistry<T>,
) -> Vec<AmpResult<Arc<T>>>
where
    T: ?Sized + Send + Sync + 'static,
{
    let tasks: Vec<_> = handles
        .iter()
        .map(|handle| {
            let config = handle.config();
            tokio::spawn(drivers.construct(&config.device_type, config.attributes.clone()))
        })
        .collect();

    join_all(tasks).await.into_iter().map(flatten_join).collect()
}

/// Build one class with fail-fast policy (meters, chargers).
///
/// The first failure in merged order is returned; additional concurrent
/// failures are logged before returning. On success every handle is
/// connected and registered in merged order.
pub async fn build_class<T>(
    class: DeviceClass,
    handles: Vec<DeviceHandle<T>>,
    drivers: &DriverRegistry<T>,
    registry: &mut DeviceRegistry<T>,
) -> AmpResult<()>
where
    T: ?Sized + Send + Sync + 'static,
{
    validate_names(class, &handles)?;

    let results = construct_all(&handles, drivers).await;

    let mut constructed = Vec::with_capacity(handles.len());
    let mut first_err: Option<AmpError> = None;
    for (handle, result) in handles.iter().zip(results) {
        match result {
            Ok(instance) => constructed.push(instance),
            Err(e) => {
                let wrapped = wrap_device_error(class, handle.name(), &e);
                if first_err.is_none() {
                    first_err = Some(wrapped);
                } else {
                    error!("{wrapped}");
                }
            },
        }
    }
    if let Some(err) = first_err {
        return Err(err);
    }

    for (handle, instance) in handles.into_iter().zip(constructed) {
        handle.connect(instance)?;
        debug!(class = %class, device = handle.name(), source = ?handle.source(), "device bound");
        registry.add(Arc::new(handle))?;
    }
    Ok(())
}

/// Build the vehicle class with degradation policy.
///
/// Configuration errors stay fatal; construction errors substitute a
/// fallback stand-in that reports the original error when exercised.
/// Vehicles without a display title get one title-cased from their name.
pub async fn build_vehicles(
    handles: Vec<DeviceHandle<dyn Vehicle>>,
    drivers: &DriverRegistry<dyn Vehicle>,
    registry: &mut DeviceRegistry<dyn Vehicle>,
) -> AmpResult<()> {
    validate_names(DeviceClass::Vehicle, &handles)?;

    let results = construct_all(&handles, drivers).await;

    let mut constructed = Vec::with_capacity(handles.len());
    for (handle, result) in handles.iter().zip(results) {
        match result {
            Ok(vehicle) => constructed.push(vehicle),
            Err(e) if e.is_config_error() => {
                return Err(wrap_device_error(DeviceClass::Vehicle, handle.name(), &e));
            },
            Err(e) => {
                error!("creating vehicle {} failed: {e}", handle.name());
                let fallback = FallbackVehicle::new(&handle.config().attributes, &e);
                constructed.push(Arc::new(fallback) as Arc<dyn Vehicle>);
            },
        }
    }

    for (handle, vehicle) in handles.into_iter().zip(constructed) {
        if vehicle.title().is_empty() {
            vehicle.set_title(title_case(handle.name()));
        }
        handle.connect(vehicle)?;
        debug!(device = handle.name(), source = ?handle.source(), "vehicle bound");
        registry.add(Arc::new(handle))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;
    use crate::device::{DeviceSource, NamedConfig};

    fn handle<T: ?Sized>(name: &str) -> DeviceHandle<T> {
        DeviceHandle::new(
            NamedConfig {
                name: name.to_string(),
                device_type: "demo".to_string(),
                attributes: Default::default(),
            },
            DeviceSource::Static,
        )
    }

    #[test]
    fn test_validate_names_cites_one_based_position() {
        let handles: Vec<DeviceHandle<str>> = vec![handle("grid"), handle(""), handle("pv")];

        let err = validate_names(DeviceClass::Meter, &handles).expect_err("missing name");
        assert_eq!(err.to_string(), "cannot create meter 2: missing name");
        assert!(err.is_config_error());
    }

    #[test]
    fn test_wrap_keeps_error_classification() {
        let config = wrap_device_error(
            DeviceClass::Vehicle,
            "ev",
            &AmpError::UnknownDeviceType {
                class: "vehicle".to_string(),
                device_type: "nope".to_string(),
            },
        );
        assert!(config.is_config_error());
        assert_eq!(
            config.to_string(),
            "cannot create vehicle 'ev': unknown vehicle type: nope"
        );

        let device = wrap_device_error(DeviceClass::Meter, "grid", &AmpError::device("timeout"));
        assert!(!device.is_config_error());
    }
}
