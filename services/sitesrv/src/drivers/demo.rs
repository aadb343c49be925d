//! Demo drivers backed by configuration values instead of hardware.

use async_trait::async_trait;
use errors::{AmpError, AmpResult};
use parking_lot::{Mutex, RwLock};

use crate::device::traits::{AuthProvider, Charger, Meter, Vehicle};
use crate::device::{parse_attribute, Attributes};

const DEFAULT_AUTHORIZE_URI: &str = "https://auth.demo.ampflow.dev/authorize";

fn check_broken(attributes: &Attributes, what: &str) -> AmpResult<()> {
    if parse_attribute::<bool>(attributes, "broken")?.unwrap_or(false) {
        return Err(AmpError::device(format!("demo {what} configured broken")));
    }
    Ok(())
}

/// Meter reporting a fixed power value
#[derive(Debug)]
pub struct DemoMeter {
    power: f64,
}

impl DemoMeter {
    pub fn from_attributes(attributes: &Attributes) -> AmpResult<Self> {
        check_broken(attributes, "meter")?;
        Ok(Self {
            power: parse_attribute(attributes, "power")?.unwrap_or(0.0),
        })
    }
}

#[async_trait]
impl Meter for DemoMeter {
    async fn current_power(&self) -> AmpResult<f64> {
        Ok(self.power)
    }
}

/// Charger remembering the state it was last set to
pub struct DemoCharger {
    enabled: Mutex<bool>,
    max_current: Mutex<i64>,
}

impl DemoCharger {
    pub fn from_attributes(attributes: &Attributes) -> AmpResult<Self> {
        check_broken(attributes, "charger")?;
        Ok(Self {
            enabled: Mutex::new(parse_attribute(attributes, "enabled")?.unwrap_or(false)),
            max_current: Mutex::new(parse_attribute(attributes, "maxcurrent")?.unwrap_or(16)),
        })
    }
}

#[async_trait]
impl Charger for DemoCharger {
    async fn enabled(&self) -> AmpResult<bool> {
        Ok(*self.enabled.lock())
    }

    async fn enable(&self, enable: bool) -> AmpResult<()> {
        *self.enabled.lock() = enable;
        Ok(())
    }

    async fn set_max_current(&self, current: i64) -> AmpResult<()> {
        if current <= 0 {
            return Err(AmpError::device(format!("invalid max current: {current}")));
        }
        *self.max_current.lock() = current;
        Ok(())
    }
}

/// Vehicle with a fixed state of charge and an optional login flow
pub struct DemoVehicle {
    title: RwLock<String>,
    capacity: f64,
    soc: f64,
    auth: Option<DemoAuthProvider>,
}

impl DemoVehicle {
    pub fn from_attributes(attributes: &Attributes) -> AmpResult<Self> {
        check_broken(attributes, "vehicle")?;

        let auth = if parse_attribute(attributes, "auth")?.unwrap_or(false) {
            let authorize_uri = attributes
                .get("authorize_uri")
                .cloned()
                .unwrap_or_else(|| DEFAULT_AUTHORIZE_URI.to_string());
            Some(DemoAuthProvider::new(authorize_uri))
        } else {
            None
        };

        Ok(Self {
            title: RwLock::new(attributes.get("title").cloned().unwrap_or_default()),
            capacity: parse_attribute(attributes, "capacity")?.unwrap_or(0.0),
            soc: parse_attribute(attributes, "soc")?.unwrap_or(0.0),
            auth,
        })
    }
}

#[async_trait]
impl Vehicle for DemoVehicle {
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
        Ok(self.soc)
    }

    fn auth_provider(&self) -> Option<&dyn AuthProvider> {
        self.auth.as_ref().map(|auth| auth as &dyn AuthProvider)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub base_uri: String,
    pub callback_uri: String,
}

/// Login flow stand-in handing out a static authorization URL
pub struct DemoAuthProvider {
    authorize_uri: String,
    callback: Mutex<Option<CallbackParams>>,
}

impl DemoAuthProvider {
    pub fn new(authorize_uri: String) -> Self {
        Self {
            authorize_uri,
            callback: Mutex::new(None),
        }
    }

    pub fn callback_params(&self) -> Option<CallbackParams> {
        self.callback.lock().clone()
    }
}

#[async_trait]
impl AuthProvider for DemoAuthProvider {
    async fn login(&self) -> AmpResult<String> {
        match self.callback.lock().as_ref() {
            Some(params) => Ok(format!(
                "{}?redirect_uri={}",
                self.authorize_uri, params.callback_uri
            )),
            None => Ok(self.authorize_uri.clone()),
        }
    }

    async fn logout(&self) -> AmpResult<()> {
        Ok(())
    }

    fn set_callback_params(&self, base_uri: &str, callback_uri: &str) {
        *self.callback.lock() = Some(CallbackParams {
            base_uri: base_uri.to_string(),
            callback_uri: callback_uri.to_string(),
        });
    }
}
