//! Push messaging hub.
//!
//! Events raised by the service are rendered through per-event templates
//! and fanned out to every configured messaging service. Messenger
//! construction failures are fatal at bootstrap; delivery failures at
//! runtime are logged and dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use errors::{AmpError, AmpResult};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::device::resolver::DriverRegistry;
use crate::device::traits::Messenger;
use crate::device::RawTypedConfig;

/// Message templates for one event kind
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventTemplate {
    pub title: String,
    pub msg: String,
}

/// The `messaging:` section of the site configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    pub events: HashMap<String, EventTemplate>,
    pub services: Vec<RawTypedConfig>,
}

/// One event pushed through the hub
#[derive(Debug, Clone)]
pub struct PushEvent {
    pub event: String,
    /// Values substituted for `${key}` placeholders in the templates
    pub values: HashMap<String, String>,
}

impl PushEvent {
    pub fn new(event: &str) -> Self {
        Self {
            event: event.to_string(),
            values: HashMap::new(),
        }
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

/// Fans rendered events out to the configured messengers
pub struct MessageHub {
    events: HashMap<String, EventTemplate>,
    messengers: Vec<Arc<dyn Messenger>>,
}

impl fmt::Debug for MessageHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageHub")
            .field("events", &self.events)
            .field("messengers", &self.messengers.len())
            .finish()
    }
}

impl MessageHub {
    /// Build the hub and its messengers from configuration
    pub async fn from_config(
        config: &MessagingConfig,
        registry: &DriverRegistry<dyn Messenger>,
    ) -> AmpResult<Self> {
        let mut messengers = Vec::with_capacity(config.services.len());
        for service in &config.services {
            let messenger = configure_messenger(service, registry).await.map_err(|e| {
                AmpError::config(format!(
                    "failed configuring messaging service {}: {e}",
                    service.device_type
                ))
            })?;
            messengers.push(messenger);
        }

        Ok(Self {
            events: config.events.clone(),
            messengers,
        })
    }

    pub fn messenger_count(&self) -> usize {
        self.messengers.len()
    }

    /// Render `event` and deliver it to every messenger.
    ///
    /// Events without a configured template are skipped.
    pub async fn push(&self, event: &PushEvent) {
        let Some(template) = self.events.get(&event.event) else {
            return;
        };

        let title = render(&template.title, &event.values);
        let body = render(&template.msg, &event.values);

        for messenger in &self.messengers {
            if let Err(e) = messenger.send(&title, &body).await {
                error!(event = %event.event, "push failed: {e}");
            }
        }
    }

    /// Consume events until the channel closes
    pub async fn run(self, mut rx: mpsc::Receiver<PushEvent>) {
        info!(messengers = self.messengers.len(), "message hub running");
        while let Some(event) = rx.recv().await {
            self.push(&event).await;
        }
    }
}

async fn configure_messenger(
    service: &RawTypedConfig,
    registry: &DriverRegistry<dyn Messenger>,
) -> AmpResult<Arc<dyn Messenger>> {
    let typed = service.typed()?;
    registry.create(&typed.device_type, typed.attributes).await
}

fn render(template: &str, values: &HashMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("${{{key}}}"), value);
    }
    out
}
