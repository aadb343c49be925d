//! Log-backed push messenger.

use async_trait::async_trait;
use errors::AmpResult;
use tracing::info;

use crate::device::traits::Messenger;
use crate::device::Attributes;

/// Messenger writing every event to the service log
pub struct LogMessenger {
    prefix: String,
}

impl LogMessenger {
    pub fn from_attributes(attributes: &Attributes) -> Self {
        Self {
            prefix: attributes.get("prefix").cloned().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Messenger for LogMessenger {
    async fn send(&self, title: &str, body: &str) -> AmpResult<()> {
        if self.prefix.is_empty() {
            info!(title, body, "push message");
        } else {
            info!(prefix = %self.prefix, title, body, "push message");
        }
        Ok(())
    }
}
