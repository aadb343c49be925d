//! Shared application state.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::auth::AuthCollection;
use crate::bootstrap::SiteSystem;
use crate::device::registry::SiteRegistries;
use crate::device::store::DeviceStore;
use crate::push::PushEvent;
use crate::site::Site;

/// State shared by all HTTP handlers
pub struct AppState {
    pub site: Arc<Site>,
    pub registries: Arc<SiteRegistries>,
    pub auth: AuthCollection,
    pub store: DeviceStore,
    pub message_tx: mpsc::Sender<PushEvent>,
}

impl AppState {
    pub fn new(system: SiteSystem, store: DeviceStore) -> Self {
        Self {
            site: system.site,
            registries: system.registries,
            auth: system.auth,
            store,
            message_tx: system.message_tx,
        }
    }
}
