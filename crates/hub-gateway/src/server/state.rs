//! Gateway state
//!
//! Shared by every request handler.

use crate::hub::HubHandle;
use crate::identity::NameGenerator;
use hub_common::HubConfig;
use std::sync::Arc;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    /// Handle to the running hub
    hub: HubHandle,
    /// Hub tunables
    config: Arc<HubConfig>,
    /// Display names for new sessions
    names: Arc<dyn NameGenerator>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(
        hub: HubHandle,
        config: HubConfig,
        names: Arc<dyn NameGenerator>,
    ) -> Self {
        Self {
            hub,
            config: Arc::new(config),
            names,
        }
    }

    /// Get the hub handle
    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Get the hub configuration
    pub fn config(&self) -> &Arc<HubConfig> {
        &self.config
    }

    /// Get the name generator
    pub fn names(&self) -> &dyn NameGenerator {
        self.names.as_ref()
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("hub", &self.hub)
            .field("config", &self.config)
            .finish()
    }
}
