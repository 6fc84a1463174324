//! Provider data structure passed to resources

use crate::api::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct ContentfulProviderData {
    pub client: Arc<Client>,
    pub settle: SettleConfig,
}

impl ContentfulProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
            settle: SettleConfig::default(),
        }
    }

    pub fn with_settle(mut self, settle: SettleConfig) -> Self {
        self.settle = settle;
        self
    }
}

/// Bounded wait for a freshly created asset's version to move past the
/// version returned by the create call
#[derive(Clone, Debug)]
pub struct SettleConfig {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_millis(500),
        }
    }
}
