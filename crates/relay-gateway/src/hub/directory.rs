//! Hub directory
//!
//! Hubs are created lazily the first time a client names them.

use super::Hub;
use dashmap::DashMap;
use relay_common::{ReconnectionTokenCodec, RelayConfig};
use std::sync::Arc;
use std::time::Duration;

pub struct HubDirectory {
    hubs: DashMap<String, Arc<Hub>>,
    codec: Arc<ReconnectionTokenCodec>,
    grace_period: Duration,
}

impl HubDirectory {
    #[must_use]
    pub fn new(codec: Arc<ReconnectionTokenCodec>, grace_period: Duration) -> Self {
        Self {
            hubs: DashMap::new(),
            codec,
            grace_period,
        }
    }

    #[must_use]
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            Arc::new(ReconnectionTokenCodec::from_config(&config.reconnect)),
            config.hub.grace_period(),
        )
    }

    /// Shared token codec handed to every hub
    pub fn codec(&self) -> &ReconnectionTokenCodec {
        &self.codec
    }

    pub fn get(&self, hub_id: &str) -> Option<Arc<Hub>> {
        self.hubs.get(hub_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn get_or_create(&self, hub_id: &str) -> Arc<Hub> {
        if let Some(hub) = self.get(hub_id) {
            return hub;
        }

        let hub = self.hubs.entry(hub_id.to_string()).or_insert_with(|| {
            tracing::info!(hub = %hub_id, "Hub created");
            Hub::new(hub_id, Arc::clone(&self.codec), self.grace_period)
        });
        Arc::clone(hub.value())
    }

    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    pub fn hub_ids(&self) -> Vec<String> {
        self.hubs.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl std::fmt::Debug for HubDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubDirectory")
            .field("hubs", &self.hubs.len())
            .field("grace_period", &self.grace_period)
            .finish_non_exhaustive()
    }
}
