//! Gateway state
//!
//! Application state for the relay server.

use crate::hub::HubDirectory;
use relay_common::{IdentityProvider, JwtService, RelayConfig};
use std::sync::Arc;

/// Shared dependencies of the session endpoint
#[derive(Clone)]
pub struct GatewayState {
    /// Hubs by id
    hubs: Arc<HubDirectory>,
    /// Resolves access tokens to users
    identity: Arc<dyn IdentityProvider>,
    config: Arc<RelayConfig>,
}

impl GatewayState {
    pub fn new(config: RelayConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            hubs: Arc::new(HubDirectory::from_config(&config)),
            identity,
            config: Arc::new(config),
        }
    }

    /// State authenticating clients with HS256 access tokens
    pub fn from_config(config: RelayConfig) -> Self {
        let jwt = JwtService::new(&config.jwt.secret, config.jwt.access_token_expiry);
        Self::new(config, Arc::new(jwt))
    }

    pub fn hubs(&self) -> &Arc<HubDirectory> {
        &self.hubs
    }

    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("hubs", &self.hubs)
            .field("config", &"RelayConfig")
            .finish()
    }
}
