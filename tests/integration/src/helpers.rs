//! Test helpers for integration tests
//!
//! Provides a relay server on an ephemeral port and utilities for waiting on
//! server-side state.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use relay_common::{JwtService, RelayConfig};
use relay_gateway::hub::Hub;
use relay_gateway::peer::{Peer, PeerState};
use relay_gateway::server::{create_app, serve, GatewayState};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::RelayClient;

/// Grace period used unless a test picks its own
pub const DEFAULT_GRACE: Duration = Duration::from_secs(30);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub http: reqwest::Client,
    state: GatewayState,
    jwt: JwtService,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server
    pub async fn start() -> Result<Self> {
        Self::start_with_config(RelayConfig::for_tests(DEFAULT_GRACE)).await
    }

    /// Start a test server whose peers wait `grace` for a reconnect
    pub async fn start_with_grace(grace: Duration) -> Result<Self> {
        Self::start_with_config(RelayConfig::for_tests(grace)).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: RelayConfig) -> Result<Self> {
        let jwt = JwtService::new(&config.jwt.secret, config.jwt.access_token_expiry);
        let state = GatewayState::from_config(config);
        let app = create_app(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            serve(listener, app).await.ok();
        });

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            addr,
            http,
            state,
            jwt,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// WebSocket URL for `path_and_query`
    pub fn ws_url(&self, path_and_query: &str) -> String {
        format!("ws://{}{}", self.addr, path_and_query)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.http.get(&url).send().await?)
    }

    /// Access token for `user_id` signed with the server's secret
    pub fn access_token(&self, user_id: &str) -> String {
        self.jwt
            .issue_access_token(user_id)
            .unwrap_or_else(|e| panic!("Failed to issue access token: {e}"))
    }

    /// Connect to the default hub as `user_id`
    pub async fn connect(&self, user_id: &str) -> Result<RelayClient> {
        let url = self.ws_url(&format!("/client?access_token={}", self.access_token(user_id)));
        RelayClient::connect(&url).await
    }

    /// Connect to `hub` as `user_id`
    pub async fn connect_to_hub(&self, hub: &str, user_id: &str) -> Result<RelayClient> {
        let url = self.ws_url(&format!(
            "/client/hubs/{hub}?access_token={}",
            self.access_token(user_id)
        ));
        RelayClient::connect(&url).await
    }

    /// Open a reconnect attempt to the default hub. Nothing is read.
    pub async fn reconnect(&self, connection_id: &str, token: &str) -> Result<RelayClient> {
        let url = self.ws_url(&format!(
            "/client?connection_id={connection_id}&reconnection_token={}",
            encode_query(token)
        ));
        RelayClient::try_connect(&url)
            .await
            .context("Reconnect handshake failed")
    }

    /// Hub by id, if any client has named it
    pub fn hub(&self, hub_id: &str) -> Option<Arc<Hub>> {
        self.state.hubs().get(hub_id)
    }

    pub fn default_hub(&self) -> Arc<Hub> {
        self.state
            .hubs()
            .get_or_create(&self.state.config().hub.default_hub)
    }

    /// Server-side peer for `connection_id` in the default hub
    pub fn peer(&self, connection_id: &str) -> Option<Arc<Peer>> {
        self.default_hub().peer(connection_id)
    }

    /// Wait until the default hub's peer reaches `state`
    pub async fn wait_for_peer_state(&self, connection_id: &str, state: PeerState) -> bool {
        wait_until(Duration::from_secs(5), || {
            self.peer(connection_id)
                .is_some_and(|peer| peer.state() == state)
        })
        .await
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` passes
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Percent-encode characters that base64 tokens may contain
pub fn encode_query(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('+', "%2B")
        .replace('/', "%2F")
        .replace('=', "%3D")
}
