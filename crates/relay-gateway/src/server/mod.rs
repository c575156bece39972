//! Relay server setup
//!
//! Provides the session endpoint routes and server startup.

mod error;
mod handler;
mod state;

pub use error::GatewayError;
pub use handler::{client_handler, hub_client_handler, ConnectParams};
pub use state::GatewayState;

use axum::{routing::get, Router};
use relay_common::{RelayConfig, RelayError};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the relay router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/client", get(client_handler))
        .route("/client/hubs/:hub_id", get(hub_client_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on an already bound listener
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), RelayError> {
    axum::serve(listener, app)
        .await
        .map_err(|e| RelayError::Server(format!("Server error: {e}")))
}

/// Run the relay server on `addr`
pub async fn run_server(app: Router, addr: &str) -> Result<(), RelayError> {
    tracing::info!("Starting relay server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| RelayError::Server(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Relay listening on ws://{}/client", addr);

    serve(listener, app).await
}

/// Run the complete relay server with configuration
pub async fn run(config: RelayConfig) -> Result<(), RelayError> {
    let addr = config.server.address();

    let state = GatewayState::from_config(config);
    let app = create_app(state);

    run_server(app, &addr).await
}
