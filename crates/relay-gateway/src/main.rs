//! Relay server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p relay-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use relay_common::{try_init_tracing_with_config, RelayConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Configuration decides the log format, so it is loaded first
    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Relay failed to start");
        std::process::exit(1);
    }
}

async fn run(config: RelayConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        app = %config.app.name,
        env = ?config.app.env,
        address = %config.server.address(),
        default_hub = %config.hub.default_hub,
        grace_secs = config.hub.grace_period_secs,
        cipher = %config.reconnect.cipher,
        encoding = %config.reconnect.encoding,
        "Configuration loaded"
    );

    relay_gateway::run(config).await?;

    Ok(())
}
