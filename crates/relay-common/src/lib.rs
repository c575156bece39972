//! # relay-common
//!
//! Shared utilities including configuration, error handling, credentials, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{
    derive_key, CipherError, CipherMode, Claims, IdentityProvider, JwtService,
    ReconnectionTokenCodec, TokenEncoding, TokenError,
};
pub use config::{
    AppSettings, ConfigError, Environment, HubConfig, JwtConfig, ReconnectConfig, RelayConfig,
    ServerConfig,
};
pub use error::{ErrorResponse, RelayError, RelayResult};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
