//! Relay configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use crate::auth::{CipherMode, TokenEncoding};
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub hub: HubConfig,
    pub reconnect: ReconnectConfig,
    pub jwt: JwtConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        }
    }
}

/// Listener configuration for the relay endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Hub and peer life-cycle settings
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Hub used when a client does not name one
    #[serde(default = "default_hub_id")]
    pub default_hub: String,
    /// Seconds a disconnected peer may take to reattach
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
}

impl HubConfig {
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

/// Reconnection credential settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    pub secret: String,
    #[serde(default = "default_token_max_age_secs")]
    pub token_max_age_secs: u64,
    #[serde(default)]
    pub cipher: CipherMode,
    #[serde(default)]
    pub encoding: TokenEncoding,
}

impl ReconnectConfig {
    #[must_use]
    pub fn token_max_age(&self) -> Duration {
        Duration::from_secs(self.token_max_age_secs)
    }
}

/// Primary access-token configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
}

// Default value functions
fn default_app_name() -> String {
    "relay".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_hub_id() -> String {
    "default".to_string()
}

fn default_grace_period_secs() -> u64 {
    30
}

fn default_token_max_age_secs() -> u64 {
    604_800 // 7 days
}

fn default_access_token_expiry() -> i64 {
    900 // 15 minutes
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(default),
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

impl RelayConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let port = required_var("RELAY_PORT")?;

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: parse_var("APP_ENV", Environment::default())?,
            },
            server: ServerConfig {
                host: env::var("RELAY_HOST").unwrap_or_else(|_| default_host()),
                port: port
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("RELAY_PORT", port.clone()))?,
            },
            hub: HubConfig {
                default_hub: env::var("RELAY_DEFAULT_HUB").unwrap_or_else(|_| default_hub_id()),
                grace_period_secs: parse_var("RELAY_GRACE_PERIOD_SECS", default_grace_period_secs())?,
            },
            reconnect: ReconnectConfig {
                secret: required_var("RECONNECT_SECRET")?,
                token_max_age_secs: parse_var(
                    "RECONNECT_TOKEN_MAX_AGE_SECS",
                    default_token_max_age_secs(),
                )?,
                cipher: parse_var("RECONNECT_CIPHER", CipherMode::default())?,
                encoding: parse_var("RECONNECT_ENCODING", TokenEncoding::default())?,
            },
            jwt: JwtConfig {
                secret: required_var("JWT_SECRET")?,
                access_token_expiry: parse_var(
                    "JWT_ACCESS_TOKEN_EXPIRY",
                    default_access_token_expiry(),
                )?,
            },
        })
    }

    /// Hermetic configuration for tests: ephemeral port, fixed secrets, given grace period.
    #[must_use]
    pub fn for_tests(grace_period: Duration) -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: Environment::Development,
            },
            server: ServerConfig {
                host: default_host(),
                port: 0,
            },
            hub: HubConfig {
                default_hub: default_hub_id(),
                grace_period_secs: grace_period.as_secs(),
            },
            reconnect: ReconnectConfig {
                secret: "test-reconnect-secret".to_string(),
                token_max_age_secs: default_token_max_age_secs(),
                cipher: CipherMode::Gcm,
                encoding: TokenEncoding::Hex,
            },
            jwt: JwtConfig {
                secret: "test-jwt-secret".to_string(),
                access_token_expiry: default_access_token_expiry(),
            },
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
