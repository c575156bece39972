//! Relay error types
//!
//! Errors surfaced at the relay's outer boundary (HTTP upgrade, startup).

use crate::config::ConfigError;
use serde::Serialize;
use std::fmt;

/// Relay-wide error type
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    // Credential errors
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid access token")]
    InvalidAccessToken,

    /// Reconnection credential rejected. Deliberately carries no reason.
    #[error("Invalid or expired reconnection token")]
    InvalidReconnectionToken,

    // Registry errors
    #[error("Peer not found: {0}")]
    PeerNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Server error: {0}")]
    Server(String),
}

impl RelayError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::InvalidInput(_) => 400,

            // 401 Unauthorized
            Self::MissingAuth | Self::InvalidAccessToken | Self::InvalidReconnectionToken => 401,

            // 404 Not Found
            Self::PeerNotFound(_) => 404,

            // 500 Internal Server Error
            Self::Transport(_) | Self::Config(_) | Self::Server(_) => 500,
        }
    }

    /// Get error code for responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingAuth => "MISSING_AUTH",
            Self::InvalidAccessToken => "INVALID_TOKEN",
            Self::InvalidReconnectionToken => "INVALID_RECONNECTION_TOKEN",
            Self::PeerNotFound(_) => "PEER_NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Server(_) => "SERVER_ERROR",
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(msg: impl fmt::Display) -> Self {
        Self::InvalidInput(msg.to_string())
    }
}

/// Error response body returned when an upgrade is refused
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&RelayError> for ErrorResponse {
    fn from(err: &RelayError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for relay operations
pub type RelayResult<T> = Result<T, RelayError>;
