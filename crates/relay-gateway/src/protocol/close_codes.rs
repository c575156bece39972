//! WebSocket close codes
//!
//! Relay-specific close codes sent when the server ends a transport.

use serde::{Deserialize, Serialize};

/// Relay WebSocket close codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    /// Unknown error occurred
    UnknownError = 4000,
    /// Frame type the relay does not accept
    UnsupportedFrame = 4001,
    /// Inbound frame was not a valid envelope
    DecodeError = 4002,
    /// Access token missing or invalid
    AuthenticationFailed = 4004,
    /// Reconnection token refused, or the peer can no longer be resumed
    ReconnectRejected = 4009,
    /// Peer was closed by the server
    PeerClosed = 4010,
}

impl CloseCode {
    /// Create a `CloseCode` from a raw u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            4000 => Some(Self::UnknownError),
            4001 => Some(Self::UnsupportedFrame),
            4002 => Some(Self::DecodeError),
            4004 => Some(Self::AuthenticationFailed),
            4009 => Some(Self::ReconnectRejected),
            4010 => Some(Self::PeerClosed),
            _ => None,
        }
    }

    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Whether the client may resume the peer with its reconnection token
    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        matches!(
            self,
            Self::UnknownError | Self::UnsupportedFrame | Self::DecodeError
        )
    }

    /// Get the description for this close code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::UnknownError => "Unknown error occurred",
            Self::UnsupportedFrame => "Unsupported frame",
            Self::DecodeError => "Invalid payload encoding",
            Self::AuthenticationFailed => "Authentication failed",
            Self::ReconnectRejected => "Reconnection rejected",
            Self::PeerClosed => "Peer closed",
        }
    }

    /// Get the name of this close code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UnknownError => "UnknownError",
            Self::UnsupportedFrame => "UnsupportedFrame",
            Self::DecodeError => "DecodeError",
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::ReconnectRejected => "ReconnectRejected",
            Self::PeerClosed => "PeerClosed",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.as_u16(), self.description())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}
