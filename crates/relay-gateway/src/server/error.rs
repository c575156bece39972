//! Session endpoint errors

use crate::peer::ReattachError;
use crate::protocol::CloseCode;
use relay_common::RelayError;
use thiserror::Error;

/// Failure after the WebSocket upgrade
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A fresh peer could not be opened
    #[error("Failed to open session: {0}")]
    Open(#[source] RelayError),

    /// Reattach refused
    #[error("Reconnect rejected: {0}")]
    Reattach(#[from] ReattachError),
}

impl GatewayError {
    /// Close code sent to the client
    pub fn to_close_code(&self) -> CloseCode {
        match self {
            Self::Open(_) => CloseCode::UnknownError,
            Self::Reattach(_) => CloseCode::ReconnectRejected,
        }
    }

    /// Text safe to send to the client. Never says why a reattach failed.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::Open(_) => "Failed to open session",
            Self::Reattach(_) => "Reconnection rejected",
        }
    }
}
