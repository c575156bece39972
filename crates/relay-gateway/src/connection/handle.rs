//! Transport abstraction
//!
//! A peer talks to its client through a [`ConnectionHandle`]. The handle is
//! swapped when the peer resumes on a new transport.

use crate::protocol::{CloseCode, Frame};
use async_trait::async_trait;

/// Transport failures
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,

    #[error("Transport I/O error: {0}")]
    Io(String),

    #[error("Failed to encode frame: {0}")]
    Encode(String),
}

/// One physical client connection
#[async_trait]
pub trait ConnectionHandle: Send + Sync + 'static {
    /// Transport-level id, distinct from the peer id
    fn id(&self) -> &str;

    async fn send(&self, frame: Frame) -> Result<(), TransportError>;

    /// Next inbound frame. `None` once the transport has closed cleanly.
    async fn recv(&self) -> Option<Result<Frame, TransportError>>;

    /// Close the transport, optionally with a relay close code. Idempotent.
    async fn close(&self, code: Option<CloseCode>);

    fn is_closed(&self) -> bool;
}
