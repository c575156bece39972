//! Connection management
//!
//! Transports and the session helper that binds them to peers.

mod handle;
#[cfg(test)]
mod memory;
mod session;
mod websocket;

pub use handle::{ConnectionHandle, TransportError};
#[cfg(test)]
pub use memory::{MemoryClient, MemoryConnection};
pub use session::Session;
pub use websocket::WsConnection;
