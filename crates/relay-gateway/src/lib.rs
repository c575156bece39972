//! # relay-gateway
//!
//! Real-time group-messaging relay. Clients connect over WebSocket, join a
//! group within a hub, and broadcast to its members. A client whose transport
//! drops keeps its peer for a grace period and can resume it with a sealed
//! reconnection token.

pub mod connection;
pub mod events;
pub mod hub;
pub mod peer;
pub mod protocol;
pub mod server;

pub use server::run;
