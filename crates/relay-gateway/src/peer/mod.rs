//! Peers
//!
//! A peer is one logical client. It outlives any single transport: when the
//! transport drops the peer waits out a grace period for the client to resume
//! with its reconnection token before dying.

mod error;
mod peer;
mod receive;
mod state;

pub use error::ReattachError;
pub use peer::Peer;
pub use state::PeerState;
