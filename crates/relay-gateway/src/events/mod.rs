//! Peer events
//!
//! Lifecycle and inbound-traffic events, and the per-peer observer registry.

mod observers;
mod peer_event;

pub use observers::{ListenerId, Observers};
pub use peer_event::{PeerEvent, PeerEventKind};
