//! Peer lifecycle state
//!
//! `Alive -> AwaitingReconnect -> Alive | Dead`. `Dead` is terminal. Every
//! transition is a compare-and-swap so at most one contender wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum PeerState {
    /// Transport attached, frames are being read
    Alive = 0,
    /// Transport lost, grace period running
    AwaitingReconnect = 1,
    /// Terminal
    Dead = 2,
}

impl PeerState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Alive,
            1 => Self::AwaitingReconnect,
            _ => Self::Dead,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alive => "alive",
            Self::AwaitingReconnect => "awaiting-reconnect",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic cell holding a [`PeerState`]
#[derive(Debug)]
pub(crate) struct AtomicPeerState(AtomicU8);

impl AtomicPeerState {
    pub(crate) const fn new(state: PeerState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> PeerState {
        PeerState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Move `from -> to` if the current state is `from`
    pub(crate) fn transition(&self, from: PeerState, to: PeerState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Unconditionally store `state`, returning the previous one
    pub(crate) fn swap(&self, state: PeerState) -> PeerState {
        PeerState::from_u8(self.0.swap(state as u8, Ordering::SeqCst))
    }
}
