//! Peer lifecycle and traffic events

use crate::protocol::{
    EventMessage, JoinGroupMessage, LeaveGroupMessage, SendToGroupMessage, SequenceAckMessage,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event kinds observers can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerEventKind {
    // Lifecycle
    /// Transport lost, grace period started
    #[serde(rename = "awaiting-reconnect")]
    AwaitingReconnect,
    /// Peer resumed on a new transport
    Alive,
    /// Terminal
    Died,

    // Inbound traffic
    Event,
    JoinGroup,
    LeaveGroup,
    SendToGroup,
    SequenceAck,
}

impl PeerEventKind {
    /// Every kind, in declaration order
    pub const ALL: [Self; 8] = [
        Self::AwaitingReconnect,
        Self::Alive,
        Self::Died,
        Self::Event,
        Self::JoinGroup,
        Self::LeaveGroup,
        Self::SendToGroup,
        Self::SequenceAck,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingReconnect => "awaiting-reconnect",
            Self::Alive => "alive",
            Self::Died => "died",
            Self::Event => "event",
            Self::JoinGroup => "joingroup",
            Self::LeaveGroup => "leavegroup",
            Self::SendToGroup => "sendtogroup",
            Self::SequenceAck => "sequenceack",
        }
    }

    #[must_use]
    pub const fn is_lifecycle(self) -> bool {
        matches!(self, Self::AwaitingReconnect | Self::Alive | Self::Died)
    }
}

impl fmt::Display for PeerEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event raised by a peer
///
/// Inbound traffic events carry the decoded envelope so observers can act on
/// the request themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    AwaitingReconnect,
    Alive,
    Died,
    Event(EventMessage),
    JoinGroup(JoinGroupMessage),
    LeaveGroup(LeaveGroupMessage),
    SendToGroup(SendToGroupMessage),
    SequenceAck(SequenceAckMessage),
}

impl PeerEvent {
    #[must_use]
    pub const fn kind(&self) -> PeerEventKind {
        match self {
            Self::AwaitingReconnect => PeerEventKind::AwaitingReconnect,
            Self::Alive => PeerEventKind::Alive,
            Self::Died => PeerEventKind::Died,
            Self::Event(_) => PeerEventKind::Event,
            Self::JoinGroup(_) => PeerEventKind::JoinGroup,
            Self::LeaveGroup(_) => PeerEventKind::LeaveGroup,
            Self::SendToGroup(_) => PeerEventKind::SendToGroup,
            Self::SequenceAck(_) => PeerEventKind::SequenceAck,
        }
    }
}
