use super::PeerState;

/// Reasons a reattach attempt is refused
///
/// The endpoint reports every variant to the client the same way.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ReattachError {
    #[error("Invalid or expired reconnection token")]
    InvalidToken,

    #[error("Connection id does not match the peer")]
    ConnectionIdMismatch,

    #[error("Peer not found")]
    PeerNotFound,

    #[error("Peer is {0}, not awaiting reconnect")]
    NotAwaitingReconnect(PeerState),
}
