//! Session management
//!
//! Opens peers for fresh connections and resumes them on reconnect.

use super::ConnectionHandle;
use crate::events::PeerEventKind;
use crate::hub::Hub;
use crate::peer::{Peer, ReattachError};
use relay_common::RelayError;
use std::sync::Arc;

/// Session helper binding transports to peers
pub struct Session;

impl Session {
    /// Generate a new peer id
    #[must_use]
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Create, register, and start a peer for an authenticated user.
    ///
    /// The peer is evicted from `hub` when it dies.
    pub async fn open(
        hub: &Arc<Hub>,
        user_id: &str,
        connection: Arc<dyn ConnectionHandle>,
    ) -> Result<Arc<Peer>, RelayError> {
        let peer = hub
            .create_peer(Self::generate_id(), user_id.to_string(), connection)
            .map_err(|e| RelayError::Server(e.to_string()))?;

        Self::evict_on_death(hub, &peer);
        hub.add_peer(Arc::clone(&peer));

        if let Err(e) = peer.start().await {
            peer.close();
            return Err(RelayError::Transport(e.to_string()));
        }

        tracing::info!(
            hub = %hub.id(),
            peer_id = %peer.id(),
            user_id = %user_id,
            "Peer connected"
        );

        Ok(peer)
    }

    /// Resume the peer named by `connection_id` on a new transport
    pub fn resume(
        hub: &Hub,
        connection_id: &str,
        reconnection_token: &str,
        connection: Arc<dyn ConnectionHandle>,
    ) -> Result<Arc<Peer>, ReattachError> {
        match hub.reattach(connection_id, reconnection_token, connection) {
            Ok(peer) => Ok(peer),
            Err(e) => {
                tracing::info!(
                    hub = %hub.id(),
                    connection_id = %connection_id,
                    reason = %e,
                    "Reconnect rejected"
                );
                Err(e)
            }
        }
    }

    fn evict_on_death(hub: &Arc<Hub>, peer: &Peer) {
        let hub = Arc::downgrade(hub);
        let peer_id = peer.id().to_string();
        peer.observers().on(PeerEventKind::Died, move |_| {
            if let Some(hub) = hub.upgrade() {
                hub.remove_peer(&peer_id);
            }
        });
    }
}
