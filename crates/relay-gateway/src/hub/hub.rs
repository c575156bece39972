//! Hub registry
//!
//! Owns the peers and groups of one hub. Group membership changes are made
//! while holding the peer's membership lock, so a peer's recorded group and
//! the groups' member sets never disagree.

use super::Group;
use crate::connection::ConnectionHandle;
use crate::peer::{Peer, ReattachError};
use dashmap::DashMap;
use relay_common::{ReconnectionTokenCodec, TokenError};
use std::sync::Arc;
use std::time::Duration;

pub struct Hub {
    id: String,
    peers: DashMap<String, Arc<Peer>>,
    groups: DashMap<String, Arc<Group>>,
    codec: Arc<ReconnectionTokenCodec>,
    grace_period: Duration,
}

impl Hub {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        codec: Arc<ReconnectionTokenCodec>,
        grace_period: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            peers: DashMap::new(),
            groups: DashMap::new(),
            codec,
            grace_period,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn codec(&self) -> &ReconnectionTokenCodec {
        &self.codec
    }

    /// Grace period given to peers of this hub
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    // === Peers ===

    /// Build a peer with a freshly issued reconnection token.
    ///
    /// The peer is not registered; see [`Hub::add_peer`].
    pub fn create_peer(
        self: &Arc<Self>,
        peer_id: String,
        user_id: String,
        connection: Arc<dyn ConnectionHandle>,
    ) -> Result<Arc<Peer>, TokenError> {
        let token = self.codec.issue_now(&peer_id)?;
        Ok(Peer::new(peer_id, user_id, token, connection, self))
    }

    pub fn add_peer(&self, peer: Arc<Peer>) {
        tracing::debug!(hub = %self.id, peer_id = %peer.id(), "Peer added");
        self.peers.insert(peer.id().to_string(), peer);
    }

    /// Unregister a peer and drop it from its group
    pub fn remove_peer(&self, peer_id: &str) -> Option<Arc<Peer>> {
        let (_, peer) = self.peers.remove(peer_id)?;

        let mut membership = peer.membership();
        if let Some(group_id) = membership.take() {
            if let Some(group) = self.group(&group_id) {
                group.remove_member(peer_id);
            }
        }
        drop(membership);

        tracing::debug!(hub = %self.id, peer_id = %peer_id, "Peer removed");
        Some(peer)
    }

    pub fn peer(&self, peer_id: &str) -> Option<Arc<Peer>> {
        self.peers.get(peer_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains_peer(&self, peer_id: &str) -> bool {
        self.peers.contains_key(peer_id)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn peer_ids(&self) -> Vec<String> {
        self.peers.iter().map(|entry| entry.key().clone()).collect()
    }

    // === Groups ===

    pub fn group(&self, group_id: &str) -> Option<Arc<Group>> {
        self.groups.get(group_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Known groups, including empty ones
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Move `peer_id` into `group_id`, leaving its previous group.
    ///
    /// Creates the group on first use. Joining the current group is a no-op.
    /// Returns false if the peer is not registered.
    pub fn join_group(&self, group_id: &str, peer_id: &str) -> bool {
        let Some(peer) = self.peer(peer_id) else {
            return false;
        };

        let mut membership = peer.membership();
        // Re-checked under the lock so a concurrent removal cannot leave a stale member
        if !self.contains_peer(peer_id) {
            return false;
        }
        if membership.as_deref() == Some(group_id) {
            return true;
        }

        if let Some(previous) = membership.take() {
            if let Some(group) = self.group(&previous) {
                group.remove_member(peer_id);
            }
        }

        let group = Arc::clone(
            self.groups
                .entry(group_id.to_string())
                .or_insert_with(|| Arc::new(Group::new(group_id)))
                .value(),
        );
        group.add_member(Arc::clone(&peer));
        *membership = Some(group_id.to_string());
        drop(membership);

        tracing::debug!(hub = %self.id, peer_id = %peer_id, group = %group_id, "Joined group");
        true
    }

    /// Remove `peer_id` from `group_id` if that is its current group
    pub fn leave_group(&self, group_id: &str, peer_id: &str) -> bool {
        let Some(peer) = self.peer(peer_id) else {
            return false;
        };

        let mut membership = peer.membership();
        if membership.as_deref() != Some(group_id) {
            return false;
        }
        if let Some(group) = self.group(group_id) {
            group.remove_member(peer_id);
        }
        *membership = None;
        drop(membership);

        tracing::debug!(hub = %self.id, peer_id = %peer_id, group = %group_id, "Left group");
        true
    }

    // === Resume ===

    /// Resume the peer named by `connection_id` on `connection`.
    ///
    /// The token is redeemed before anything is looked up or changed.
    pub fn reattach(
        &self,
        connection_id: &str,
        reconnection_token: &str,
        connection: Arc<dyn ConnectionHandle>,
    ) -> Result<Arc<Peer>, ReattachError> {
        let peer_id = self
            .codec
            .redeem_now(reconnection_token, connection_id)
            .map_err(|_| ReattachError::InvalidToken)?;

        let peer = self.peer(&peer_id).ok_or(ReattachError::PeerNotFound)?;
        peer.reattach(connection_id, connection)?;
        Ok(peer)
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("id", &self.id)
            .field("peers", &self.peers.len())
            .field("groups", &self.groups.len())
            .field("grace_period", &self.grace_period)
            .finish_non_exhaustive()
    }
}
