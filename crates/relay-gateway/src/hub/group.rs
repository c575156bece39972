//! Named broadcast group

use crate::peer::Peer;
use crate::protocol::{DataMessage, DownstreamMessage, MessageData};
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;

/// A named set of peers receiving each other's broadcasts
pub struct Group {
    id: String,
    members: DashMap<String, Arc<Peer>>,
}

impl Group {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            members: DashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, peer_id: &str) -> bool {
        self.members.contains_key(peer_id)
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|entry| entry.key().clone()).collect()
    }

    pub(crate) fn add_member(&self, peer: Arc<Peer>) {
        self.members.insert(peer.id().to_string(), peer);
    }

    pub(crate) fn remove_member(&self, peer_id: &str) -> bool {
        self.members.remove(peer_id).is_some()
    }

    /// Deliver `data` from `from` to every `Alive` member.
    ///
    /// Members that are not `Alive` are skipped and individual delivery
    /// failures are dropped. With `no_echo` the sender is excluded. Returns the
    /// number of members the payload was delivered to.
    pub async fn send(&self, from: &str, no_echo: bool, data: &MessageData) -> usize {
        let recipients: Vec<Arc<Peer>> = self
            .members
            .iter()
            .filter(|entry| !(no_echo && entry.key() == from))
            .map(|entry| Arc::clone(entry.value()))
            .filter(|peer| peer.is_alive())
            .collect();

        if recipients.is_empty() {
            return 0;
        }

        let message = DownstreamMessage::Message(DataMessage {
            from: Some(from.to_string()),
            group: Some(self.id.clone()),
            data: data.clone(),
        });
        let frame = match message.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(group = %self.id, error = %e, "Failed to encode broadcast");
                return 0;
            }
        };

        let results = join_all(
            recipients
                .iter()
                .map(|peer| peer.send_frame(frame.clone())),
        )
        .await;

        let mut delivered = 0;
        for (peer, result) in recipients.iter().zip(results) {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(
                        group = %self.id,
                        peer_id = %peer.id(),
                        error = %e,
                        "Broadcast delivery failed"
                    );
                }
            }
        }
        delivered
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("id", &self.id)
            .field("members", &self.members.len())
            .finish()
    }
}
