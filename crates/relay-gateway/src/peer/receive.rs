//! Inbound frame loop and dispatch

use super::Peer;
use crate::connection::ConnectionHandle;
use crate::events::PeerEvent;
use crate::protocol::{AckError, AckMessage, CloseCode, UpstreamMessage};
use std::sync::Arc;

/// Read frames until the transport fails or the peer leaves `Alive`.
pub(super) async fn read_loop(peer: Arc<Peer>, connection: Arc<dyn ConnectionHandle>) {
    let code = loop {
        match connection.recv().await {
            None => {
                tracing::debug!(peer_id = %peer.id(), "Transport closed by client");
                break None;
            }
            Some(Err(e)) => {
                tracing::debug!(peer_id = %peer.id(), error = %e, "Transport read failed");
                break None;
            }
            Some(Ok(frame)) => match UpstreamMessage::from_frame(&frame) {
                Ok(message) => dispatch(&peer, message).await,
                Err(e) => {
                    tracing::warn!(
                        peer_id = %peer.id(),
                        frame_len = frame.len(),
                        error = %e,
                        "Malformed frame, dropping transport"
                    );
                    break Some(CloseCode::DecodeError);
                }
            },
        }

        if !peer.is_alive() {
            return;
        }
    };

    peer.connection_lost(connection.id(), code);
}

async fn dispatch(peer: &Arc<Peer>, message: UpstreamMessage) {
    tracing::trace!(peer_id = %peer.id(), kind = message.kind(), "Inbound message");

    match message {
        UpstreamMessage::JoinGroup(join) => {
            peer.observers().emit(&PeerEvent::JoinGroup(join.clone()));

            let joined = peer
                .hub()
                .is_some_and(|hub| hub.join_group(&join.group, peer.id()));

            if let Some(ack_id) = join.ack_id {
                let ack = if joined {
                    AckMessage::success(ack_id)
                } else {
                    AckMessage::failure(ack_id, AckError::internal("Peer is no longer registered"))
                };
                reply(peer, ack).await;
            }
        }
        UpstreamMessage::LeaveGroup(leave) => {
            peer.observers().emit(&PeerEvent::LeaveGroup(leave.clone()));

            if let Some(hub) = peer.hub() {
                hub.leave_group(&leave.group, peer.id());
            }
            if let Some(ack_id) = leave.ack_id {
                reply(peer, AckMessage::success(ack_id)).await;
            }
        }
        UpstreamMessage::SendToGroup(send) => {
            peer.observers().emit(&PeerEvent::SendToGroup(send.clone()));

            let group = match (peer.hub(), peer.group()) {
                (Some(hub), Some(current)) if current == send.group => hub.group(&current),
                _ => None,
            };

            let ack = if let Some(group) = group {
                let delivered = group
                    .send(peer.id(), send.no_echo.unwrap_or(false), &send.data)
                    .await;
                tracing::debug!(
                    peer_id = %peer.id(),
                    group = %send.group,
                    kind = send.data.kind(),
                    delivered,
                    "Broadcast to group"
                );
                send.ack_id.map(AckMessage::success)
            } else {
                tracing::debug!(
                    peer_id = %peer.id(),
                    group = %send.group,
                    "Send rejected, not a member"
                );
                send.ack_id
                    .map(|ack_id| AckMessage::failure(ack_id, AckError::not_in_group(&send.group)))
            };

            if let Some(ack) = ack {
                reply(peer, ack).await;
            }
        }
        UpstreamMessage::Event(event) => {
            peer.observers().emit(&PeerEvent::Event(event));
        }
        UpstreamMessage::SequenceAck(ack) => {
            peer.observers().emit(&PeerEvent::SequenceAck(ack));
        }
    }
}

async fn reply(peer: &Peer, ack: AckMessage) {
    let ack_id = ack.ack_id;
    if let Err(e) = peer.send_ack(ack).await {
        tracing::debug!(peer_id = %peer.id(), ack_id, error = %e, "Ack not delivered");
    }
}
