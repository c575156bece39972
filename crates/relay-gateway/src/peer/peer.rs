//! Peer state machine
//!
//! Lifecycle transitions are serialized on the grace-period slot: losing the
//! transport, the grace timer firing, reattaching, and closing all take that
//! lock before their compare-and-swap, so exactly one of them decides each
//! outcome.

use super::receive;
use super::state::{AtomicPeerState, PeerState};
use super::ReattachError;
use crate::connection::{ConnectionHandle, TransportError};
use crate::events::{Observers, PeerEvent};
use crate::hub::Hub;
use crate::protocol::{
    AckMessage, CloseCode, DataMessage, DownstreamMessage, Frame, MessageData, TypedData,
};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

/// Pending grace timer. Dropping `cancel` stops the timer.
struct GracePeriod {
    generation: u64,
    cancel: oneshot::Sender<()>,
}

/// One logical client of a hub
pub struct Peer {
    id: String,
    user_id: String,
    reconnection_token: String,
    state: AtomicPeerState,
    connection: RwLock<Arc<dyn ConnectionHandle>>,
    /// Current group. Held while membership changes so a peer is in at most one group.
    group: Mutex<Option<String>>,
    grace: Mutex<Option<GracePeriod>>,
    generation: AtomicU64,
    reader: Mutex<Option<AbortHandle>>,
    observers: Observers,
    hub: Weak<Hub>,
    grace_period: Duration,
}

impl Peer {
    /// Create an `Alive` peer bound to `hub`.
    ///
    /// Nothing is sent or read until [`Peer::start`].
    pub fn new(
        id: String,
        user_id: String,
        reconnection_token: String,
        connection: Arc<dyn ConnectionHandle>,
        hub: &Arc<Hub>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            user_id,
            reconnection_token,
            state: AtomicPeerState::new(PeerState::Alive),
            connection: RwLock::new(connection),
            group: Mutex::new(None),
            grace: Mutex::new(None),
            generation: AtomicU64::new(0),
            reader: Mutex::new(None),
            observers: Observers::new(),
            hub: Arc::downgrade(hub),
            grace_period: hub.grace_period(),
        })
    }

    /// Peer id, which is also the client-visible connection id
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Token issued when the peer was created
    pub fn reconnection_token(&self) -> &str {
        &self.reconnection_token
    }

    pub fn state(&self) -> PeerState {
        self.state.load()
    }

    pub fn is_alive(&self) -> bool {
        self.state() == PeerState::Alive
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Group the peer currently belongs to
    pub fn group(&self) -> Option<String> {
        self.group.lock().clone()
    }

    pub fn observers(&self) -> &Observers {
        &self.observers
    }

    /// Transport currently attached
    pub fn connection(&self) -> Arc<dyn ConnectionHandle> {
        Arc::clone(&self.connection.read())
    }

    pub(crate) fn hub(&self) -> Option<Arc<Hub>> {
        self.hub.upgrade()
    }

    pub(crate) fn membership(&self) -> MutexGuard<'_, Option<String>> {
        self.group.lock()
    }

    /// Send the `connected` handshake and begin reading frames
    pub async fn start(self: &Arc<Self>) -> Result<(), TransportError> {
        let connected =
            DownstreamMessage::connected(&self.id, &self.user_id, &self.reconnection_token);
        self.send(&connected).await?;
        self.spawn_reader();
        Ok(())
    }

    // === Lifecycle ===

    /// The attached transport with id `transport_id` broke.
    ///
    /// Moves `Alive -> AwaitingReconnect` and starts the grace timer. A no-op
    /// if the peer is in any other state or has already moved to a newer
    /// transport.
    pub(crate) fn connection_lost(self: &Arc<Self>, transport_id: &str, code: Option<CloseCode>) {
        let (generation, cancelled, connection) = {
            let mut grace = self.grace.lock();
            let connection = self.connection();
            if connection.id() != transport_id {
                return;
            }
            if !self.state.transition(PeerState::Alive, PeerState::AwaitingReconnect) {
                return;
            }

            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let (cancel, cancelled) = oneshot::channel();
            *grace = Some(GracePeriod { generation, cancel });
            (generation, cancelled, connection)
        };

        tracing::info!(
            peer_id = %self.id,
            user_id = %self.user_id,
            grace_secs = self.grace_period.as_secs(),
            "Transport lost, awaiting reconnect"
        );

        tokio::spawn(async move { connection.close(code).await });
        self.observers.emit(&PeerEvent::AwaitingReconnect);

        let peer = Arc::clone(self);
        let period = self.grace_period;
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(period) => peer.grace_expired(generation),
                _ = cancelled => {}
            }
        });
    }

    fn grace_expired(&self, generation: u64) {
        {
            let mut grace = self.grace.lock();
            if grace.as_ref().map(|pending| pending.generation) != Some(generation) {
                return;
            }
            if !self.state.transition(PeerState::AwaitingReconnect, PeerState::Dead) {
                return;
            }
            *grace = None;
        }

        tracing::info!(peer_id = %self.id, user_id = %self.user_id, "Grace period expired");
        self.observers.emit(&PeerEvent::Died);
    }

    /// Resume on `connection`.
    ///
    /// Only an `AwaitingReconnect` peer whose id is `claimed_connection_id`
    /// can be resumed. The token must already have been redeemed by the
    /// caller; see [`Hub::reattach`].
    pub fn reattach(
        self: &Arc<Self>,
        claimed_connection_id: &str,
        connection: Arc<dyn ConnectionHandle>,
    ) -> Result<(), ReattachError> {
        if claimed_connection_id != self.id {
            return Err(ReattachError::ConnectionIdMismatch);
        }

        let previous = {
            let mut grace = self.grace.lock();
            let mut current = self.connection.write();
            if !self.state.transition(PeerState::AwaitingReconnect, PeerState::Alive) {
                return Err(ReattachError::NotAwaitingReconnect(self.state.load()));
            }
            if let Some(pending) = grace.take() {
                let _ = pending.cancel.send(());
            }
            std::mem::replace(&mut *current, connection)
        };

        tracing::info!(
            peer_id = %self.id,
            user_id = %self.user_id,
            transport_id = %self.connection().id(),
            "Peer reattached"
        );

        if !previous.is_closed() {
            tokio::spawn(async move { previous.close(None).await });
        }

        self.observers.emit(&PeerEvent::Alive);
        self.spawn_reader();
        Ok(())
    }

    /// Close the peer from any state.
    ///
    /// Cancels a pending grace timer, stops reading, closes the transport, and
    /// emits `died`. Idempotent.
    pub fn close(&self) {
        let pending = {
            let mut grace = self.grace.lock();
            if self.state.swap(PeerState::Dead) == PeerState::Dead {
                return;
            }
            grace.take()
        };
        drop(pending);

        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }

        let connection = self.connection();
        tokio::spawn(async move { connection.close(Some(CloseCode::PeerClosed)).await });

        tracing::info!(peer_id = %self.id, user_id = %self.user_id, "Peer closed");
        self.observers.emit(&PeerEvent::Died);
    }

    fn spawn_reader(self: &Arc<Self>) {
        let task = tokio::spawn(receive::read_loop(Arc::clone(self), self.connection()));
        if let Some(previous) = self.reader.lock().replace(task.abort_handle()) {
            previous.abort();
        }
    }

    // === Sending ===

    /// Send an envelope on the current transport
    pub async fn send(&self, message: &DownstreamMessage) -> Result<(), TransportError> {
        let frame = message
            .to_frame()
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        self.send_frame(frame).await
    }

    /// Send an already-encoded frame on the current transport
    pub async fn send_frame(&self, frame: Frame) -> Result<(), TransportError> {
        if self.state() == PeerState::Dead {
            return Err(TransportError::Closed);
        }
        let connection = self.connection();
        connection.send(frame).await
    }

    pub async fn send_ack(&self, ack: AckMessage) -> Result<(), TransportError> {
        self.send(&DownstreamMessage::Ack(ack)).await
    }

    /// Deliver a payload addressed to this peer alone
    pub async fn send_data(&self, data: MessageData) -> Result<(), TransportError> {
        self.send(&DownstreamMessage::Message(DataMessage {
            from: None,
            group: None,
            data,
        }))
        .await
    }

    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.send_data(MessageData::Text(text.into())).await
    }

    pub async fn send_json(&self, value: serde_json::Value) -> Result<(), TransportError> {
        self.send_data(MessageData::Json(value)).await
    }

    pub async fn send_binary(&self, bytes: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        self.send_data(MessageData::Binary(bytes.into())).await
    }

    pub async fn send_typed(
        &self,
        type_url: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> Result<(), TransportError> {
        self.send_data(MessageData::Typed(TypedData {
            type_url: type_url.into(),
            value: value.into(),
        }))
        .await
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("state", &self.state())
            .field("group", &self.group())
            .finish_non_exhaustive()
    }
}
