//! In-process transport
//!
//! [`MemoryConnection::pair`] returns the server side of a connection and a
//! [`MemoryClient`] that plays the remote end. Used to drive peers without a
//! socket.

use super::{ConnectionHandle, TransportError};
use crate::protocol::{CloseCode, DownstreamMessage, Frame, UpstreamMessage};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Server side of an in-process connection
pub struct MemoryConnection {
    id: String,
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<Frame, TransportError>>>,
    outbound: mpsc::UnboundedSender<Frame>,
    closed: AtomicBool,
    shutdown: watch::Sender<bool>,
    close_code: Mutex<Option<CloseCode>>,
}

impl MemoryConnection {
    #[must_use]
    pub fn pair() -> (Arc<Self>, MemoryClient) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);

        let connection = Arc::new(Self {
            id: uuid::Uuid::new_v4().to_string(),
            inbound: tokio::sync::Mutex::new(inbound_rx),
            outbound: outbound_tx,
            closed: AtomicBool::new(false),
            shutdown,
            close_code: Mutex::new(None),
        });
        let client = MemoryClient {
            upstream: Some(inbound_tx),
            downstream: outbound_rx,
        };
        (connection, client)
    }

    /// Code passed to the first [`ConnectionHandle::close`] call
    #[must_use]
    pub fn close_code(&self) -> Option<CloseCode> {
        *self.close_code.lock()
    }
}

#[async_trait]
impl ConnectionHandle for MemoryConnection {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.outbound.send(frame).map_err(|_| TransportError::Closed)
    }

    async fn recv(&self) -> Option<Result<Frame, TransportError>> {
        let mut shutdown = self.shutdown.subscribe();
        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            frame = inbound.recv() => frame,
            _ = shutdown.wait_for(|closed| *closed) => None,
        }
    }

    async fn close(&self, code: Option<CloseCode>) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.close_code.lock() = code;
        self.shutdown.send_replace(true);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for MemoryConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConnection")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Remote end of a [`MemoryConnection`]
#[derive(Debug)]
pub struct MemoryClient {
    upstream: Option<mpsc::UnboundedSender<Result<Frame, TransportError>>>,
    downstream: mpsc::UnboundedReceiver<Frame>,
}

impl MemoryClient {
    /// Send an envelope to the server. Returns false once disconnected.
    pub fn send(&self, message: &UpstreamMessage) -> bool {
        match message.to_frame() {
            Ok(frame) => self.send_frame(frame),
            Err(_) => false,
        }
    }

    pub fn send_frame(&self, frame: Frame) -> bool {
        self.upstream
            .as_ref()
            .is_some_and(|upstream| upstream.send(Ok(frame)).is_ok())
    }

    /// Inject a transport read error
    pub fn fail(&self, error: TransportError) -> bool {
        self.upstream
            .as_ref()
            .is_some_and(|upstream| upstream.send(Err(error)).is_ok())
    }

    /// Go away without a close handshake
    pub fn disconnect(&mut self) {
        self.upstream = None;
    }

    /// Next envelope from the server, waiting at most `timeout`
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<DownstreamMessage> {
        let frame = tokio::time::timeout(timeout, self.downstream.recv())
            .await
            .ok()??;
        DownstreamMessage::from_frame(&frame).ok()
    }

    /// Next envelope from the server
    pub async fn recv(&mut self) -> Option<DownstreamMessage> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Envelope already delivered, without waiting
    pub fn try_recv(&mut self) -> Option<DownstreamMessage> {
        let frame = self.downstream.try_recv().ok()?;
        DownstreamMessage::from_frame(&frame).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageData;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (connection, mut client) = MemoryConnection::pair();

        assert!(client.send(&UpstreamMessage::join_group("g", Some(1))));
        let frame = connection.recv().await.unwrap().unwrap();
        assert_eq!(
            UpstreamMessage::from_frame(&frame).unwrap(),
            UpstreamMessage::join_group("g", Some(1))
        );

        let down = DownstreamMessage::data(MessageData::text("hi"));
        connection.send(down.to_frame().unwrap()).await.unwrap();
        assert_eq!(client.recv().await, Some(down));
    }

    #[tokio::test]
    async fn test_client_disconnect_ends_recv() {
        let (connection, mut client) = MemoryConnection::pair();
        client.disconnect();
        assert!(connection.recv().await.is_none());
        assert!(!client.send(&UpstreamMessage::leave_group("g", None)));
    }

    #[tokio::test]
    async fn test_close_wakes_pending_recv() {
        let (connection, _client) = MemoryConnection::pair();

        let reader = {
            let connection = Arc::clone(&connection);
            tokio::spawn(async move { connection.recv().await })
        };
        tokio::task::yield_now().await;

        connection.close(Some(CloseCode::PeerClosed)).await;
        connection.close(Some(CloseCode::UnknownError)).await;

        assert!(reader.await.unwrap().is_none());
        assert!(connection.is_closed());
        assert_eq!(connection.close_code(), Some(CloseCode::PeerClosed));
        assert_eq!(
            connection.send(Frame::Text("x".into())).await,
            Err(TransportError::Closed)
        );
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let (connection, client) = MemoryConnection::pair();
        client.fail(TransportError::Io("reset".into()));
        assert_eq!(
            connection.recv().await,
            Some(Err(TransportError::Io("reset".into())))
        );
    }
}
