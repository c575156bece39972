//! WebSocket transport

use super::{ConnectionHandle, TransportError};
use crate::protocol::{CloseCode, Frame};
use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// [`ConnectionHandle`] over an upgraded axum WebSocket
pub struct WsConnection {
    id: String,
    sink: Mutex<SplitSink<WebSocket, Message>>,
    stream: Mutex<SplitStream<WebSocket>>,
    closed: AtomicBool,
}

impl WsConnection {
    #[must_use]
    pub fn new(socket: WebSocket) -> Arc<Self> {
        let (sink, stream) = socket.split();
        Arc::new(Self {
            id: uuid::Uuid::new_v4().to_string(),
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl ConnectionHandle for WsConnection {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let message = match frame {
            Frame::Text(text) => Message::Text(text),
            Frame::Binary(bytes) => Message::Binary(bytes),
        };

        self.sink
            .lock()
            .await
            .send(message)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn recv(&self) -> Option<Result<Frame, TransportError>> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(Frame::Text(text))),
                Some(Ok(Message::Binary(bytes))) => return Some(Ok(Frame::Binary(bytes))),
                // Answered by axum
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(
                        transport_id = %self.id,
                        code = frame.as_ref().map(|f| f.code),
                        "Client closed WebSocket"
                    );
                    self.closed.store(true, Ordering::SeqCst);
                    return None;
                }
                Some(Err(e)) => {
                    self.closed.store(true, Ordering::SeqCst);
                    return Some(Err(TransportError::Io(e.to_string())));
                }
                None => {
                    self.closed.store(true, Ordering::SeqCst);
                    return None;
                }
            }
        }
    }

    async fn close(&self, code: Option<CloseCode>) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut sink = self.sink.lock().await;
        let frame = code.map(|code| CloseFrame {
            code: code.as_u16(),
            reason: Cow::Borrowed(code.description()),
        });
        if let Err(e) = sink.send(Message::Close(frame)).await {
            tracing::trace!(transport_id = %self.id, error = %e, "Close frame not delivered");
        }
        let _ = sink.close().await;
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for WsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsConnection")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
