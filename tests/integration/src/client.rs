//! WebSocket test client
//!
//! Speaks the relay's JSON envelopes over tokio-tungstenite.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use relay_gateway::protocol::{
    ConnectedMessage, DownstreamMessage, Frame, SystemMessage, UpstreamMessage,
};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long `recv` waits before failing
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A relay client connection
pub struct RelayClient {
    stream: WsStream,
    /// Handshake received on a fresh connection
    pub connected: Option<ConnectedMessage>,
}

impl RelayClient {
    /// Open a WebSocket to `url` without reading anything
    pub async fn try_connect(url: &str) -> Result<Self, tungstenite::Error> {
        let (stream, _response) = connect_async(url).await?;
        Ok(Self {
            stream,
            connected: None,
        })
    }

    /// Open a fresh connection and read the `connected` handshake
    pub async fn connect(url: &str) -> Result<Self> {
        let mut client = Self::try_connect(url).await.context("WebSocket connect failed")?;
        match client.recv().await? {
            DownstreamMessage::System(SystemMessage::Connected(connected)) => {
                client.connected = Some(connected);
                Ok(client)
            }
            other => bail!("Expected connected handshake, got {other:?}"),
        }
    }

    /// Peer id assigned by the server
    pub fn connection_id(&self) -> &str {
        self.connected
            .as_ref()
            .map_or("", |connected| connected.connection_id.as_str())
    }

    pub fn reconnection_token(&self) -> &str {
        self.connected
            .as_ref()
            .map_or("", |connected| connected.reconnection_token.as_str())
    }

    pub async fn send(&mut self, message: &UpstreamMessage) -> Result<()> {
        match message.to_frame()? {
            Frame::Text(text) => self.send_text(text).await,
            Frame::Binary(bytes) => self.send_binary(bytes).await,
        }
    }

    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<()> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    pub async fn send_binary(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.stream.send(Message::Binary(bytes)).await?;
        Ok(())
    }

    /// Next envelope, failing after [`RECV_TIMEOUT`]
    pub async fn recv(&mut self) -> Result<DownstreamMessage> {
        match self.recv_timeout(RECV_TIMEOUT).await? {
            Some(message) => Ok(message),
            None => bail!("Timed out waiting for a message"),
        }
    }

    /// Next envelope, or `None` if nothing arrives within `timeout`
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<DownstreamMessage>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let next = match tokio::time::timeout_at(deadline, self.stream.next()).await {
                Ok(next) => next,
                Err(_) => return Ok(None),
            };
            match next {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(DownstreamMessage::from_frame(&Frame::Text(text))?));
                }
                Some(Ok(Message::Binary(bytes))) => {
                    return Ok(Some(DownstreamMessage::from_frame(&Frame::Binary(bytes))?));
                }
                Some(Ok(Message::Close(frame))) => {
                    bail!("Connection closed: {frame:?}");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => bail!("Connection closed"),
            }
        }
    }

    /// Read until the server closes, returning the close code and any
    /// envelopes received before it
    pub async fn recv_close(&mut self) -> Result<(Option<u16>, Vec<DownstreamMessage>)> {
        let mut before = Vec::new();
        loop {
            let next = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .context("Timed out waiting for close")?;
            match next {
                Some(Ok(Message::Close(frame))) => {
                    return Ok((frame.map(|frame| u16::from(frame.code)), before));
                }
                Some(Ok(Message::Text(text))) => {
                    before.push(DownstreamMessage::from_frame(&Frame::Text(text))?);
                }
                Some(Ok(_)) => {}
                Some(Err(_)) | None => return Ok((None, before)),
            }
        }
    }

    /// Close with a handshake
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }

    /// Drop the TCP connection without a close handshake
    pub fn drop_connection(self) -> Option<ConnectedMessage> {
        self.connected
    }
}
