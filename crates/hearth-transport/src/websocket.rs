//! WebSocket transport on `tokio-tungstenite`.
//!
//! Each accepted stream is split into its sending and receiving halves, and
//! each half gets its own lock. A task parked in [`Connection::recv`]
//! waiting for the client therefore never blocks a handshake or reply being
//! sent on the same connection.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::{Connection, ConnectionId, Transport, TransportError};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<TcpStream>;

/// Listens for WebSocket clients.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener =
            TcpListener::bind(addr)
                .await
                .map_err(|source| TransportError::Bind {
                    addr: addr.to_string(),
                    source,
                })?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// The bound address. Useful after binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    /// Accepts the next TCP connection and completes the WebSocket upgrade.
    ///
    /// A client that fails the upgrade yields an error; the listener itself
    /// stays usable.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, remote) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::Accept)?;
        let ws = tokio_tungstenite::accept_async(stream).await?;

        let id =
            ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %remote, "accepted WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            remote,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// One client's WebSocket.
///
/// Sends are serialized by the sink lock and leave in call order. Receives
/// are serialized by the stream lock.
pub struct WebSocketConnection {
    id: ConnectionId,
    remote: SocketAddr,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    fn map_err(&self, e: WsError) -> TransportError {
        match e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                TransportError::Closed(self.id)
            }
            other => TransportError::WebSocket(other),
        }
    }
}

impl Connection for WebSocketConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .send(Message::Binary(data.to_vec().into()))
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return match self.map_err(e) {
                        TransportError::Closed(_) => Ok(None),
                        other => Err(other),
                    };
                }
            }
        }
    }

    /// Sends a close frame. Closing an already-closed connection is not an
    /// error.
    async fn close(&self) -> Result<(), TransportError> {
        match self.sink.lock().await.close().await {
            Ok(()) => Ok(()),
            Err(e) => match self.map_err(e) {
                TransportError::Closed(_) => Ok(()),
                other => Err(other),
            },
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        Some(self.remote)
    }
}
