use crate::ConnectionId;

/// Errors raised by a [`Transport`](crate::Transport) or one of its
/// connections.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener couldn't bind its address.
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The connection is already closed, by the peer or by us.
    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    /// The WebSocket upgrade or a frame-level operation failed.
    #[cfg(feature = "websocket")]
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
