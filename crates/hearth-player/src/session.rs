//! The server's end of one client connection.
//!
//! A [`ClientSession`] wraps a [`Connection`] with everything needed to talk
//! in [`Envelope`]s: the codec, the outgoing sequence counter, the session
//! clock, and the random session key handed to the client in `LoginAck`.

use std::net::SocketAddr;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use hearth_protocol::{
    ClientMessage, Codec, Envelope, JsonCodec, Payload, ProtocolError,
    ServerMessage,
};
use hearth_transport::{Connection, ConnectionId};
use rand::Rng;
use tokio::sync::Mutex;

use crate::SessionError;

/// One client's connection, speaking envelopes.
///
/// # Send ordering
///
/// Outgoing messages pass through a single send queue: the next sequence
/// number is only handed out by whoever holds the queue, and the queue is
/// held until the transport has accepted the bytes. Tokio's mutex is fair,
/// so concurrent senders are served in the order they arrived and `seq`
/// always matches the order the transport sees.
pub struct ClientSession<T: Connection> {
    conn: T,
    codec: JsonCodec,
    /// Next outgoing `seq`. Starts at 0 with `LoginAck`.
    outbox: Mutex<u64>,
    started: Instant,
    session_key: String,
}

impl<T: Connection> ClientSession<T> {
    pub fn new(conn: T) -> Self {
        Self {
            conn,
            codec: JsonCodec,
            outbox: Mutex::new(0),
            started: Instant::now(),
            session_key: generate_session_key(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.conn.remote_addr()
    }

    /// A 32-character hex string identifying this login.
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Milliseconds since the session was created.
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Wraps `message` in the next envelope and sends it.
    ///
    /// Resolves once the transport has accepted the bytes. The sequence
    /// number is consumed only if the send succeeds.
    pub async fn send(&self, message: ServerMessage) -> Result<(), SessionError> {
        let mut next_seq = self.outbox.lock().await;
        let kind = message.kind();
        let envelope = Envelope {
            seq: *next_seq,
            timestamp: self.elapsed_ms(),
            payload: Payload::Server(message),
        };
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        tracing::trace!(conn = %self.conn.id(), seq = *next_seq, kind, "sent");
        *next_seq += 1;
        Ok(())
    }

    /// Waits for the next client message.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessage`] if the peer sends a server payload.
    pub async fn recv(&self) -> Result<Option<ClientMessage>, SessionError> {
        let Some(bytes) = self.conn.recv().await? else {
            return Ok(None);
        };
        let envelope: Envelope = self.codec.decode(&bytes)?;
        match envelope.payload {
            Payload::Client(message) => Ok(Some(message)),
            Payload::Server(other) => Err(ProtocolError::InvalidMessage(
                format!("client sent server message {}", other.kind()),
            )
            .into()),
        }
    }

    /// Closes the underlying connection.
    pub async fn close(&self) -> Result<(), SessionError> {
        self.conn.close().await?;
        Ok(())
    }

    pub fn connection(&self) -> &T {
        &self.conn
    }
}

/// Wall-clock milliseconds since the Unix epoch, for `server_time` fields.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// 16 random bytes, hex-encoded.
fn generate_session_key() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingConnection;

    #[tokio::test]
    async fn test_send_numbers_envelopes_from_zero() {
        let conn = RecordingConnection::new(1);
        let session = ClientSession::new(conn.clone());

        session
            .send(ServerMessage::CashUpdate { pen: 1, ap: 2 })
            .await
            .unwrap();
        session
            .send(ServerMessage::CoinUpdate {
                coins1: 3,
                coins2: 4,
            })
            .await
            .unwrap();

        let seqs: Vec<u64> = conn.envelopes().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
        assert_eq!(conn.kinds(), vec!["CashUpdate", "CoinUpdate"]);
    }

    #[tokio::test]
    async fn test_send_failure_does_not_consume_seq() {
        let conn = RecordingConnection::new(1);
        let session = ClientSession::new(conn.clone());
        conn.fail_sends(true);

        let result = session.send(ServerMessage::CashUpdate { pen: 0, ap: 0 }).await;
        assert!(matches!(result, Err(SessionError::Transport(_))));

        conn.fail_sends(false);
        session
            .send(ServerMessage::CashUpdate { pen: 0, ap: 0 })
            .await
            .unwrap();
        assert_eq!(conn.envelopes()[0].seq, 0);
    }

    #[tokio::test]
    async fn test_recv_decodes_client_message() {
        let conn = RecordingConnection::new(1);
        conn.push_incoming(&Envelope {
            seq: 0,
            timestamp: 0,
            payload: Payload::Client(ClientMessage::Heartbeat { client_time: 9 }),
        });
        let session = ClientSession::new(conn);

        let message = session.recv().await.unwrap();

        assert_eq!(message, Some(ClientMessage::Heartbeat { client_time: 9 }));
    }

    #[tokio::test]
    async fn test_recv_server_payload_returns_invalid_message() {
        let conn = RecordingConnection::new(1);
        conn.push_incoming(&Envelope {
            seq: 0,
            timestamp: 0,
            payload: Payload::Server(ServerMessage::CashUpdate { pen: 0, ap: 0 }),
        });
        let session = ClientSession::new(conn);

        let result = session.recv().await;

        assert!(matches!(
            result,
            Err(SessionError::Protocol(ProtocolError::InvalidMessage(_)))
        ));
    }

    #[tokio::test]
    async fn test_recv_closed_connection_returns_none() {
        let session = ClientSession::new(RecordingConnection::new(1));
        assert_eq!(session.recv().await.unwrap(), None);
    }

    #[test]
    fn test_session_key_is_unique_hex() {
        let a = ClientSession::new(RecordingConnection::new(1));
        let b = ClientSession::new(RecordingConnection::new(2));

        assert_eq!(a.session_key().len(), 32);
        assert!(a.session_key().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.session_key(), b.session_key());
    }
}
