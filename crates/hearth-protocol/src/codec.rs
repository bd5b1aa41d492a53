//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec converts between Rust values and raw bytes. Everything above the
//! protocol layer goes through the [`Codec`] trait, so a compact binary
//! format can replace [`JsonCodec`] without touching the player core.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a codec lives inside long-running
/// connection tasks that Tokio may move between threads.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Human-readable, which makes handshake traces easy to inspect.
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use hearth_protocol::{Codec, Envelope, JsonCodec, Payload, ServerMessage};
///
/// let codec = JsonCodec;
/// let envelope = Envelope {
///     seq: 1,
///     timestamp: 5000,
///     payload: Payload::Server(ServerMessage::CashUpdate { pen: 100, ap: 5 }),
/// };
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientMessage, Envelope, Payload};

    #[test]
    fn test_json_codec_decodes_client_envelope() {
        let raw = br#"{
            "seq": 0,
            "timestamp": 0,
            "payload": { "type": "Client", "data": { "type": "Heartbeat", "client_time": 77 } }
        }"#;

        let envelope: Envelope = JsonCodec.decode(raw).unwrap();

        assert_eq!(
            envelope.payload,
            Payload::Client(ClientMessage::Heartbeat { client_time: 77 })
        );
    }

    #[test]
    fn test_json_codec_decode_garbage_returns_decode_error() {
        let result: Result<Envelope, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
