//! Error types for the player core.

use hearth_data::StoreError;
use hearth_protocol::ProtocolError;
use hearth_transport::TransportError;

/// Errors from sending or receiving on a [`ClientSession`](crate::ClientSession).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection failed underneath the session.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded, or the peer sent garbage.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Errors a player aggregate returns to the connection that owns it.
///
/// Misuse (touching a player before `initialize`) is not in here: that
/// panics.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// A handshake message could not be delivered. The session should be
    /// torn down; nothing already sent is retracted.
    #[error("session failure: {0}")]
    Session(#[from] SessionError),

    /// A storage read or write failed. For a save, whatever was not written
    /// stays dirty for the next attempt.
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    /// `send_account_information` was called while a previous call on the
    /// same player had not finished.
    #[error("account information handshake already in progress")]
    HandshakeInProgress,
}

/// Rejected character operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CharacterError {
    /// The slot is outside `0..MAX_CHARACTER_SLOTS`.
    #[error("character slot {0} is out of range")]
    InvalidSlot(u8),

    /// `create` on a slot that already has a character.
    #[error("character slot {0} is already in use")]
    SlotOccupied(u8),

    /// No character in this slot.
    #[error("no character in slot {0}")]
    NotFound(u8),

    /// Equipment index past the end of the weapon or costume row.
    #[error("equipment index {0} is out of range")]
    InvalidEquipSlot(usize),
}
