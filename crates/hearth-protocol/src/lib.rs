//! Wire protocol for Hearth.
//!
//! This crate defines what clients and servers say to each other:
//!
//! - **Types** ([`Envelope`], [`ClientMessage`], [`ServerMessage`], ids and
//!   DTOs) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those structures are
//!   turned into bytes and back.
//! - **Errors** ([`ProtocolError`]).
//!
//! It knows nothing about connections or players; it only describes
//! messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Player core (ServerMessage)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AccountId, COSTUME_SLOTS, ChannelId, CharacterStyleDto, ClientMessage,
    Envelope, ItemDto, ItemId, ItemNumber, LICENSE_COUNT, LicenseId,
    MAX_CHARACTER_SLOTS, Payload, PeriodType, PriceType, ResultCode, RoomId,
    ServerMessage, TUTORIAL_COMPLETE, WEAPON_SLOTS,
};
