//! Core protocol types for Hearth's wire format.
//!
//! Everything in this module travels "on the wire": it is serialized by a
//! [`Codec`](crate::Codec), pushed through a connection, and decoded by the
//! game client. Field names and variant tags are therefore part of the
//! client contract — renaming one is a breaking protocol change.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Wire constants
// ---------------------------------------------------------------------------

/// Number of character slots an account owns. Sent verbatim in
/// [`ServerMessage::CharacterSlotInfo`].
pub const MAX_CHARACTER_SLOTS: u8 = 3;

/// Weapon slots per character.
pub const WEAPON_SLOTS: usize = 3;

/// Costume slots per character (hair, face, shirt, pants, gloves, shoes,
/// accessory).
pub const COSTUME_SLOTS: usize = 7;

/// Number of license ids the client knows about (`0..LICENSE_COUNT`).
pub const LICENSE_COUNT: usize = 100;

/// Tutorial state the client treats as "tutorial finished".
pub const TUTORIAL_COMPLETE: u8 = 2;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for an account.
///
/// Newtype over `u64` so an `AccountId` can't be passed where an `ItemId`
/// is expected. `#[serde(transparent)]` keeps it a plain number in JSON.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

/// A unique identifier for one owned item instance (not the catalog entry).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I-{}", self.0)
    }
}

/// A catalog item number. Many owned items share one number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemNumber(pub u32);

impl fmt::Display for ItemNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An unlockable license. The client only understands ids below
/// [`LICENSE_COUNT`], which is why the wire width is `u8`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LicenseId(pub u8);

/// Opaque handle to the lobby channel a player currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u32);

/// Opaque handle to the room a player currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u32);

// ---------------------------------------------------------------------------
// Item pricing
// ---------------------------------------------------------------------------

/// Which currency an item was bought with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PriceType {
    Pen,
    Ap,
    Premium,
    None,
}

/// How an item's lifetime is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PeriodType {
    /// Permanent.
    None,
    Hours,
    Days,
    /// Consumed per use.
    Units,
}

// ---------------------------------------------------------------------------
// DTOs embedded in server messages
// ---------------------------------------------------------------------------

/// One owned item as the client sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDto {
    pub id: ItemId,
    pub item_number: ItemNumber,
    pub price_type: PriceType,
    pub period_type: PeriodType,
    pub period: u16,
    pub color: u8,
    pub effect: u32,
    pub count: u32,
}

/// Cosmetic style of a character: gender plus four variation ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStyleDto {
    pub gender: u8,
    pub hair: u8,
    pub face: u8,
    pub shirt: u8,
    pub pants: u8,
}

/// Result codes carried by [`ServerMessage::ServerResult`].
///
/// The login handshake sends both welcome codes; the client waits for each
/// one independently, so neither may be dropped or merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ResultCode {
    Welcome,
    WelcomeReady,
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
///   `{ "type": "Login", "version": 1, "token": "abc" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// First message on every connection.
    Login {
        version: u32,
        token: Option<String>,
    },

    /// Keep-alive.
    Heartbeat { client_time: u64 },

    /// The client is leaving.
    Logout { reason: String },
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Messages the server sends to a client.
///
/// The account-information variants (`LicenseList` through
/// `BeginAccountInfo`) make up the login synchronization handshake. Their
/// relative order is fixed by the player core, not by this enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Login accepted. `session_key` identifies this login in later calls.
    LoginAck {
        account_id: AccountId,
        session_key: String,
        server_time: u64,
    },

    /// Licenses the player holds.
    LicenseList { licenses: Vec<u8> },

    /// Full inventory snapshot.
    Inventory { items: Vec<ItemDto> },

    /// Which slot is active and how many characters exist.
    CharacterSlotInfo {
        active_slot: u8,
        character_count: u8,
        max_slots: u8,
    },

    /// A character exists in `slot` with this look.
    CharacterOpened {
        slot: u8,
        style: CharacterStyleDto,
    },

    /// Equipment of the character in `slot`. Empty slots are `0`.
    CharacterEquip {
        slot: u8,
        weapons: Vec<u64>,
        skills: Vec<u64>,
        costumes: Vec<u64>,
    },

    /// Premium balances.
    CashUpdate { pen: u32, ap: u32 },

    /// Coin balances.
    CoinUpdate { coins1: u32, coins2: u32 },

    /// Generic result notification.
    ServerResult { code: ResultCode },

    /// Account summary shown on the lobby screen.
    BeginAccountInfo {
        level: u8,
        total_experience: u32,
        pen: u32,
        ap: u32,
        tutorial_state: u8,
        nickname: String,
    },

    /// Reply to [`ClientMessage::Heartbeat`].
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// Something went wrong. `code` follows HTTP-style conventions.
    Error { code: u16, message: String },
}

impl ServerMessage {
    /// The variant name, as it appears in the `"type"` tag.
    ///
    /// Handy for logging and for asserting message order in tests.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoginAck { .. } => "LoginAck",
            Self::LicenseList { .. } => "LicenseList",
            Self::Inventory { .. } => "Inventory",
            Self::CharacterSlotInfo { .. } => "CharacterSlotInfo",
            Self::CharacterOpened { .. } => "CharacterOpened",
            Self::CharacterEquip { .. } => "CharacterEquip",
            Self::CashUpdate { .. } => "CashUpdate",
            Self::CoinUpdate { .. } => "CoinUpdate",
            Self::ServerResult { .. } => "ServerResult",
            Self::BeginAccountInfo { .. } => "BeginAccountInfo",
            Self::HeartbeatAck { .. } => "HeartbeatAck",
            Self::Error { .. } => "Error",
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The content of an envelope: client or server message.
///
/// Adjacently tagged:
///   `{ "type": "Server", "data": { "type": "CashUpdate", ... } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    Client(ClientMessage),
    Server(ServerMessage),
}

/// The top-level message wrapper. Every message on the wire is an Envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-session sequence number. The server's counter starts at 0 with
    /// `LoginAck` and increases by one per message.
    pub seq: u64,

    /// Milliseconds since the sender's session started.
    pub timestamp: u64,

    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================
