//! Persisted record types.
//!
//! These mirror what the storage engine keeps per account. The player core
//! hydrates from a [`PlayerRecord`] at login and writes [`PlayerRow`],
//! [`CharacterRecord`], [`LicenseRecord`] and [`ItemRecord`] back on save.

use hearth_protocol::{
    AccountId, COSTUME_SLOTS, ItemId, ItemNumber, LicenseId, PeriodType,
    PriceType, WEAPON_SLOTS,
};
use serde::{Deserialize, Serialize};

/// Account privilege level. Higher values see more start items.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SecurityLevel(pub u8);

impl SecurityLevel {
    pub const USER: Self = Self(0);
    pub const GAME_MASTER: Self = Self(3);
    pub const ADMIN: Self = Self(5);
}

/// The account a player logs in with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub nickname: String,
    #[serde(default)]
    pub security_level: SecurityLevel,
}

/// Scalar player state, as written by the aggregate's own flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRow {
    pub account_id: AccountId,
    pub tutorial_state: u8,
    pub total_experience: u32,
    pub pen: u32,
    pub ap: u32,
    pub coins1: u32,
    pub coins2: u32,
}

/// One character slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub slot: u8,
    pub gender: u8,
    pub hair: u8,
    pub face: u8,
    pub shirt: u8,
    pub pants: u8,
    #[serde(default)]
    pub weapons: [Option<ItemId>; WEAPON_SLOTS],
    #[serde(default)]
    pub skill: Option<ItemId>,
    #[serde(default)]
    pub costumes: [Option<ItemId>; COSTUME_SLOTS],
}

/// One unlocked license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub license: LicenseId,
    pub times_completed: u32,
}

/// One owned item instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub item_number: ItemNumber,
    pub price_type: PriceType,
    pub period_type: PeriodType,
    pub period: u16,
    pub color: u8,
    pub effect: u32,
    pub count: u32,
}

/// Everything loaded for one account at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub account_id: AccountId,
    pub tutorial_state: u8,
    pub total_experience: u32,
    pub pen: u32,
    pub ap: u32,
    pub coins1: u32,
    pub coins2: u32,
    pub current_character_slot: u8,
    #[serde(default)]
    pub characters: Vec<CharacterRecord>,
    #[serde(default)]
    pub licenses: Vec<LicenseRecord>,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

impl PlayerRecord {
    /// A brand-new player: no progress, no money, no characters, no items.
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            tutorial_state: 0,
            total_experience: 0,
            pen: 0,
            ap: 0,
            coins1: 0,
            coins2: 0,
            current_character_slot: 0,
            characters: Vec::new(),
            licenses: Vec::new(),
            items: Vec::new(),
        }
    }

    /// The scalar columns of this record.
    pub fn row(&self) -> PlayerRow {
        PlayerRow {
            account_id: self.account_id,
            tutorial_state: self.tutorial_state,
            total_experience: self.total_experience,
            pen: self.pen,
            ap: self.ap,
            coins1: self.coins1,
            coins2: self.coins2,
        }
    }

    /// Overwrites the scalar columns with a flushed row.
    pub fn apply_row(&mut self, row: &PlayerRow) {
        self.tutorial_state = row.tutorial_state;
        self.total_experience = row.total_experience;
        self.pen = row.pen;
        self.ap = row.ap;
        self.coins1 = row.coins1;
        self.coins2 = row.coins2;
    }
}

/// A default item granted to an empty inventory.
///
/// `price_id`, `effect_id` and `color` refer to variants of the catalog item;
/// the provisioning engine validates them before granting anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartItemRule {
    pub item_number: ItemNumber,
    pub price_id: u32,
    pub effect_id: u32,
    pub color: u8,
    pub count: i32,
    pub required_security_level: SecurityLevel,
}
