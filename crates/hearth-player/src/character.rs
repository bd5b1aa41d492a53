//! A player's characters.
//!
//! Every account has [`MAX_CHARACTER_SLOTS`] slots. Each occupied slot holds
//! a [`Character`]: its look plus the item ids equipped in each weapon,
//! skill and costume slot.

use std::collections::BTreeMap;

use hearth_data::{CharacterRecord, PlayerRecord, PlayerStore, StoreError};
use hearth_protocol::{
    AccountId, COSTUME_SLOTS, CharacterStyleDto, ItemId, MAX_CHARACTER_SLOTS,
    WEAPON_SLOTS,
};

use crate::{CharacterError, ChangeTracker};

/// Gender plus the four cosmetic variation ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacterStyle {
    pub gender: u8,
    pub hair: u8,
    pub face: u8,
    pub shirt: u8,
    pub pants: u8,
}

impl From<CharacterStyle> for CharacterStyleDto {
    fn from(style: CharacterStyle) -> Self {
        Self {
            gender: style.gender,
            hair: style.hair,
            face: style.face,
            shirt: style.shirt,
            pants: style.pants,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    slot: u8,
    style: CharacterStyle,
    weapons: [Option<ItemId>; WEAPON_SLOTS],
    skill: Option<ItemId>,
    costumes: [Option<ItemId>; COSTUME_SLOTS],
}

impl Character {
    fn new(slot: u8, style: CharacterStyle) -> Self {
        Self {
            slot,
            style,
            weapons: [None; WEAPON_SLOTS],
            skill: None,
            costumes: [None; COSTUME_SLOTS],
        }
    }

    fn from_record(record: &CharacterRecord) -> Self {
        Self {
            slot: record.slot,
            style: CharacterStyle {
                gender: record.gender,
                hair: record.hair,
                face: record.face,
                shirt: record.shirt,
                pants: record.pants,
            },
            weapons: record.weapons,
            skill: record.skill,
            costumes: record.costumes,
        }
    }

    fn to_record(&self) -> CharacterRecord {
        CharacterRecord {
            slot: self.slot,
            gender: self.style.gender,
            hair: self.style.hair,
            face: self.style.face,
            shirt: self.style.shirt,
            pants: self.style.pants,
            weapons: self.weapons,
            skill: self.skill,
            costumes: self.costumes,
        }
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn style(&self) -> CharacterStyle {
        self.style
    }

    pub fn weapons(&self) -> &[Option<ItemId>; WEAPON_SLOTS] {
        &self.weapons
    }

    pub fn skill(&self) -> Option<ItemId> {
        self.skill
    }

    pub fn costumes(&self) -> &[Option<ItemId>; COSTUME_SLOTS] {
        &self.costumes
    }
}

/// All characters of one player, plus which one is active.
#[derive(Debug, Default)]
pub struct CharacterManager {
    characters: BTreeMap<u8, Character>,
    current_slot: u8,
    tracker: ChangeTracker,
}

impl CharacterManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the manager's contents with the persisted characters.
    ///
    /// Records with an out-of-range slot are dropped with a warning.
    pub fn initialize(&mut self, record: &PlayerRecord) {
        self.characters.clear();
        for character in &record.characters {
            if character.slot >= MAX_CHARACTER_SLOTS {
                tracing::warn!(
                    slot = character.slot,
                    "ignoring persisted character in invalid slot"
                );
                continue;
            }
            self.characters
                .insert(character.slot, Character::from_record(character));
        }
        self.current_slot = record.current_character_slot;
        self.tracker.mark_clean();
    }

    /// Creates a character in an empty slot.
    ///
    /// # Errors
    /// - [`CharacterError::InvalidSlot`] if `slot >= MAX_CHARACTER_SLOTS`
    /// - [`CharacterError::SlotOccupied`] if the slot already has one
    pub fn create(
        &mut self,
        slot: u8,
        style: CharacterStyle,
    ) -> Result<&Character, CharacterError> {
        if slot >= MAX_CHARACTER_SLOTS {
            return Err(CharacterError::InvalidSlot(slot));
        }
        if self.characters.contains_key(&slot) {
            return Err(CharacterError::SlotOccupied(slot));
        }
        self.tracker.mark_dirty();
        Ok(self
            .characters
            .entry(slot)
            .or_insert_with(|| Character::new(slot, style)))
    }

    /// Makes the character in `slot` the active one.
    pub fn select(&mut self, slot: u8) -> Result<(), CharacterError> {
        if !self.characters.contains_key(&slot) {
            return Err(CharacterError::NotFound(slot));
        }
        if self.current_slot != slot {
            self.current_slot = slot;
            self.tracker.mark_dirty();
        }
        Ok(())
    }

    /// Deletes the character in `slot`.
    ///
    /// Removing the active character moves the selection to the lowest
    /// remaining slot (or 0 when none are left).
    pub fn remove(&mut self, slot: u8) -> Result<Character, CharacterError> {
        let removed = self
            .characters
            .remove(&slot)
            .ok_or(CharacterError::NotFound(slot))?;
        if self.current_slot == slot {
            self.current_slot = self.characters.keys().next().copied().unwrap_or(0);
        }
        self.tracker.mark_dirty();
        Ok(removed)
    }

    pub fn equip_weapon(
        &mut self,
        slot: u8,
        index: usize,
        item: Option<ItemId>,
    ) -> Result<(), CharacterError> {
        let character = self.get_mut(slot)?;
        let target = character
            .weapons
            .get_mut(index)
            .ok_or(CharacterError::InvalidEquipSlot(index))?;
        if *target != item {
            *target = item;
            self.tracker.mark_dirty();
        }
        Ok(())
    }

    pub fn equip_skill(
        &mut self,
        slot: u8,
        item: Option<ItemId>,
    ) -> Result<(), CharacterError> {
        let character = self.get_mut(slot)?;
        if character.skill != item {
            character.skill = item;
            self.tracker.mark_dirty();
        }
        Ok(())
    }

    pub fn equip_costume(
        &mut self,
        slot: u8,
        index: usize,
        item: Option<ItemId>,
    ) -> Result<(), CharacterError> {
        let character = self.get_mut(slot)?;
        let target = character
            .costumes
            .get_mut(index)
            .ok_or(CharacterError::InvalidEquipSlot(index))?;
        if *target != item {
            *target = item;
            self.tracker.mark_dirty();
        }
        Ok(())
    }

    pub fn get(&self, slot: u8) -> Option<&Character> {
        self.characters.get(&slot)
    }

    fn get_mut(&mut self, slot: u8) -> Result<&mut Character, CharacterError> {
        self.characters
            .get_mut(&slot)
            .ok_or(CharacterError::NotFound(slot))
    }

    /// Characters in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn current_slot(&self) -> u8 {
        self.current_slot
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    /// Writes the full character set if anything changed since the last
    /// successful save.
    pub async fn save<S: PlayerStore>(
        &self,
        store: &S,
        account: AccountId,
    ) -> Result<(), StoreError> {
        let Some(revision) = self.tracker.begin_flush() else {
            return Ok(());
        };
        let records: Vec<CharacterRecord> =
            self.characters.values().map(Character::to_record).collect();
        store
            .save_characters(account, self.current_slot, &records)
            .await?;
        self.tracker.complete_flush(revision);
        tracing::debug!(characters = records.len(), "characters saved");
        Ok(())
    }
}
