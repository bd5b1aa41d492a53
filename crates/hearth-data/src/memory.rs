//! In-process [`PlayerStore`] backed by hash maps.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use hearth_protocol::{AccountId, ItemId};
use tokio::sync::Mutex;

use crate::{
    AccountRecord, CharacterRecord, ItemRecord, LicenseRecord, PlayerRecord,
    PlayerRow, PlayerStore, SecurityLevel, StartItemRule, StoreError,
};

#[derive(Default)]
struct Tables {
    accounts: HashMap<AccountId, AccountRecord>,
    players: HashMap<AccountId, PlayerRecord>,
    start_items: Vec<StartItemRule>,
}

/// A [`PlayerStore`] that keeps everything in memory.
///
/// Counts accepted player-row writes so callers can check that a clean
/// player was not flushed.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    player_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store preloaded with start-item rules.
    pub fn with_start_items(rules: Vec<StartItemRule>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                start_items: rules,
                ..Tables::default()
            }),
            player_writes: AtomicUsize::new(0),
        }
    }

    pub async fn insert_account(&self, account: AccountRecord) {
        self.tables.lock().await.accounts.insert(account.id, account);
    }

    pub async fn insert_player(&self, record: PlayerRecord) {
        self.tables
            .lock()
            .await
            .players
            .insert(record.account_id, record);
    }

    /// Returns a copy of what is currently stored for `id`.
    pub async fn player(&self, id: AccountId) -> Option<PlayerRecord> {
        self.tables.lock().await.players.get(&id).cloned()
    }

    /// The largest item id across all players, for seeding an
    /// [`ItemIdAllocator`](crate::ItemIdAllocator).
    pub async fn max_item_id(&self) -> Option<ItemId> {
        self.tables
            .lock()
            .await
            .players
            .values()
            .flat_map(|p| p.items.iter().map(|i| i.id))
            .max()
    }

    /// Number of successful [`PlayerStore::update_player`] calls.
    pub fn player_writes(&self) -> usize {
        self.player_writes.load(Ordering::SeqCst)
    }
}

impl PlayerStore for MemoryStore {
    async fn load_account(
        &self,
        id: AccountId,
    ) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.tables.lock().await.accounts.get(&id).cloned())
    }

    async fn load_player(
        &self,
        id: AccountId,
    ) -> Result<Option<PlayerRecord>, StoreError> {
        Ok(self.player(id).await)
    }

    async fn start_items(
        &self,
        level: SecurityLevel,
    ) -> Result<Vec<StartItemRule>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .start_items
            .iter()
            .filter(|rule| rule.required_security_level <= level)
            .cloned()
            .collect())
    }

    async fn update_player(&self, row: &PlayerRow) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        tables
            .players
            .entry(row.account_id)
            .or_insert_with(|| PlayerRecord::new(row.account_id))
            .apply_row(row);
        self.player_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn save_characters(
        &self,
        account: AccountId,
        current_slot: u8,
        characters: &[CharacterRecord],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let player = tables
            .players
            .get_mut(&account)
            .ok_or(StoreError::NotFound(account))?;
        player.current_character_slot = current_slot;
        player.characters = characters.to_vec();
        Ok(())
    }

    async fn save_licenses(
        &self,
        account: AccountId,
        licenses: &[LicenseRecord],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let player = tables
            .players
            .get_mut(&account)
            .ok_or(StoreError::NotFound(account))?;
        player.licenses = licenses.to_vec();
        Ok(())
    }

    async fn save_items(
        &self,
        account: AccountId,
        items: &[ItemRecord],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let player = tables
            .players
            .get_mut(&account)
            .ok_or(StoreError::NotFound(account))?;
        player.items = items.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_protocol::{ItemNumber, PeriodType, PriceType};

    fn rule(item: u32, level: u8) -> StartItemRule {
        StartItemRule {
            item_number: ItemNumber(item),
            price_id: 1,
            effect_id: 0,
            color: 0,
            count: 0,
            required_security_level: SecurityLevel(level),
        }
    }

    fn row(account: u64, pen: u32) -> PlayerRow {
        PlayerRow {
            account_id: AccountId(account),
            tutorial_state: 0,
            total_experience: 0,
            pen,
            ap: 0,
            coins1: 0,
            coins2: 0,
        }
    }

    #[tokio::test]
    async fn test_start_items_filters_by_security_level() {
        let store = MemoryStore::with_start_items(vec![
            rule(1, 0),
            rule(2, 3),
            rule(3, 5),
        ]);

        let rules = store.start_items(SecurityLevel(3)).await.unwrap();

        let numbers: Vec<u32> = rules.iter().map(|r| r.item_number.0).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_update_player_creates_row_and_counts_write() {
        let store = MemoryStore::new();

        store.update_player(&row(7, 300)).await.unwrap();

        let stored = store.player(AccountId(7)).await.expect("row created");
        assert_eq!(stored.pen, 300);
        assert_eq!(store.player_writes(), 1);
    }

    #[tokio::test]
    async fn test_save_items_unknown_player_returns_not_found() {
        let store = MemoryStore::new();

        let result = store.save_items(AccountId(9), &[]).await;

        assert!(matches!(result, Err(StoreError::NotFound(AccountId(9)))));
    }

    #[tokio::test]
    async fn test_max_item_id_scans_all_players() {
        let store = MemoryStore::new();
        let mut record = PlayerRecord::new(AccountId(1));
        record.items.push(ItemRecord {
            id: ItemId(17),
            item_number: ItemNumber(1),
            price_type: PriceType::Pen,
            period_type: PeriodType::None,
            period: 0,
            color: 0,
            effect: 0,
            count: 0,
        });
        store.insert_player(record).await;
        store.insert_player(PlayerRecord::new(AccountId(2))).await;

        assert_eq!(store.max_item_id().await, Some(ItemId(17)));
    }
}
