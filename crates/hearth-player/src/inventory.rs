//! Items a player owns.

use std::collections::BTreeMap;

use hearth_data::{
    CatalogItem, ItemIdAllocator, ItemRecord, PlayerRecord, PlayerStore,
    PriceVariant, StoreError,
};
use hearth_protocol::{AccountId, ItemDto, ItemId, ItemNumber, PeriodType, PriceType};

use crate::ChangeTracker;

/// One owned item instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerItem {
    pub id: ItemId,
    pub item_number: ItemNumber,
    pub price_type: PriceType,
    pub period_type: PeriodType,
    pub period: u16,
    pub color: u8,
    pub effect: u32,
    pub count: u32,
}

impl PlayerItem {
    pub fn to_dto(&self) -> ItemDto {
        ItemDto {
            id: self.id,
            item_number: self.item_number,
            price_type: self.price_type,
            period_type: self.period_type,
            period: self.period,
            color: self.color,
            effect: self.effect,
            count: self.count,
        }
    }

    fn to_record(&self) -> ItemRecord {
        ItemRecord {
            id: self.id,
            item_number: self.item_number,
            price_type: self.price_type,
            period_type: self.period_type,
            period: self.period,
            color: self.color,
            effect: self.effect,
            count: self.count,
        }
    }

    fn from_record(record: &ItemRecord) -> Self {
        Self {
            id: record.id,
            item_number: record.item_number,
            price_type: record.price_type,
            period_type: record.period_type,
            period: record.period,
            color: record.color,
            effect: record.effect,
            count: record.count,
        }
    }
}

/// Owned items keyed by id, iterated in ascending id order.
#[derive(Debug, Default)]
pub struct Inventory {
    items: BTreeMap<ItemId, PlayerItem>,
    tracker: ChangeTracker,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&mut self, record: &PlayerRecord) {
        self.items = record
            .items
            .iter()
            .map(|item| (item.id, PlayerItem::from_record(item)))
            .collect();
        self.tracker.mark_clean();
    }

    /// Creates a new item instance with a fresh id.
    ///
    /// The caller is responsible for having validated `color`, `effect` and
    /// `count` against `item`.
    pub fn create(
        &mut self,
        ids: &ItemIdAllocator,
        item: &CatalogItem,
        price: &PriceVariant,
        color: u8,
        effect: u32,
        count: u32,
    ) -> &PlayerItem {
        let id = ids.next_id();
        self.tracker.mark_dirty();
        tracing::debug!(item_id = %id, item = %item.number, "item created");
        self.items.entry(id).or_insert(PlayerItem {
            id,
            item_number: item.number,
            price_type: price.price_type,
            period_type: price.period_type,
            period: price.period,
            color,
            effect,
            count,
        })
    }

    pub fn get(&self, id: ItemId) -> Option<&PlayerItem> {
        self.items.get(&id)
    }

    pub fn remove(&mut self, id: ItemId) -> Option<PlayerItem> {
        let removed = self.items.remove(&id)?;
        self.tracker.mark_dirty();
        Some(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    pub async fn save<S: PlayerStore>(
        &self,
        store: &S,
        account: AccountId,
    ) -> Result<(), StoreError> {
        let Some(revision) = self.tracker.begin_flush() else {
            return Ok(());
        };
        let records: Vec<ItemRecord> =
            self.items.values().map(PlayerItem::to_record).collect();
        store.save_items(account, &records).await?;
        self.tracker.complete_flush(revision);
        tracing::debug!(items = records.len(), "inventory saved");
        Ok(())
    }
}
