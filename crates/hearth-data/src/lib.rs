//! Reference data and persistence contract for Hearth.
//!
//! Two kinds of data live here:
//!
//! 1. **Read-only catalog data** ([`Catalog`]) — purchasable items with their
//!    price and effect variants, and the experience → level table. Loaded
//!    once at startup, shared by every player.
//! 2. **Persisted player data** — the records a [`PlayerStore`] loads at
//!    login and writes back on save, plus the start-item rules that seed an
//!    empty inventory.
//!
//! [`MemoryStore`] is a complete in-process [`PlayerStore`] used by the demo
//! server and by tests.

#![allow(async_fn_in_trait)]

mod catalog;
mod error;
mod ids;
mod memory;
mod records;
mod store;

pub use catalog::{
    Catalog, CatalogItem, EffectVariant, ItemCategory, LevelEntry, LevelTable,
    PriceVariant,
};
pub use error::{CatalogError, StoreError};
pub use ids::ItemIdAllocator;
pub use memory::MemoryStore;
pub use records::{
    AccountRecord, CharacterRecord, ItemRecord, LicenseRecord, PlayerRecord,
    PlayerRow, SecurityLevel, StartItemRule,
};
pub use store::PlayerStore;
