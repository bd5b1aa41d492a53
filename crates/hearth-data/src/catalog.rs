//! Read-only catalog: what can be owned, at what price, and how experience
//! maps to levels.
//!
//! Catalog data is immutable after loading. Players hold an
//! `Arc<Catalog>` and only ever read from it.

use std::collections::HashMap;

use hearth_protocol::{ItemNumber, PeriodType, PriceType};
use serde::{Deserialize, Serialize};

use crate::CatalogError;

// ---------------------------------------------------------------------------
// ItemCategory
// ---------------------------------------------------------------------------

/// Broad item classification.
///
/// The declaration order is meaningful: everything up to and including
/// [`ItemCategory::Skill`] is equipment that can't stack, everything after it
/// is a consumable that carries a count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "PascalCase")]
pub enum ItemCategory {
    Costume,
    Weapon,
    Skill,
    OneTimeUse,
    Coupon,
}

impl ItemCategory {
    /// Returns `true` if items of this category carry a stack count.
    pub fn is_stackable(self) -> bool {
        self > Self::Skill
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// One way to buy an item. `id` is local to the owning [`CatalogItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceVariant {
    pub id: u32,
    pub price_type: PriceType,
    pub period_type: PeriodType,
    pub period: u16,
    pub price: u32,
}

/// One effect an item can carry. `id` is local to the owning [`CatalogItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectVariant {
    pub id: u32,
    pub effect: u32,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub number: ItemNumber,
    pub category: ItemCategory,
    /// Highest valid color index for this item.
    pub color_group: u8,
    #[serde(default)]
    pub prices: Vec<PriceVariant>,
    #[serde(default)]
    pub effects: Vec<EffectVariant>,
}

impl CatalogItem {
    /// Looks up a price variant by its local id.
    pub fn price(&self, id: u32) -> Option<&PriceVariant> {
        self.prices.iter().find(|p| p.id == id)
    }

    /// Looks up an effect variant by its local id.
    pub fn effect(&self, id: u32) -> Option<&EffectVariant> {
        self.effects.iter().find(|e| e.id == id)
    }
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// Total experience needed to reach `level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEntry {
    pub level: u8,
    pub total_experience: u32,
}

/// Experience → level conversion table.
///
/// Entries are kept sorted by `total_experience`.
#[derive(Debug, Clone, Default)]
pub struct LevelTable {
    entries: Vec<LevelEntry>,
}

impl LevelTable {
    /// Builds a table from unordered entries.
    pub fn new(mut entries: Vec<LevelEntry>) -> Self {
        entries.sort_by_key(|e| e.total_experience);
        Self { entries }
    }

    /// Returns the highest level whose requirement `total_experience`
    /// meets. Returns 0 when the table is empty or the requirement of the
    /// first entry isn't met yet.
    pub fn level_for(&self, total_experience: u32) -> u8 {
        // `partition_point` finds the first entry that is NOT reachable;
        // the one right before it is the current level.
        let reached = self
            .entries
            .partition_point(|e| e.total_experience <= total_experience);
        match reached {
            0 => 0,
            n => self.entries[n - 1].level,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// On-disk shape of a catalog document.
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    items: Vec<CatalogItem>,
    #[serde(default)]
    levels: Vec<LevelEntry>,
}

/// All read-only reference data a player needs.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<ItemNumber, CatalogItem>,
    levels: LevelTable,
}

impl Catalog {
    /// Builds a catalog from already-parsed parts.
    ///
    /// # Errors
    /// [`CatalogError::DuplicateItem`] if two entries share an item number.
    pub fn new(
        items: Vec<CatalogItem>,
        levels: Vec<LevelEntry>,
    ) -> Result<Self, CatalogError> {
        let mut by_number = HashMap::with_capacity(items.len());
        for item in items {
            let number = item.number;
            if by_number.insert(number, item).is_some() {
                return Err(CatalogError::DuplicateItem(number));
            }
        }
        tracing::debug!(
            items = by_number.len(),
            levels = levels.len(),
            "catalog loaded"
        );
        Ok(Self {
            items: by_number,
            levels: LevelTable::new(levels),
        })
    }

    /// Parses a JSON catalog document:
    ///
    /// ```json
    /// { "items": [ { "number": 1, "category": "Weapon", "color_group": 3,
    ///                "prices": [...], "effects": [...] } ],
    ///   "levels": [ { "level": 1, "total_experience": 0 } ] }
    /// ```
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        Self::new(doc.items, doc.levels)
    }

    /// Looks up a catalog entry by item number.
    pub fn item(&self, number: ItemNumber) -> Option<&CatalogItem> {
        self.items.get(&number)
    }

    /// Experience → level.
    pub fn level_for(&self, total_experience: u32) -> u8 {
        self.levels.level_for(total_experience)
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> LevelTable {
        LevelTable::new(vec![
            LevelEntry {
                level: 2,
                total_experience: 100,
            },
            LevelEntry {
                level: 0,
                total_experience: 0,
            },
            LevelEntry {
                level: 1,
                total_experience: 40,
            },
        ])
    }

    #[test]
    fn test_item_category_is_stackable_splits_after_skill() {
        assert!(!ItemCategory::Costume.is_stackable());
        assert!(!ItemCategory::Weapon.is_stackable());
        assert!(!ItemCategory::Skill.is_stackable());
        assert!(ItemCategory::OneTimeUse.is_stackable());
        assert!(ItemCategory::Coupon.is_stackable());
    }

    #[test]
    fn test_level_for_exact_threshold_reaches_level() {
        assert_eq!(levels().level_for(40), 1);
        assert_eq!(levels().level_for(100), 2);
    }

    #[test]
    fn test_level_for_between_thresholds_stays_lower() {
        assert_eq!(levels().level_for(39), 0);
        assert_eq!(levels().level_for(99), 1);
        assert_eq!(levels().level_for(u32::MAX), 2);
    }

    #[test]
    fn test_level_for_empty_table_returns_zero() {
        assert_eq!(LevelTable::default().level_for(1_000), 0);
    }

    #[test]
    fn test_from_json_parses_items_and_levels() {
        let json = r#"{
            "items": [{
                "number": 1010101,
                "category": "Weapon",
                "color_group": 3,
                "prices": [{ "id": 1, "price_type": "Pen", "period_type": "None", "period": 0, "price": 500 }],
                "effects": [{ "id": 1, "effect": 1203 }]
            }],
            "levels": [{ "level": 0, "total_experience": 0 }, { "level": 1, "total_experience": 10 }]
        }"#;

        let catalog = Catalog::from_json(json).expect("valid catalog");

        let item = catalog.item(ItemNumber(1010101)).expect("item present");
        assert_eq!(item.category, ItemCategory::Weapon);
        assert_eq!(item.price(1).map(|p| p.price), Some(500));
        assert_eq!(item.effect(1).map(|e| e.effect), Some(1203));
        assert!(item.price(2).is_none());
        assert_eq!(catalog.level_for(15), 1);
    }

    #[test]
    fn test_from_json_duplicate_item_returns_error() {
        let json = r#"{ "items": [
            { "number": 5, "category": "Skill", "color_group": 0 },
            { "number": 5, "category": "Skill", "color_group": 0 }
        ] }"#;

        let result = Catalog::from_json(json);

        assert!(matches!(
            result,
            Err(CatalogError::DuplicateItem(ItemNumber(5)))
        ));
    }

    #[test]
    fn test_from_json_garbage_returns_parse_error() {
        assert!(matches!(
            Catalog::from_json("{ nope"),
            Err(CatalogError::Parse(_))
        ));
    }
}
