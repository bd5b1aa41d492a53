//! Start items for players with an empty inventory.
//!
//! Rules come from storage and are authored by hand, so they're often a
//! little wrong. Each rule is checked against the catalog and repaired
//! where its intent is clear:
//!
//! | Problem                                   | Outcome                   |
//! |-------------------------------------------|---------------------------|
//! | item number not in the catalog            | skipped, warning          |
//! | price variant missing                     | skipped, warning          |
//! | effect variant missing                    | granted with no effect    |
//! | color above the item's color group        | granted with color 0, warning |
//! | count on a non-stackable item             | granted with count 0, warning |
//! | negative count                            | granted with count 0      |
//!
//! One bad rule never stops the others.

use hearth_data::{
    Catalog, CatalogItem, ItemIdAllocator, PlayerStore, StartItemRule,
};
use hearth_transport::Connection;

use crate::{Inventory, Player, PlayerError};

impl<S: PlayerStore, T: Connection> Player<S, T> {
    /// Loads the start-item rules for this account's security level and
    /// grants them into `inventory`.
    ///
    /// # Errors
    /// [`PlayerError::Store`] if the rules can't be loaded. Problems with
    /// individual rules are logged, not returned.
    pub(crate) async fn provision_start_items(
        &self,
        inventory: &mut Inventory,
    ) -> Result<usize, PlayerError> {
        let rules = self.store().start_items(self.security_level()).await?;
        let granted =
            grant_start_items(self.catalog(), &rules, inventory, self.item_ids());
        tracing::info!(rules = rules.len(), granted, "start items provisioned");
        Ok(granted)
    }
}

/// Grants every rule that can be resolved. Returns how many items were
/// created.
pub fn grant_start_items(
    catalog: &Catalog,
    rules: &[StartItemRule],
    inventory: &mut Inventory,
    ids: &ItemIdAllocator,
) -> usize {
    let mut granted = 0;
    for rule in rules {
        let Some(item) = catalog.item(rule.item_number) else {
            tracing::warn!(
                item = %rule.item_number,
                price_id = rule.price_id,
                "start item rule references unknown item, skipping"
            );
            continue;
        };
        let Some(price) = item.price(rule.price_id) else {
            tracing::warn!(
                item = %rule.item_number,
                price_id = rule.price_id,
                "start item rule references unknown price, skipping"
            );
            continue;
        };
        let effect = match item.effect(rule.effect_id) {
            Some(variant) => variant.effect,
            None => {
                tracing::debug!(
                    item = %rule.item_number,
                    effect_id = rule.effect_id,
                    "start item effect not found, granting without effect"
                );
                0
            }
        };
        let color = checked_color(rule, item);
        let count = checked_count(rule, item);

        inventory.create(ids, item, price, color, effect, count);
        granted += 1;
    }
    granted
}

fn checked_color(rule: &StartItemRule, item: &CatalogItem) -> u8 {
    if rule.color > item.color_group {
        tracing::warn!(
            item = %rule.item_number,
            color = rule.color,
            color_group = item.color_group,
            "start item color out of range, using 0"
        );
        return 0;
    }
    rule.color
}

fn checked_count(rule: &StartItemRule, item: &CatalogItem) -> u32 {
    if rule.count > 0 && !item.category.is_stackable() {
        tracing::warn!(
            item = %rule.item_number,
            count = rule.count,
            category = ?item.category,
            "start item count on non-stackable item, using 0"
        );
        return 0;
    }
    u32::try_from(rule.count).unwrap_or(0)
}
