use std::sync::Arc;

use hearth_data::{Catalog, ItemIdAllocator, PlayerStore};
use hearth_transport::Connection;

use crate::{Player, PlayerConfig};

/// Holds the shared dependencies every [`Player`] needs and stamps out
/// uninitialized players, one per login.
pub struct PlayerFactory<S: PlayerStore> {
    config: Arc<PlayerConfig>,
    catalog: Arc<Catalog>,
    store: Arc<S>,
    item_ids: Arc<ItemIdAllocator>,
}

impl<S: PlayerStore> PlayerFactory<S> {
    pub fn new(
        config: PlayerConfig,
        catalog: Arc<Catalog>,
        store: Arc<S>,
        item_ids: Arc<ItemIdAllocator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            catalog,
            store,
            item_ids,
        }
    }

    /// A fresh player with no identity. Call
    /// [`Player::initialize`] before using it.
    pub fn create<T: Connection>(&self) -> Player<S, T> {
        Player::new(
            Arc::clone(&self.config),
            Arc::clone(&self.catalog),
            Arc::clone(&self.store),
            Arc::clone(&self.item_ids),
        )
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S: PlayerStore> Clone for PlayerFactory<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            catalog: Arc::clone(&self.catalog),
            store: Arc::clone(&self.store),
            item_ids: Arc::clone(&self.item_ids),
        }
    }
}
