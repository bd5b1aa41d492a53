use std::sync::atomic::{AtomicU64, Ordering};

use hearth_protocol::ItemId;

/// Hands out unique [`ItemId`]s for newly created items.
///
/// Shared by every player on the server, so it must be seeded above the
/// highest id already in storage.
#[derive(Debug)]
pub struct ItemIdAllocator {
    next: AtomicU64,
}

impl ItemIdAllocator {
    /// The first id handed out will be `first`.
    pub fn new(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.max(1)),
        }
    }

    /// Seeds the allocator just above `highest`, the largest id in storage.
    pub fn after(highest: Option<ItemId>) -> Self {
        Self::new(highest.map_or(1, |id| id.0.saturating_add(1)))
    }

    pub fn next_id(&self) -> ItemId {
        ItemId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ItemIdAllocator {
    fn default() -> Self {
        Self::new(1)
    }
}
