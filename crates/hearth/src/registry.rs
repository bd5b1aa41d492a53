//! Who is online right now.
//!
//! The registry maps each logged-in account to its live player. It enforces
//! one connection per account and gives the autosave loop a snapshot of
//! everyone to flush.
//!
//! Entries are added by the login handler. When the connection ends the
//! entry is marked departing and stays until a save of that player
//! succeeds, so a relogin can never load rows older than what the departed
//! session still holds in memory.

use std::collections::HashMap;
use std::sync::Arc;

use hearth_protocol::AccountId;
use parking_lot::Mutex;

use crate::HearthError;

/// Online players, keyed by account.
///
/// Generic over the player type so it can be exercised without a live
/// connection. Every operation takes the lock briefly and never across an
/// `.await`, so a plain (non-async) mutex is enough.
pub struct PlayerRegistry<P> {
    players: Mutex<HashMap<AccountId, Entry<P>>>,
}

struct Entry<P> {
    player: Arc<P>,
    departing: bool,
}

impl<P> PlayerRegistry<P> {
    pub fn new() -> Self {
        Self {
            players: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a player that just logged in.
    ///
    /// # Errors
    /// [`HearthError::AlreadyOnline`] if the account already has a live
    /// player. The existing entry is left alone.
    pub fn register(
        &self,
        account: AccountId,
        player: Arc<P>,
    ) -> Result<(), HearthError> {
        let mut players = self.players.lock();
        if players.contains_key(&account) {
            return Err(HearthError::AlreadyOnline(account));
        }
        players.insert(
            account,
            Entry {
                player,
                departing: false,
            },
        );
        tracing::debug!(%account, online = players.len(), "player registered");
        Ok(())
    }

    /// Removes an account. Returns the player if it was online.
    pub fn remove(&self, account: AccountId) -> Option<Arc<P>> {
        let removed = self.players.lock().remove(&account).map(|e| e.player);
        if removed.is_some() {
            tracing::debug!(%account, "player unregistered");
        }
        removed
    }

    /// Flags an account whose connection is gone but whose state may not be
    /// persisted yet. The entry keeps blocking logins until
    /// [`take_departed`](Self::take_departed). Returns `false` if the
    /// account isn't registered.
    pub fn mark_departing(&self, account: AccountId) -> bool {
        match self.players.lock().get_mut(&account) {
            Some(entry) => {
                entry.departing = true;
                true
            }
            None => false,
        }
    }

    /// Removes an account only if it was marked departing. Live players are
    /// left in place.
    pub fn take_departed(&self, account: AccountId) -> Option<Arc<P>> {
        let mut players = self.players.lock();
        if !players.get(&account).is_some_and(|e| e.departing) {
            return None;
        }
        let removed = players.remove(&account).map(|e| e.player);
        tracing::debug!(%account, online = players.len(), "departed player unregistered");
        removed
    }

    pub fn get(&self, account: AccountId) -> Option<Arc<P>> {
        self.players.lock().get(&account).map(|e| Arc::clone(&e.player))
    }

    /// Every registered player at this instant, departing ones included.
    /// The lock is released before returning, so callers may await on the
    /// players freely.
    pub fn snapshot(&self) -> Vec<Arc<P>> {
        self.players
            .lock()
            .values()
            .map(|e| Arc::clone(&e.player))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.lock().is_empty()
    }
}

impl<P> Default for PlayerRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
