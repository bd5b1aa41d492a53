//! The storage contract the player core depends on.
//!
//! Hearth doesn't ship a database driver. It defines [`PlayerStore`]: the
//! handful of reads and writes a player's lifecycle needs. Plug in a SQL
//! backend in production, [`MemoryStore`](crate::MemoryStore) in tests and
//! demos.

use std::future::Future;

use hearth_protocol::AccountId;

use crate::{
    AccountRecord, CharacterRecord, ItemRecord, LicenseRecord, PlayerRecord,
    PlayerRow, SecurityLevel, StartItemRule, StoreError,
};

/// Async persistence for player aggregates.
///
/// `Send + Sync + 'static` because one store is shared by every connection
/// task and the autosave loop. Each method returns a `Send` future so
/// callers can hold it across `tokio::spawn` boundaries.
///
/// The `save_*` methods replace the stored set for the account with the
/// given slice.
pub trait PlayerStore: Send + Sync + 'static {
    /// Loads an account by id. `Ok(None)` if it doesn't exist.
    fn load_account(
        &self,
        id: AccountId,
    ) -> impl Future<Output = Result<Option<AccountRecord>, StoreError>> + Send;

    /// Loads everything persisted for an account. `Ok(None)` for a player
    /// who has never logged in.
    fn load_player(
        &self,
        id: AccountId,
    ) -> impl Future<Output = Result<Option<PlayerRecord>, StoreError>> + Send;

    /// Start-item rules whose required security level is at most `level`.
    fn start_items(
        &self,
        level: SecurityLevel,
    ) -> impl Future<Output = Result<Vec<StartItemRule>, StoreError>> + Send;

    /// Updates (or creates) the scalar player row keyed by account id.
    fn update_player(
        &self,
        row: &PlayerRow,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Stores the character set and which slot is active.
    fn save_characters(
        &self,
        account: AccountId,
        current_slot: u8,
        characters: &[CharacterRecord],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn save_licenses(
        &self,
        account: AccountId,
        licenses: &[LicenseRecord],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn save_items(
        &self,
        account: AccountId,
        items: &[ItemRecord],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
