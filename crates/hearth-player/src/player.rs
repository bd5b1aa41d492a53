//! The player aggregate.
//!
//! A [`Player`] is everything the server knows about one logged-in account:
//! progress and balances, characters, licenses, inventory, and the session
//! it talks through.
//!
//! # Lifecycle
//!
//! ```text
//! PlayerFactory::create()   dependencies only, no identity yet
//!        │
//!        ▼
//! initialize(session, account, record)   exactly once per login
//!        │
//!        ▼
//! send_account_information()   login handshake
//!        │
//!        ▼
//! mutators / save() ...        gameplay, autosave
//!        │
//!        ▼
//! disconnect()                 listeners fire, logging scope closes
//! ```
//!
//! Using a player before `initialize`, or initializing it twice, is a bug
//! in the caller and panics.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, OnceLock};

use hearth_data::{
    AccountRecord, Catalog, ItemIdAllocator, PlayerRecord, PlayerRow,
    PlayerStore, SecurityLevel,
};
use hearth_protocol::{AccountId, ChannelId, RoomId};
use hearth_transport::Connection;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tracing::{Instrument, Span};

use crate::{
    ChangeTracker, CharacterManager, ClientSession, DisconnectListeners,
    Inventory, LicenseManager, PlayerConfig, PlayerDisconnected, PlayerError,
    Tracked,
};

/// Who the player is. Bound once by [`Player::initialize`].
struct Identity<T: Connection> {
    account: AccountRecord,
    session: Arc<ClientSession<T>>,
}

/// One logged-in player.
///
/// Shared as `Arc<Player<S, T>>` between the connection task that owns it
/// and the autosave loop. Scalar fields are [`Tracked`] so every setter
/// marks the player dirty; the sub-managers track their own changes.
pub struct Player<S: PlayerStore, T: Connection> {
    config: Arc<PlayerConfig>,
    catalog: Arc<Catalog>,
    store: Arc<S>,
    item_ids: Arc<ItemIdAllocator>,

    identity: OnceLock<Identity<T>>,
    span: Mutex<Option<Span>>,

    tracker: Arc<ChangeTracker>,
    tutorial_state: Tracked<u8>,
    total_experience: Tracked<u32>,
    pen: Tracked<u32>,
    ap: Tracked<u32>,
    coins1: Tracked<u32>,
    coins2: Tracked<u32>,

    // Handles only; the lobby owns the channel and room themselves.
    channel: Mutex<Option<ChannelId>>,
    room: Mutex<Option<RoomId>>,

    characters: AsyncMutex<CharacterManager>,
    licenses: AsyncMutex<LicenseManager>,
    inventory: AsyncMutex<Inventory>,

    listeners: DisconnectListeners,
    handshake_running: AtomicBool,
}

impl<S: PlayerStore, T: Connection> Player<S, T> {
    /// Builds a player with no identity. Prefer
    /// [`PlayerFactory::create`](crate::PlayerFactory::create).
    pub fn new(
        config: Arc<PlayerConfig>,
        catalog: Arc<Catalog>,
        store: Arc<S>,
        item_ids: Arc<ItemIdAllocator>,
    ) -> Self {
        let tracker = Arc::new(ChangeTracker::new());
        Self {
            config,
            catalog,
            store,
            item_ids,
            identity: OnceLock::new(),
            span: Mutex::new(None),
            tutorial_state: Tracked::new(0, Arc::clone(&tracker)),
            total_experience: Tracked::new(0, Arc::clone(&tracker)),
            pen: Tracked::new(0, Arc::clone(&tracker)),
            ap: Tracked::new(0, Arc::clone(&tracker)),
            coins1: Tracked::new(0, Arc::clone(&tracker)),
            coins2: Tracked::new(0, Arc::clone(&tracker)),
            tracker,
            channel: Mutex::new(None),
            room: Mutex::new(None),
            characters: AsyncMutex::new(CharacterManager::new()),
            licenses: AsyncMutex::new(LicenseManager::new()),
            inventory: AsyncMutex::new(Inventory::new()),
            listeners: DisconnectListeners::default(),
            handshake_running: AtomicBool::new(false),
        }
    }

    /// Binds the player to a login and loads its persisted state.
    ///
    /// Opens the player's logging scope and hydrates every sub-manager from
    /// `record`. The player is clean afterwards.
    ///
    /// # Panics
    /// If called twice, or if `record` belongs to another account.
    pub fn initialize(
        &mut self,
        session: Arc<ClientSession<T>>,
        account: AccountRecord,
        record: &PlayerRecord,
    ) {
        assert!(
            self.identity.get().is_none(),
            "player {} initialized twice",
            account.id
        );
        assert_eq!(
            record.account_id, account.id,
            "player record does not belong to the account"
        );

        let span = tracing::info_span!(
            "player",
            account_id = %account.id,
            nickname = %account.nickname,
            conn = %session.id(),
            remote = ?session.remote_addr(),
        );

        self.tutorial_state.hydrate(record.tutorial_state);
        self.total_experience.hydrate(record.total_experience);
        self.pen.hydrate(record.pen);
        self.ap.hydrate(record.ap);
        self.coins1.hydrate(record.coins1);
        self.coins2.hydrate(record.coins2);
        self.characters.get_mut().initialize(record);
        self.licenses.get_mut().initialize(record);
        self.inventory.get_mut().initialize(record);

        // Checked above; `&mut self` rules out a racing initialize.
        let _ = self.identity.set(Identity { account, session });

        span.in_scope(|| {
            tracing::info!(
                characters = record.characters.len(),
                licenses = record.licenses.len(),
                items = record.items.len(),
                "player initialized"
            );
        });
        *self.span.get_mut() = Some(span);
    }

    fn identity(&self) -> &Identity<T> {
        self.identity
            .get()
            .expect("player used before initialize()")
    }

    // -- Identity ---------------------------------------------------------

    pub fn account(&self) -> &AccountRecord {
        &self.identity().account
    }

    pub fn account_id(&self) -> AccountId {
        self.identity().account.id
    }

    pub fn nickname(&self) -> &str {
        &self.identity().account.nickname
    }

    pub fn security_level(&self) -> SecurityLevel {
        self.identity().account.security_level
    }

    pub fn session(&self) -> &Arc<ClientSession<T>> {
        &self.identity().session
    }

    /// The player's logging scope. Disabled once the player disconnected.
    pub fn span(&self) -> Span {
        self.span.lock().clone().unwrap_or_else(Span::none)
    }

    // -- Collaborators ----------------------------------------------------

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub(crate) fn item_ids(&self) -> &ItemIdAllocator {
        &self.item_ids
    }

    pub(crate) fn handshake_flag(&self) -> &AtomicBool {
        &self.handshake_running
    }

    // -- Scalars ----------------------------------------------------------

    pub fn tutorial_state(&self) -> u8 {
        self.tutorial_state.get()
    }

    pub fn total_experience(&self) -> u32 {
        self.total_experience.get()
    }

    /// Level reached with the current experience.
    pub fn level(&self) -> u8 {
        self.catalog.level_for(self.total_experience())
    }

    pub fn pen(&self) -> u32 {
        self.pen.get()
    }

    pub fn ap(&self) -> u32 {
        self.ap.get()
    }

    pub fn coins1(&self) -> u32 {
        self.coins1.get()
    }

    pub fn coins2(&self) -> u32 {
        self.coins2.get()
    }

    pub fn set_tutorial_state(&self, value: u8) -> bool {
        self.tutorial_state.set(value)
    }

    pub fn set_total_experience(&self, value: u32) -> bool {
        self.total_experience.set(value)
    }

    pub fn set_pen(&self, value: u32) -> bool {
        self.pen.set(value)
    }

    pub fn set_ap(&self, value: u32) -> bool {
        self.ap.set(value)
    }

    pub fn set_coins1(&self, value: u32) -> bool {
        self.coins1.set(value)
    }

    pub fn set_coins2(&self, value: u32) -> bool {
        self.coins2.set(value)
    }

    /// Adds experience, saturating at `u32::MAX`. Returns `true` if the
    /// total changed.
    pub fn gain_experience(&self, amount: u32) -> bool {
        self.total_experience
            .update(|xp| Some(xp.saturating_add(amount)))
    }

    pub fn add_pen(&self, amount: u32) -> bool {
        self.pen.update(|pen| Some(pen.saturating_add(amount)))
    }

    pub fn add_ap(&self, amount: u32) -> bool {
        self.ap.update(|ap| Some(ap.saturating_add(amount)))
    }

    /// Takes `amount` pen. Returns `false` without touching the balance if
    /// the player can't afford it.
    pub fn spend_pen(&self, amount: u32) -> bool {
        let mut affordable = false;
        self.pen.update(|pen| {
            let left = pen.checked_sub(amount);
            affordable = left.is_some();
            left
        });
        affordable
    }

    // -- Lobby handles ----------------------------------------------------

    pub fn channel(&self) -> Option<ChannelId> {
        *self.channel.lock()
    }

    pub fn set_channel(&self, channel: Option<ChannelId>) {
        *self.channel.lock() = channel;
    }

    pub fn room(&self) -> Option<RoomId> {
        *self.room.lock()
    }

    pub fn set_room(&self, room: Option<RoomId>) {
        *self.room.lock() = room;
    }

    // -- Sub-managers -----------------------------------------------------

    pub async fn characters(&self) -> MutexGuard<'_, CharacterManager> {
        self.characters.lock().await
    }

    pub async fn licenses(&self) -> MutexGuard<'_, LicenseManager> {
        self.licenses.lock().await
    }

    pub async fn inventory(&self) -> MutexGuard<'_, Inventory> {
        self.inventory.lock().await
    }

    // -- Change tracking & persistence ------------------------------------

    /// `true` if a scalar field changed since the last successful save.
    /// Sub-managers report their own state.
    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    fn row(&self) -> PlayerRow {
        PlayerRow {
            account_id: self.account_id(),
            tutorial_state: self.tutorial_state(),
            total_experience: self.total_experience(),
            pen: self.pen(),
            ap: self.ap(),
            coins1: self.coins1(),
            coins2: self.coins2(),
        }
    }

    /// Writes everything that changed.
    ///
    /// The player's own row goes first and only if dirty. Characters,
    /// licenses and inventory follow unconditionally; each one decides for
    /// itself whether it has anything to write.
    ///
    /// # Errors
    /// The first failing write. Whatever wasn't written stays dirty, so the
    /// next save retries it.
    pub async fn save(&self, store: &S) -> Result<(), PlayerError> {
        let account_id = self.account_id();
        async {
            if let Some(revision) = self.tracker.begin_flush() {
                let row = self.row();
                store.update_player(&row).await?;
                self.tracker.complete_flush(revision);
                tracing::debug!("player row saved");
            }
            self.characters.lock().await.save(store, account_id).await?;
            self.licenses.lock().await.save(store, account_id).await?;
            self.inventory.lock().await.save(store, account_id).await?;
            Ok::<(), PlayerError>(())
        }
        .instrument(self.span())
        .await
        .inspect_err(|e| {
            tracing::warn!(%account_id, error = %e, "player save failed");
        })
    }

    // -- Disconnect -------------------------------------------------------

    /// Registers a callback for when this player disconnects.
    pub fn on_disconnect(
        &self,
        listener: impl Fn(&PlayerDisconnected) + Send + Sync + 'static,
    ) {
        self.listeners.subscribe(listener);
    }

    /// Tells every listener the player is gone, then closes the logging
    /// scope.
    ///
    /// Doesn't save and doesn't close the connection; the caller does both.
    pub fn disconnect(&self) {
        let event = PlayerDisconnected {
            account_id: self.account_id(),
            connection: self.session().id(),
        };
        let span = self.span.lock().take().unwrap_or_else(Span::none);
        span.in_scope(|| {
            let notified = self.listeners.fire(&event);
            tracing::info!(listeners = notified, "player disconnected");
        });
    }
}

impl<S: PlayerStore, T: Connection> std::fmt::Debug for Player<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Player");
        match self.identity.get() {
            Some(identity) => debug.field("account_id", &identity.account.id),
            None => debug.field("account_id", &"<uninitialized>"),
        };
        debug.field("dirty", &self.is_dirty()).finish()
    }
}
