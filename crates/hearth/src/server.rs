//! `HearthServer` builder, accept loop, and autosave.
//!
//! This is the entry point for running a Hearth login server. It ties the
//! layers together: transport → session → player core → storage.

use std::sync::Arc;
use std::time::Duration;

use hearth_data::{Catalog, ItemIdAllocator, PlayerStore};
use hearth_player::{Player, PlayerConfig, PlayerFactory};
use hearth_protocol::AccountId;
use hearth_transport::{Transport, WebSocketConnection, WebSocketTransport};
use tokio::time::MissedTickBehavior;

use crate::handler::handle_connection;
use crate::{Authenticator, HearthError, PlayerRegistry, ServerConfig};

/// The protocol version clients must send in `Login`.
pub const PROTOCOL_VERSION: u32 = 1;

/// A player bound to a WebSocket connection.
pub type OnlinePlayer<S> = Player<S, WebSocketConnection>;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S: PlayerStore, A: Authenticator> {
    pub(crate) config: ServerConfig,
    pub(crate) factory: PlayerFactory<S>,
    pub(crate) auth: A,
    pub(crate) registry: PlayerRegistry<OnlinePlayer<S>>,
}

impl<S: PlayerStore, A: Authenticator> ServerState<S, A> {
    pub(crate) fn store(&self) -> &S {
        self.factory.store()
    }
}

/// Builder for configuring and starting a Hearth server.
///
/// # Example
///
/// ```rust,ignore
/// let server = HearthServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .player_config(PlayerConfig { enable_tutorial: true, ..Default::default() })
///     .build(store, catalog, auth)
///     .await?;
/// server.run().await
/// ```
pub struct HearthServerBuilder {
    config: ServerConfig,
    player_config: PlayerConfig,
    item_ids: Option<Arc<ItemIdAllocator>>,
}

impl HearthServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            player_config: PlayerConfig::default(),
            item_ids: None,
        }
    }

    /// Replaces every server setting at once.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn player_config(mut self, config: PlayerConfig) -> Self {
        self.player_config = config;
        self
    }

    /// Interval between autosave passes. Sub-second precision is dropped.
    pub fn autosave_interval(mut self, interval: Duration) -> Self {
        self.config.autosave_interval_secs = interval.as_secs().max(1);
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// The allocator new item ids come from. Seed it above the highest id
    /// in storage; defaults to starting at 1.
    pub fn item_ids(mut self, item_ids: Arc<ItemIdAllocator>) -> Self {
        self.item_ids = Some(item_ids);
        self
    }

    /// Binds the listener and assembles the server.
    pub async fn build<S: PlayerStore, A: Authenticator>(
        self,
        store: Arc<S>,
        catalog: Arc<Catalog>,
        auth: A,
    ) -> Result<HearthServer<S, A>, HearthError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let item_ids = self.item_ids.unwrap_or_default();

        let state = Arc::new(ServerState {
            factory: PlayerFactory::new(self.player_config, catalog, store, item_ids),
            auth,
            registry: PlayerRegistry::new(),
            config: self.config,
        });

        Ok(HearthServer { transport, state })
    }
}

impl Default for HearthServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Hearth login server.
pub struct HearthServer<S: PlayerStore, A: Authenticator> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S, A>>,
}

impl<S: PlayerStore, A: Authenticator> HearthServer<S, A> {
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Number of registered players, including departing ones whose final
    /// save hasn't succeeded yet.
    pub fn online(&self) -> usize {
        self.state.registry.len()
    }

    /// Starts the autosave loop, then accepts connections until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), HearthError> {
        tracing::info!(
            autosave_secs = self.state.config.autosave_interval_secs,
            "Hearth server running"
        );
        tokio::spawn(autosave_loop(Arc::clone(&self.state)));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Flushes every online player once per interval. A pass that runs long
/// pushes the next one back instead of bunching them up.
async fn autosave_loop<S: PlayerStore, A: Authenticator>(
    state: Arc<ServerState<S, A>>,
) {
    let mut ticker = tokio::time::interval(state.config.autosave_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await; // the first tick fires immediately

    loop {
        ticker.tick().await;
        save_all(&state).await;
    }
}

/// Saves every registered player. Returns how many saves failed; failures
/// stay dirty and are retried on the next pass.
///
/// Departing players whose save succeeds are let go here.
pub(crate) async fn save_all<S: PlayerStore, A: Authenticator>(
    state: &ServerState<S, A>,
) -> usize {
    let players = state.registry.snapshot();
    let mut failed = 0;
    for player in &players {
        if player.save(state.store()).await.is_err() {
            failed += 1;
        } else {
            complete_departure(state, player.account_id());
        }
    }
    tracing::debug!(players = players.len(), failed, "autosave pass finished");
    failed
}

/// Unregisters a departing player and fires its disconnect event. Does
/// nothing for a player that is still connected or already gone.
///
/// Only call this after a save of the player succeeded.
pub(crate) fn complete_departure<S: PlayerStore, A: Authenticator>(
    state: &ServerState<S, A>,
    account_id: AccountId,
) {
    if let Some(player) = state.registry.take_departed(account_id) {
        player.disconnect();
    }
}
