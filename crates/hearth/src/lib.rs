//! # Hearth
//!
//! Lobby login server for a multiplayer game.
//!
//! Hearth accepts WebSocket connections, authenticates the login token,
//! loads the account, and brings a [`Player`](hearth_player::Player) online:
//! the client receives its licenses, inventory, characters and balances in
//! a fixed order, an empty inventory is seeded with start items, and every
//! online player is saved on an interval and again when it leaves.
//!
//! The game-facing pieces you supply are a [`PlayerStore`] (where players
//! live), a [`Catalog`] (what items exist) and an [`Authenticator`] (who
//! may log in).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hearth::prelude::*;
//!
//! # async fn run() -> Result<(), HearthError> {
//! let store = Arc::new(MemoryStore::new());
//! let catalog = Arc::new(Catalog::default());
//! let auth = StaticTokens::new().with("secret", AccountId(1));
//!
//! let server = HearthServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(store, catalog, auth)
//!     .await?;
//! server.run().await
//! # }
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod config;
mod error;
mod handler;
pub mod logging;
mod registry;
mod server;

pub use auth::{Authenticator, StaticTokens};
pub use config::ServerConfig;
pub use error::{AuthError, HearthError};
pub use logging::init_logging;
pub use registry::PlayerRegistry;
pub use server::{HearthServer, HearthServerBuilder, OnlinePlayer, PROTOCOL_VERSION};

pub mod prelude {
    pub use crate::{
        AuthError, Authenticator, HearthError, HearthServer,
        HearthServerBuilder, PROTOCOL_VERSION, ServerConfig, StaticTokens,
        init_logging,
    };
    pub use hearth_data::{
        AccountRecord, Catalog, ItemIdAllocator, MemoryStore, PlayerRecord,
        PlayerStore, SecurityLevel, StartItemRule,
    };
    pub use hearth_player::PlayerConfig;
    pub use hearth_protocol::{
        AccountId, ClientMessage, Envelope, ItemNumber, Payload, ServerMessage,
    };
}
