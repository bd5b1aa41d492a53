//! The player core of Hearth.
//!
//! Everything that happens to one logged-in account lives here:
//!
//! 1. **State** — the [`Player`] aggregate: progress and balances in
//!    change-[`Tracked`] fields, plus the [`CharacterManager`],
//!    [`LicenseManager`] and [`Inventory`] sub-managers.
//! 2. **Login handshake** — [`Player::send_account_information`] pushes the
//!    account to the client in the fixed order the client expects.
//! 3. **Start items** — an empty inventory is seeded from storage rules,
//!    repairing whatever the rules got wrong ([`grant_start_items`]).
//! 4. **Persistence** — [`Player::save`] writes only what changed and keeps
//!    anything that failed to write dirty for the next attempt.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server layer (above)    ← accepts connections, authenticates, autosaves
//!     ↕
//! Player core (this crate) ← aggregate, handshake, provisioning, save
//!     ↕
//! Data / Protocol / Transport (below)
//! ```

#![allow(async_fn_in_trait)]

mod character;
mod config;
mod error;
mod events;
mod factory;
mod handshake;
mod inventory;
mod license;
mod player;
mod provisioning;
mod session;
mod tracked;

#[cfg(test)]
mod testing;

pub use character::{Character, CharacterManager, CharacterStyle};
pub use config::PlayerConfig;
pub use error::{CharacterError, PlayerError, SessionError};
pub use events::{DisconnectListeners, PlayerDisconnected};
pub use factory::PlayerFactory;
pub use inventory::{Inventory, PlayerItem};
pub use license::LicenseManager;
pub use player::Player;
pub use provisioning::grant_start_items;
pub use session::{ClientSession, unix_millis};
pub use tracked::{ChangeTracker, Revision, Tracked};
