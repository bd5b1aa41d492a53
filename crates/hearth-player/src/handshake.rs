//! The login synchronization handshake.
//!
//! After a player is initialized the client knows nothing about it yet.
//! [`Player::send_account_information`] pushes the full account state in the
//! one order the client accepts:
//!
//! ```text
//!  1. LicenseList
//!  2. Inventory
//!  3. CharacterSlotInfo
//!  4. CharacterOpened + CharacterEquip   (per character, by slot)
//!  5. CashUpdate, CoinUpdate
//!  6. ServerResult(Welcome)
//!  7. BeginAccountInfo
//!  8. ServerResult(WelcomeReady)
//!  9. start-item provisioning            (empty inventory only)
//! ```
//!
//! The client is a state machine keyed on this sequence. Reordering it, or
//! merging the two `ServerResult`s, leaves the client stuck on the loading
//! screen.

use std::sync::atomic::{AtomicBool, Ordering};

use hearth_data::PlayerStore;
use hearth_protocol::{
    ItemId, LICENSE_COUNT, MAX_CHARACTER_SLOTS, ResultCode, ServerMessage,
    TUTORIAL_COMPLETE,
};
use hearth_transport::Connection;
use tracing::Instrument;

use crate::{Character, Player, PlayerError, PlayerItem};

/// Every license id the client knows, i.e. "all licenses complete".
const ALL_LICENSES: [u8; LICENSE_COUNT] = {
    let mut ids = [0u8; LICENSE_COUNT];
    let mut i = 0;
    while i < LICENSE_COUNT {
        ids[i] = i as u8;
        i += 1;
    }
    ids
};

/// Clears the in-progress flag however the handshake ends.
struct HandshakeGuard<'a>(&'a AtomicBool);

impl<'a> HandshakeGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for HandshakeGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn item_id_or_zero(id: Option<ItemId>) -> u64 {
    id.map_or(0, |id| id.0)
}

fn equip_message(character: &Character) -> ServerMessage {
    ServerMessage::CharacterEquip {
        slot: character.slot(),
        weapons: character.weapons().iter().copied().map(item_id_or_zero).collect(),
        skills: vec![item_id_or_zero(character.skill())],
        costumes: character
            .costumes()
            .iter()
            .copied()
            .map(item_id_or_zero)
            .collect(),
    }
}

impl<S: PlayerStore, T: Connection> Player<S, T> {
    /// Sends the client everything it needs to show the lobby, then grants
    /// start items if the inventory is empty.
    ///
    /// Each message is handed to the session only after the previous one
    /// was accepted.
    ///
    /// # Errors
    /// - [`PlayerError::HandshakeInProgress`] if another call on this player
    ///   hasn't finished
    /// - [`PlayerError::Session`] if a send fails; messages already sent
    ///   stay sent and the caller should drop the connection
    /// - [`PlayerError::Store`] if the start-item query fails
    pub async fn send_account_information(&self) -> Result<(), PlayerError> {
        let Some(_guard) = HandshakeGuard::acquire(self.handshake_flag()) else {
            return Err(PlayerError::HandshakeInProgress);
        };
        self.run_handshake().instrument(self.span()).await
    }

    /// The license list for step 1.
    pub async fn license_list(&self) -> Vec<u8> {
        if self.config().enable_license_requirement {
            self.licenses().await.iter().map(|l| l.0).collect()
        } else {
            ALL_LICENSES.to_vec()
        }
    }

    async fn run_handshake(&self) -> Result<(), PlayerError> {
        let session = self.session();

        let licenses = self.license_list().await;
        session.send(ServerMessage::LicenseList { licenses }).await?;

        let items = self.inventory().await.iter().map(PlayerItem::to_dto).collect();
        session.send(ServerMessage::Inventory { items }).await?;

        let (active_slot, characters) = {
            let characters = self.characters().await;
            (
                characters.current_slot(),
                characters.iter().cloned().collect::<Vec<_>>(),
            )
        };
        session
            .send(ServerMessage::CharacterSlotInfo {
                active_slot,
                character_count: characters.len() as u8,
                max_slots: MAX_CHARACTER_SLOTS,
            })
            .await?;
        for character in &characters {
            session
                .send(ServerMessage::CharacterOpened {
                    slot: character.slot(),
                    style: character.style().into(),
                })
                .await?;
            session.send(equip_message(character)).await?;
        }

        session
            .send(ServerMessage::CashUpdate {
                pen: self.pen(),
                ap: self.ap(),
            })
            .await?;
        session
            .send(ServerMessage::CoinUpdate {
                coins1: self.coins1(),
                coins2: self.coins2(),
            })
            .await?;

        session
            .send(ServerMessage::ServerResult {
                code: ResultCode::Welcome,
            })
            .await?;

        let tutorial_state = if self.config().enable_tutorial {
            self.tutorial_state()
        } else {
            TUTORIAL_COMPLETE
        };
        session
            .send(ServerMessage::BeginAccountInfo {
                level: self.level(),
                total_experience: self.total_experience(),
                pen: self.pen(),
                ap: self.ap(),
                tutorial_state,
                nickname: self.nickname().to_owned(),
            })
            .await?;

        session
            .send(ServerMessage::ServerResult {
                code: ResultCode::WelcomeReady,
            })
            .await?;
        tracing::debug!(characters = characters.len(), "account information sent");

        let mut inventory = self.inventory().await;
        if inventory.is_empty() {
            self.provision_start_items(&mut inventory).await?;
        }
        Ok(())
    }
}
