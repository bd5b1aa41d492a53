//! A local login server for poking at the client.
//!
//! Two accounts exist: token `1` logs in as `alice` (a fresh player who
//! gets start items), token `2` as `gm` (a game master who gets more).
//! Any other token is refused.

use std::sync::Arc;
use std::time::Duration;

use hearth::prelude::*;

const CATALOG: &str = r#"{
    "items": [
        {
            "number": 1010101,
            "category": "Weapon",
            "color_group": 3,
            "prices": [{ "id": 1, "price_type": "Pen", "period_type": "None", "period": 0, "price": 500 }],
            "effects": [{ "id": 1, "effect": 1203 }]
        },
        {
            "number": 2010101,
            "category": "Costume",
            "color_group": 1,
            "prices": [{ "id": 1, "price_type": "Ap", "period_type": "Days", "period": 7, "price": 300 }]
        },
        {
            "number": 4000001,
            "category": "OneTimeUse",
            "color_group": 0,
            "prices": [{ "id": 1, "price_type": "Pen", "period_type": "Units", "period": 1, "price": 50 }]
        }
    ],
    "levels": [
        { "level": 0, "total_experience": 0 },
        { "level": 1, "total_experience": 1000 },
        { "level": 2, "total_experience": 3000 }
    ]
}"#;

/// Uses the token as the account id. Development only.
struct DevAuthenticator;

impl Authenticator for DevAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<AccountId, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        token
            .parse()
            .map(AccountId)
            .map_err(|_| AuthError::InvalidToken(token.to_string()))
    }
}

fn rule(number: u32, count: i32, level: SecurityLevel) -> StartItemRule {
    StartItemRule {
        item_number: ItemNumber(number),
        price_id: 1,
        effect_id: 1,
        color: 0,
        count,
        required_security_level: level,
    }
}

#[tokio::main]
async fn main() -> Result<(), HearthError> {
    init_logging();

    let catalog = Arc::new(Catalog::from_json(CATALOG)?);
    let store = Arc::new(MemoryStore::with_start_items(vec![
        rule(1010101, 0, SecurityLevel::USER),
        rule(4000001, 5, SecurityLevel::USER),
        rule(2010101, 0, SecurityLevel::GAME_MASTER),
    ]));
    store
        .insert_account(AccountRecord {
            id: AccountId(1),
            nickname: "alice".into(),
            security_level: SecurityLevel::USER,
        })
        .await;
    store
        .insert_account(AccountRecord {
            id: AccountId(2),
            nickname: "gm".into(),
            security_level: SecurityLevel::GAME_MASTER,
        })
        .await;
    let item_ids = Arc::new(ItemIdAllocator::after(store.max_item_id().await));

    let server = HearthServerBuilder::new()
        .bind("127.0.0.1:8080")
        .player_config(PlayerConfig {
            enable_license_requirement: false,
            enable_tutorial: true,
        })
        .autosave_interval(Duration::from_secs(30))
        .item_ids(item_ids)
        .build(store, catalog, DevAuthenticator)
        .await?;

    tracing::info!(addr = ?server.local_addr().ok(), "sandbox listening");
    server.run().await
}
