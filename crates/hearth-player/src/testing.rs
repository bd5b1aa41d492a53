//! Test doubles shared by the unit tests in this crate.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use hearth_data::{
    AccountRecord, Catalog, CatalogItem, CharacterRecord, EffectVariant,
    ItemCategory, ItemIdAllocator, ItemRecord, LevelEntry, LicenseRecord,
    MemoryStore, PlayerRecord, PlayerRow, PlayerStore, PriceVariant,
    SecurityLevel, StartItemRule, StoreError,
};
use hearth_protocol::{
    AccountId, Codec, Envelope, ItemNumber, JsonCodec, Payload, PeriodType,
    PriceType, ServerMessage,
};
use hearth_transport::{Connection, ConnectionId, TransportError};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{ClientSession, Player, PlayerConfig};

pub const WEAPON: ItemNumber = ItemNumber(1010101);
pub const CONSUMABLE: ItemNumber = ItemNumber(4000001);

// ---------------------------------------------------------------------------
// RecordingConnection
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Wire {
    sent: Vec<Vec<u8>>,
    incoming: VecDeque<Vec<u8>>,
}

/// A [`Connection`] that keeps everything sent to it.
#[derive(Clone)]
pub struct RecordingConnection {
    id: ConnectionId,
    wire: Arc<Mutex<Wire>>,
    fail: Arc<AtomicBool>,
    fail_after: Arc<AtomicUsize>,
}

impl RecordingConnection {
    pub fn new(id: u64) -> Self {
        Self {
            id: ConnectionId::new(id),
            wire: Arc::default(),
            fail: Arc::default(),
            fail_after: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Lets `n` more sends through, then fails every later one.
    pub fn fail_sends_after(&self, n: usize) {
        let sent = self.wire.lock().sent.len();
        self.fail_after.store(sent + n, Ordering::SeqCst);
    }

    pub fn push_incoming(&self, envelope: &Envelope) {
        let bytes = JsonCodec.encode(envelope).unwrap();
        self.wire.lock().incoming.push_back(bytes);
    }

    pub fn envelopes(&self) -> Vec<Envelope> {
        self.wire
            .lock()
            .sent
            .iter()
            .map(|bytes| JsonCodec.decode(bytes).unwrap())
            .collect()
    }

    pub fn messages(&self) -> Vec<ServerMessage> {
        self.envelopes()
            .into_iter()
            .map(|e| match e.payload {
                Payload::Server(message) => message,
                Payload::Client(other) => panic!("server sent {other:?}"),
            })
            .collect()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.messages().iter().map(ServerMessage::kind).collect()
    }
}

impl Connection for RecordingConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut wire = self.wire.lock();
        if self.fail.load(Ordering::SeqCst)
            || wire.sent.len() >= self.fail_after.load(Ordering::SeqCst)
        {
            return Err(TransportError::Closed(self.id));
        }
        wire.sent.push(data.to_vec());
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.wire.lock().incoming.pop_front())
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        None
    }
}

// ---------------------------------------------------------------------------
// TestStore
// ---------------------------------------------------------------------------

/// A [`MemoryStore`] whose writes can be made to fail or to pause.
#[derive(Default)]
pub struct TestStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    fail_start_items: AtomicBool,
    start_item_queries: AtomicUsize,
    gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_items(rules: Vec<StartItemRule>) -> Self {
        Self {
            inner: MemoryStore::with_start_items(rules),
            ..Self::default()
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_start_items(&self, fail: bool) {
        self.fail_start_items.store(fail, Ordering::SeqCst);
    }

    pub fn start_item_queries(&self) -> usize {
        self.start_item_queries.load(Ordering::SeqCst)
    }

    pub fn player_writes(&self) -> usize {
        self.inner.player_writes()
    }

    /// Makes the next `update_player` signal `entered` and wait for
    /// `release` before writing.
    pub fn gate_writes(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.gate.lock() = Some((Arc::clone(&entered), Arc::clone(&release)));
        (entered, release)
    }

    pub async fn insert_player(&self, record: PlayerRecord) {
        self.inner.insert_player(record).await;
    }

    pub async fn stored(&self, id: AccountId) -> PlayerRecord {
        self.inner.player(id).await.expect("player stored")
    }

    fn check_write(&self, account: AccountId) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected {
                account,
                reason: "test".into(),
            });
        }
        Ok(())
    }
}

impl PlayerStore for TestStore {
    async fn load_account(
        &self,
        id: AccountId,
    ) -> Result<Option<AccountRecord>, StoreError> {
        self.inner.load_account(id).await
    }

    async fn load_player(
        &self,
        id: AccountId,
    ) -> Result<Option<PlayerRecord>, StoreError> {
        self.inner.load_player(id).await
    }

    async fn start_items(
        &self,
        level: SecurityLevel,
    ) -> Result<Vec<StartItemRule>, StoreError> {
        self.start_item_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_start_items.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("test".into()));
        }
        self.inner.start_items(level).await
    }

    async fn update_player(&self, row: &PlayerRow) -> Result<(), StoreError> {
        let gate = self.gate.lock().take();
        if let Some((entered, release)) = gate {
            entered.notify_one();
            release.notified().await;
        }
        self.check_write(row.account_id)?;
        self.inner.update_player(row).await
    }

    async fn save_characters(
        &self,
        account: AccountId,
        current_slot: u8,
        characters: &[CharacterRecord],
    ) -> Result<(), StoreError> {
        self.check_write(account)?;
        self.inner
            .save_characters(account, current_slot, characters)
            .await
    }

    async fn save_licenses(
        &self,
        account: AccountId,
        licenses: &[LicenseRecord],
    ) -> Result<(), StoreError> {
        self.check_write(account)?;
        self.inner.save_licenses(account, licenses).await
    }

    async fn save_items(
        &self,
        account: AccountId,
        items: &[ItemRecord],
    ) -> Result<(), StoreError> {
        self.check_write(account)?;
        self.inner.save_items(account, items).await
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A weapon (color group 3, one effect), a consumable, and three levels.
pub fn catalog() -> Catalog {
    let price = |period_type, period| PriceVariant {
        id: 1,
        price_type: PriceType::Pen,
        period_type,
        period,
        price: 100,
    };
    Catalog::new(
        vec![
            CatalogItem {
                number: WEAPON,
                category: ItemCategory::Weapon,
                color_group: 3,
                prices: vec![price(PeriodType::None, 0)],
                effects: vec![EffectVariant {
                    id: 1,
                    effect: 1203,
                }],
            },
            CatalogItem {
                number: CONSUMABLE,
                category: ItemCategory::OneTimeUse,
                color_group: 0,
                prices: vec![price(PeriodType::Units, 1)],
                effects: vec![],
            },
        ],
        vec![
            LevelEntry {
                level: 0,
                total_experience: 0,
            },
            LevelEntry {
                level: 1,
                total_experience: 40,
            },
            LevelEntry {
                level: 2,
                total_experience: 100,
            },
        ],
    )
    .unwrap()
}

pub fn account() -> AccountRecord {
    AccountRecord {
        id: AccountId(1),
        nickname: "alice".into(),
        security_level: SecurityLevel::USER,
    }
}

fn start_rules() -> Vec<StartItemRule> {
    vec![
        StartItemRule {
            item_number: WEAPON,
            price_id: 1,
            effect_id: 1,
            color: 0,
            count: 0,
            required_security_level: SecurityLevel::USER,
        },
        StartItemRule {
            item_number: CONSUMABLE,
            price_id: 1,
            effect_id: 0,
            color: 0,
            count: 3,
            required_security_level: SecurityLevel::USER,
        },
    ]
}

pub fn new_player(
    store: Arc<TestStore>,
    config: PlayerConfig,
) -> Player<TestStore, RecordingConnection> {
    Player::new(
        Arc::new(config),
        Arc::new(catalog()),
        store,
        Arc::new(ItemIdAllocator::new(1000)),
    )
}

pub struct TestPlayer {
    pub player: Arc<Player<TestStore, RecordingConnection>>,
    pub conn: RecordingConnection,
    pub store: Arc<TestStore>,
}

/// An initialized player whose record is also in the store.
pub async fn test_player(config: PlayerConfig, record: PlayerRecord) -> TestPlayer {
    let store = Arc::new(TestStore::with_start_items(start_rules()));
    store.insert_player(record.clone()).await;
    let conn = RecordingConnection::new(1);
    let session = Arc::new(ClientSession::new(conn.clone()));

    let mut player = new_player(Arc::clone(&store), config);
    player.initialize(session, account(), &record);

    TestPlayer {
        player: Arc::new(player),
        conn,
        store,
    }
}

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber that records INFO and above, and returns
/// what was logged.
pub fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}
