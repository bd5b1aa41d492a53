//! Per-connection handler: login, account handshake, and message loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `Login` → check version, authenticate token → `AccountId`
//!   2. Load account and player, send `LoginAck`
//!   3. Build and initialize the player, register it as online
//!   4. Send the account-information handshake
//!   5. Loop: heartbeats until logout, close, or idle timeout
//!   6. Save and close; once a save has succeeded, unregister and fire
//!      disconnect

use std::sync::Arc;

use hearth_data::{AccountRecord, PlayerRecord, PlayerStore};
use hearth_player::{ClientSession, SessionError, unix_millis};
use hearth_protocol::{AccountId, ClientMessage, ProtocolError, ServerMessage};
use hearth_transport::{Connection, WebSocketConnection};
use tracing::Instrument;

use crate::server::{
    OnlinePlayer, PROTOCOL_VERSION, ServerState, complete_departure,
};
use crate::{Authenticator, HearthError};

type Session = ClientSession<WebSocketConnection>;

/// Tears the player down when the handler exits, however it exits.
///
/// The player is marked departing and saved. If that save fails it stays
/// registered: logins for the account keep getting 409 and the autosave
/// loop retries until a save succeeds, which unregisters it. `Drop` is
/// synchronous and saving is not, so the teardown runs on a spawned task.
struct OnlineGuard<S: PlayerStore, A: Authenticator> {
    player: Arc<OnlinePlayer<S>>,
    state: Arc<ServerState<S, A>>,
}

impl<S: PlayerStore, A: Authenticator> Drop for OnlineGuard<S, A> {
    fn drop(&mut self) {
        let player = Arc::clone(&self.player);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let account_id = player.account_id();
            state.registry.mark_departing(account_id);
            match player.save(state.store()).await {
                Ok(()) => complete_departure(&state, account_id),
                Err(e) => tracing::warn!(
                    %account_id,
                    error = %e,
                    "final save failed, keeping player for autosave"
                ),
            }
            let _ = player.session().close().await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, A>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, A>>,
) -> Result<(), HearthError>
where
    S: PlayerStore,
    A: Authenticator,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");
    let session = Arc::new(ClientSession::new(conn));

    // --- Step 1: Login ---
    let account_id = perform_login(&session, &state).await?;
    tracing::info!(%conn_id, %account_id, "account authenticated");

    // --- Step 2: Load ---
    let account = match state.store().load_account(account_id).await? {
        Some(account) => account,
        None => {
            send_error(&session, 404, "unknown account").await?;
            return Err(HearthError::UnknownAccount(account_id));
        }
    };

    // A registered player, departing or not, may hold state newer than
    // storage. Don't read the rows until it is gone.
    if let Some(existing) = state.registry.get(account_id) {
        tracing::info!(%account_id, existing = %existing.session().id(), "duplicate login rejected");
        send_error(&session, 409, "account already online").await?;
        return Err(HearthError::AlreadyOnline(account_id));
    }
    let record = load_or_create_player(state.store(), account_id).await?;

    session
        .send(ServerMessage::LoginAck {
            account_id,
            session_key: session.session_key().to_owned(),
            server_time: unix_millis(),
        })
        .await?;

    // --- Step 3: Bring the player online ---
    let player = Arc::new(build_player(&state, Arc::clone(&session), account, &record));
    if let Err(e) = state.registry.register(account_id, Arc::clone(&player)) {
        send_error(&session, 409, "account already online").await?;
        return Err(e);
    }
    let _guard = OnlineGuard {
        player: Arc::clone(&player),
        state: Arc::clone(&state),
    };

    // --- Step 4: Account handshake ---
    player.send_account_information().await?;

    // --- Step 5: Message loop ---
    message_loop(&player, &state).instrument(player.span()).await

    // _guard drops here → save, close, then unregister and disconnect.
}

fn build_player<S: PlayerStore, A: Authenticator>(
    state: &ServerState<S, A>,
    session: Arc<Session>,
    account: AccountRecord,
    record: &PlayerRecord,
) -> OnlinePlayer<S> {
    let mut player = state.factory.create();
    player.initialize(session, account, record);
    player
}

/// Loads the persisted player, creating an empty one on first login.
async fn load_or_create_player<S: PlayerStore>(
    store: &S,
    account_id: AccountId,
) -> Result<PlayerRecord, HearthError> {
    if let Some(record) = store.load_player(account_id).await? {
        return Ok(record);
    }
    let record = PlayerRecord::new(account_id);
    store.update_player(&record.row()).await?;
    tracing::info!(%account_id, "created player record");
    Ok(record)
}

/// Receives `Login`, checks the version, and authenticates the token.
async fn perform_login<S, A>(
    session: &Session,
    state: &ServerState<S, A>,
) -> Result<AccountId, HearthError>
where
    S: PlayerStore,
    A: Authenticator,
{
    let first = match tokio::time::timeout(
        state.config.login_timeout(),
        session.recv(),
    )
    .await
    {
        Ok(Ok(Some(message))) => message,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before login".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(
                ProtocolError::InvalidMessage("login timed out".into()).into()
            );
        }
    };

    let ClientMessage::Login { version, token } = first else {
        send_error(session, 400, "expected Login").await?;
        return Err(ProtocolError::InvalidMessage(
            "first message must be Login".into(),
        )
        .into());
    };

    if version != PROTOCOL_VERSION {
        send_error(
            session,
            400,
            &format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        )
        .await?;
        return Err(ProtocolError::InvalidMessage(
            "protocol version mismatch".into(),
        )
        .into());
    }

    let token = token.as_deref().unwrap_or("");
    match state.auth.authenticate(token).await {
        Ok(account_id) => Ok(account_id),
        Err(e) => {
            send_error(session, 401, "unauthorized").await?;
            Err(e.into())
        }
    }
}

/// Serves a logged-in player until it leaves or goes quiet.
async fn message_loop<S, A>(
    player: &OnlinePlayer<S>,
    state: &ServerState<S, A>,
) -> Result<(), HearthError>
where
    S: PlayerStore,
    A: Authenticator,
{
    let session = player.session();
    loop {
        let message = match tokio::time::timeout(
            state.config.idle_timeout(),
            session.recv(),
        )
        .await
        {
            Ok(Ok(Some(message))) => message,
            Ok(Ok(None)) => {
                tracing::info!("connection closed cleanly");
                break;
            }
            Ok(Err(SessionError::Protocol(e))) => {
                tracing::debug!(error = %e, "ignoring undecodable message");
                continue;
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!("connection timed out");
                break;
            }
        };

        match message {
            ClientMessage::Heartbeat { client_time } => {
                session
                    .send(ServerMessage::HeartbeatAck {
                        client_time,
                        server_time: unix_millis(),
                    })
                    .await?;
            }
            ClientMessage::Logout { reason } => {
                tracing::info!(%reason, "client logged out");
                break;
            }
            ClientMessage::Login { .. } => {
                send_error(session, 400, "already logged in").await?;
            }
        }
    }
    Ok(())
}

/// Sends a `ServerMessage::Error` to the client.
async fn send_error(
    session: &Session,
    code: u16,
    message: &str,
) -> Result<(), HearthError> {
    session
        .send(ServerMessage::Error {
            code,
            message: message.to_string(),
        })
        .await?;
    Ok(())
}
