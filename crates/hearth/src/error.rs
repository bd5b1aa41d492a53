//! Unified error type for the Hearth server.

use hearth_data::{CatalogError, StoreError};
use hearth_player::{PlayerError, SessionError};
use hearth_protocol::{AccountId, ProtocolError};
use hearth_transport::TransportError;

/// Why an [`Authenticator`](crate::Authenticator) refused a login.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The client didn't send a token at all.
    #[error("missing login token")]
    MissingToken,

    /// The token was malformed, expired, or unknown.
    #[error("invalid login token: {0}")]
    InvalidToken(String),
}

/// Top-level error that wraps every layer's errors.
///
/// `#[from]` on each variant lets `?` lift sub-crate errors without
/// ceremony.
#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Player(#[from] PlayerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The token was valid but no account row exists for it.
    #[error("no account {0}")]
    UnknownAccount(AccountId),

    /// The account is already logged in on another connection.
    #[error("account {0} is already online")]
    AlreadyOnline(AccountId),
}
