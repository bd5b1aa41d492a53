//! Authentication hook for validating a client's login token.
//!
//! Hearth doesn't decide who may log in. It defines [`Authenticator`]: one
//! async method from a token to an [`AccountId`]. The login handler calls it
//! with whatever the client put in `ClientMessage::Login`.

use std::collections::HashMap;

use hearth_protocol::AccountId;

use crate::AuthError;

/// Validates a client's login token and returns the account it belongs to.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// connection task for the life of the server.
///
/// # Example
///
/// ```rust
/// use hearth::{AuthError, Authenticator};
/// use hearth_protocol::AccountId;
///
/// /// Uses the token as the account id. Development only.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<AccountId, AuthError> {
///         token
///             .parse()
///             .map(AccountId)
///             .map_err(|_| AuthError::InvalidToken("token must be a number".into()))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<AccountId, AuthError>> + Send;
}

/// An [`Authenticator`] backed by a fixed token table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, AccountId>,
}

impl StaticTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token. Builder-style.
    pub fn with(mut self, token: impl Into<String>, account: AccountId) -> Self {
        self.tokens.insert(token.into(), account);
        self
    }
}

impl Authenticator for StaticTokens {
    async fn authenticate(&self, token: &str) -> Result<AccountId, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        self.tokens
            .get(token)
            .copied()
            .ok_or_else(|| AuthError::InvalidToken("unknown token".into()))
    }
}
