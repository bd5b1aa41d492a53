//! Error types for the data layer.

use hearth_protocol::AccountId;

/// Errors a [`PlayerStore`](crate::PlayerStore) can return.
///
/// Every store operation is fallible: the backing engine may be down,
/// a row may be missing, or a write may be rejected.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No player row exists for this account.
    #[error("no player record for account {0}")]
    NotFound(AccountId),

    /// The storage backend could not be reached or refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The backend accepted the request but the write did not apply.
    #[error("write rejected for account {account}: {reason}")]
    WriteRejected { account: AccountId, reason: String },
}

/// Errors raised while loading catalog data.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog document is not valid JSON or has the wrong shape.
    #[error("catalog parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two catalog entries share one item number.
    #[error("duplicate catalog item {0}")]
    DuplicateItem(hearth_protocol::ItemNumber),
}
