use tollgate_store::StoreError;

/// Errors produced by ledger operations.
///
/// Denials are not errors: they are returned as [`Outcome::Denied`]. These
/// variants cover failures of the ledger itself.
///
/// [`Outcome::Denied`]: crate::Outcome::Denied
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The account store failed to read or commit.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A previous holder of the ledger lock panicked mid-operation.
    #[error("ledger lock poisoned")]
    Poisoned,
}

pub type LedgerResult<T> = Result<T, LedgerError>;
