use crate::account::AccountId;

/// Errors from account store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The account has never been provisioned.
    #[error("account not found: {0}")]
    NotFound(AccountId),

    /// A deduction was attempted on an account with no credits left.
    #[error("balance underflow for account {0}")]
    Underflow(AccountId),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A log record refers to state that does not exist.
    #[error("corrupt log at offset {offset}: {reason}")]
    CorruptLog { offset: u64, reason: String },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
