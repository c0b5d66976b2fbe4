use thiserror::Error;

/// Errors constructing a gate client. Checking never errors: every failure
/// at request time becomes a fail-closed verdict instead.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid ledger URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
