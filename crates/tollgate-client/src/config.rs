use std::time::Duration;

use serde::{Deserialize, Serialize};
use tollgate_protocol::endpoints;

/// Environment variable naming the ledger location.
pub const LEDGER_URL_ENV: &str = "CREDIT_SERVICE_URL";

/// How a downstream service reaches the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateClientConfig {
    /// Base URL of the ledger service, e.g. `http://credit-service`.
    pub ledger_url: String,
    /// Upper bound on a single `/check` round trip. Exceeding it fails closed.
    pub timeout_ms: u64,
}

impl Default for GateClientConfig {
    fn default() -> Self {
        Self {
            ledger_url: "http://credit-service".into(),
            timeout_ms: 5_000,
        }
    }
}

impl GateClientConfig {
    pub fn new(ledger_url: impl Into<String>) -> Self {
        Self {
            ledger_url: ledger_url.into(),
            ..Self::default()
        }
    }

    /// Defaults, with `ledger_url` taken from `CREDIT_SERVICE_URL` when set.
    pub fn from_env() -> Self {
        match std::env::var(LEDGER_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Full URL of the check endpoint. Accepts a base URL or one that
    /// already ends in `/check`.
    pub fn check_url(&self) -> String {
        let base = self.ledger_url.trim().trim_end_matches('/');
        let base = base.strip_suffix(endpoints::CHECK).unwrap_or(base);
        format!("{base}{}", endpoints::CHECK)
    }
}
