use serde::{Deserialize, Serialize};

/// Header carrying the caller's authenticated identity. Populated by the
/// upstream API gateway's key-auth plugin; forwarded verbatim by downstream
/// services.
pub const IDENTITY_HEADER: &str = "x-consumer-username";

/// HTTP endpoint paths exposed by the ledger.
pub mod endpoints {
    pub const CHECK: &str = "/check";
    pub const HEALTHZ: &str = "/healthz";
    pub const READYZ: &str = "/readyz";
}

/// Body of a successful `/check`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub status: String,
    pub credits_remaining: u64,
}

impl CheckResponse {
    pub fn ok(credits_remaining: u64) -> Self {
        Self {
            status: "ok".into(),
            credits_remaining,
        }
    }
}

/// Body of every non-2xx response: a short, stable reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Liveness response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}

/// Readiness response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
}

impl Default for ReadyResponse {
    fn default() -> Self {
        Self {
            status: "ready".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_response_shape() {
        let json = serde_json::to_value(CheckResponse::ok(4)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "ok", "credits_remaining": 4}));
    }

    #[test]
    fn probe_defaults() {
        assert_eq!(HealthResponse::default().status, "ok");
        assert_eq!(ReadyResponse::default().status, "ready");
    }

    #[test]
    fn error_body_parses_foreign_json() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":"Credit limit reached.","extra":1}"#).unwrap();
        assert_eq!(body.detail, "Credit limit reached.");
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(endpoints::CHECK, "/check");
        assert_eq!(endpoints::HEALTHZ, "/healthz");
        assert_eq!(endpoints::READYZ, "/readyz");
    }
}
