use std::fmt;

use hyper::StatusCode;

/// Stable reason strings. These are the only detail that ever crosses the
/// wire on a denial.
pub mod reasons {
    pub const NOT_CONFIGURED: &str = "User not configured for credits.";
    pub const EXHAUSTED: &str = "Credit limit reached.";
    pub const MISSING_IDENTITY: &str = "Missing X-Consumer-Username header.";
    pub const DEPENDENCY_UNAVAILABLE: &str = "Credit service is currently unavailable.";
    pub const INTERNAL: &str = "Internal ledger error.";
    pub const NOT_READY: &str = "Store not ready.";
}

/// Classification of a refused request, each with a fixed status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DenialKind {
    /// Missing or malformed identity; rejected before the ledger is consulted.
    MalformedRequest,
    /// The caller is not entitled to the service at all.
    NotConfigured,
    /// The caller's quota is used up.
    Exhausted,
    /// The ledger could not be reached or answered nonsense. Fail closed.
    DependencyUnavailable,
}

impl DenialKind {
    pub fn status(self) -> StatusCode {
        match self {
            Self::MalformedRequest => StatusCode::BAD_REQUEST,
            Self::NotConfigured => StatusCode::FORBIDDEN,
            Self::Exhausted => StatusCode::TOO_MANY_REQUESTS,
            Self::DependencyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// The canonical reason for this kind.
    pub fn reason(self) -> &'static str {
        match self {
            Self::MalformedRequest => reasons::MISSING_IDENTITY,
            Self::NotConfigured => reasons::NOT_CONFIGURED,
            Self::Exhausted => reasons::EXHAUSTED,
            Self::DependencyUnavailable => reasons::DEPENDENCY_UNAVAILABLE,
        }
    }

    /// Inverse of [`status`](Self::status) for the statuses a ledger may
    /// legitimately deny with. `503` is deliberately absent: a ledger that
    /// answers 503 is treated like any other unavailable dependency.
    pub fn from_ledger_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::BAD_REQUEST => Some(Self::MalformedRequest),
            StatusCode::FORBIDDEN => Some(Self::NotConfigured),
            StatusCode::TOO_MANY_REQUESTS => Some(Self::Exhausted),
            _ => None,
        }
    }
}

impl fmt::Display for DenialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRequest => f.write_str("malformed-request"),
            Self::NotConfigured => f.write_str("not-configured"),
            Self::Exhausted => f.write_str("exhausted"),
            Self::DependencyUnavailable => f.write_str("dependency-unavailable"),
        }
    }
}

/// The standardized outcome handed back to a caller, passed by value from
/// the ledger through each gate client to the end user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Approved { credits_remaining: u64 },
    Denied { kind: DenialKind, reason: String },
}

impl Verdict {
    /// A denial carrying the canonical reason for `kind`.
    pub fn denied(kind: DenialKind) -> Self {
        Self::Denied {
            kind,
            reason: kind.reason().into(),
        }
    }

    pub fn dependency_unavailable() -> Self {
        Self::denied(DenialKind::DependencyUnavailable)
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Approved { .. } => StatusCode::OK,
            Self::Denied { kind, .. } => kind.status(),
        }
    }

    pub fn kind(&self) -> Option<DenialKind> {
        match self {
            Self::Approved { .. } => None,
            Self::Denied { kind, .. } => Some(*kind),
        }
    }
}
