//! Wire contract for the tollgate credit ledger.
//!
//! Shared by the ledger's HTTP handler and by every downstream gate client,
//! so both sides agree on paths, the identity header, status codes, and the
//! reason strings carried in error bodies.

pub mod endpoint;
pub mod verdict;

pub use endpoint::{
    endpoints, CheckResponse, ErrorBody, HealthResponse, ReadyResponse, IDENTITY_HEADER,
};
pub use verdict::{reasons, DenialKind, Verdict};
