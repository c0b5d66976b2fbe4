//! HTTP server for the tollgate credit ledger.
//!
//! Exposes the ledger's check-and-deduct over `POST /check`, translating
//! ledger outcomes into the standard verdict codes, plus the `/healthz` and
//! `/readyz` probes used by orchestration.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::{ServerConfig, StoreConfig};
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::{run, DynLedger, LedgerServer};
