//! Downstream gate client for the tollgate credit ledger.
//!
//! Every metered service calls the ledger once per request before doing any
//! work. This crate packages that pattern:
//!
//! - [`GateClient`] -- the check call, as a trait so services can inject doubles
//! - [`HttpGateClient`] -- the production client over HTTP
//! - [`require_credit`] / [`gated`] -- an axum middleware stage that runs the
//!   check and short-circuits the request pipeline on denial
//!
//! The policy is fail-closed: if the ledger cannot be reached, times out, or
//! answers with something unparseable, the request is refused with `503`.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::{routing::post, Extension, Router};
//! use tollgate_client::{gated, CreditGrant, GateClientConfig, HttpGateClient};
//!
//! let gate = HttpGateClient::new(&GateClientConfig::from_env()).unwrap();
//! let app: Router = gated(
//!     Router::new().route("/generate", post(|Extension(grant): Extension<CreditGrant>| async move {
//!         format!("{} credits left", grant.credits_remaining)
//!     })),
//!     Arc::new(gate),
//! );
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod middleware;

pub use client::{GateClient, HttpGateClient};
pub use config::{GateClientConfig, LEDGER_URL_ENV};
pub use error::{ClientError, ClientResult};
pub use middleware::{gated, require_credit, CreditGrant, SharedGate};
