use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use tollgate_ledger::Ledger;
use tollgate_protocol::endpoints;
use tollgate_store::AccountStore;

use crate::handler;

/// Build the axum router with all ledger endpoints over a shared ledger.
pub fn build_router<S>(ledger: Arc<Ledger<S>>) -> Router
where
    S: AccountStore + 'static,
{
    Router::new()
        .route(endpoints::CHECK, post(handler::check_handler::<S>))
        .route(endpoints::HEALTHZ, get(handler::health_handler))
        .route(endpoints::READYZ, get(handler::ready_handler::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(ledger)
}
