use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use tollgate_ledger::{Denial, Ledger, Outcome};
use tollgate_protocol::{
    reasons, CheckResponse, DenialKind, ErrorBody, HealthResponse, ReadyResponse, Verdict,
    IDENTITY_HEADER,
};
use tollgate_store::{AccountId, AccountStore};

use crate::error::{ServerError, ServerResult};

/// `POST /check`: deduct one credit for the caller named in the identity header.
///
/// The handler does not authenticate; it trusts the header as populated by
/// the upstream gateway. A missing or unusable header is rejected here and
/// never reaches the ledger.
pub async fn check_handler<S>(
    State(ledger): State<Arc<Ledger<S>>>,
    headers: HeaderMap,
) -> ServerResult<Response>
where
    S: AccountStore + 'static,
{
    let Some(id) = identity(&headers) else {
        warn!("check request without identity header");
        return Ok(verdict_response(Verdict::denied(DenialKind::MalformedRequest)));
    };

    // The critical section may fsync; keep it off the async workers.
    let outcome = tokio::task::spawn_blocking(move || ledger.consume(&id))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(verdict_response(verdict_for(outcome)))
}

/// `GET /healthz`: the process is up.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// `GET /readyz`: the account store answers a trivial read.
///
/// The probe waits on the same lock as `/check`, so it runs on the blocking
/// pool like the deduction does.
pub async fn ready_handler<S>(State(ledger): State<Arc<Ledger<S>>>) -> Response
where
    S: AccountStore + 'static,
{
    let probed = tokio::task::spawn_blocking(move || ledger.probe()).await;
    match probed {
        Ok(Ok(())) => Json(ReadyResponse::default()).into_response(),
        Ok(Err(e)) => {
            warn!(error = %e, "readiness probe failed");
            not_ready()
        }
        Err(e) => {
            warn!(error = %e, "readiness probe task failed");
            not_ready()
        }
    }
}

fn not_ready() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorBody::new(reasons::NOT_READY)),
    )
        .into_response()
}

/// Extract the identity from the request headers.
///
/// The value is passed through byte for byte; only a missing, non-UTF-8,
/// empty or all-whitespace header is refused.
fn identity(headers: &HeaderMap) -> Option<AccountId> {
    let raw = headers.get(IDENTITY_HEADER)?.to_str().ok()?;
    if raw.trim().is_empty() {
        None
    } else {
        Some(AccountId::new(raw))
    }
}

/// Translate a ledger decision into the wire verdict.
pub fn verdict_for(outcome: Outcome) -> Verdict {
    match outcome {
        Outcome::Approved { remaining } => Verdict::Approved {
            credits_remaining: remaining,
        },
        Outcome::Denied(Denial::NotConfigured) => Verdict::denied(DenialKind::NotConfigured),
        Outcome::Denied(Denial::Exhausted) => Verdict::denied(DenialKind::Exhausted),
    }
}

fn verdict_response(verdict: Verdict) -> Response {
    match verdict {
        Verdict::Approved { credits_remaining } => {
            Json(CheckResponse::ok(credits_remaining)).into_response()
        }
        Verdict::Denied { kind, reason } => {
            (kind.status(), Json(ErrorBody::new(reason))).into_response()
        }
    }
}
