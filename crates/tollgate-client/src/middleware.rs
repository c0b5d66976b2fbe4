use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tracing::info;

use tollgate_protocol::{DenialKind, ErrorBody, Verdict, IDENTITY_HEADER};

use crate::client::GateClient;

/// Request extension inserted once the ledger approved the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreditGrant {
    pub credits_remaining: u64,
}

/// Shared handle to the gate used by the middleware.
pub type SharedGate = Arc<dyn GateClient>;

/// Middleware stage: consult the ledger before the handler runs.
///
/// - No identity header, or one that is empty or all whitespace: `400`, the
///   ledger is not called. Any other value is forwarded unchanged.
/// - Approved: a [`CreditGrant`] is attached and the handler runs.
/// - Denied: the verdict's status and reason are returned unchanged and the
///   handler never runs.
pub async fn require_credit(State(gate): State<SharedGate>, mut request: Request, next: Next) -> Response {
    let identity = request
        .headers()
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned);

    let Some(identity) = identity else {
        let kind = DenialKind::MalformedRequest;
        return denial_response(kind, kind.reason().into());
    };

    match gate.check(&identity).await {
        Verdict::Approved { credits_remaining } => {
            request
                .extensions_mut()
                .insert(CreditGrant { credits_remaining });
            next.run(request).await
        }
        Verdict::Denied { kind, reason } => {
            info!(account = %identity, %kind, "request blocked by credit gate");
            denial_response(kind, reason)
        }
    }
}

/// Wrap every route of `router` with [`require_credit`].
pub fn gated<S>(router: Router<S>, gate: SharedGate) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(gate, require_credit))
}

fn denial_response(kind: DenialKind, reason: String) -> Response {
    (kind.status(), Json(ErrorBody::new(reason))).into_response()
}
