use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use tollgate_protocol::{CheckResponse, DenialKind, ErrorBody, Verdict, IDENTITY_HEADER};

use crate::config::GateClientConfig;
use crate::error::{ClientError, ClientResult};

/// Something that can ask the ledger for one credit.
///
/// `check` is infallible by signature: an implementation that cannot obtain
/// an authoritative answer must return a `DependencyUnavailable` denial,
/// never an approval.
#[async_trait]
pub trait GateClient: Send + Sync {
    async fn check(&self, identity: &str) -> Verdict;
}

/// Gate client that calls the ledger's `/check` over HTTP.
///
/// One synchronous round trip per request, bounded by the configured
/// timeout, no retries. Ledger denials (400, 403, 429) are passed through
/// with their kind and reason unchanged.
///
/// Other ledger statuses are not mapped through: a ledger `500` or `503`,
/// even with a readable `detail`, becomes `503` "Credit service is
/// currently unavailable.", the same as an unreachable ledger.
#[derive(Clone, Debug)]
pub struct HttpGateClient {
    http: Client,
    check_url: Url,
}

impl HttpGateClient {
    pub fn new(config: &GateClientConfig) -> ClientResult<Self> {
        let raw = config.check_url();
        let check_url = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { http, check_url })
    }

    pub fn check_url(&self) -> &Url {
        &self.check_url
    }

    async fn interpret(&self, response: reqwest::Response) -> Verdict {
        let status = response.status();

        if status == StatusCode::OK {
            return match response.json::<CheckResponse>().await {
                Ok(body) => Verdict::Approved {
                    credits_remaining: body.credits_remaining,
                },
                Err(e) => {
                    warn!(error = %e, "unparseable approval from ledger; failing closed");
                    Verdict::dependency_unavailable()
                }
            };
        }

        let Some(kind) = DenialKind::from_ledger_status(status) else {
            warn!(%status, "unexpected ledger status; failing closed");
            return Verdict::dependency_unavailable();
        };

        match response.json::<ErrorBody>().await {
            Ok(body) => Verdict::Denied {
                kind,
                reason: body.detail,
            },
            Err(e) => {
                warn!(%status, error = %e, "unparseable denial from ledger; failing closed");
                Verdict::dependency_unavailable()
            }
        }
    }
}

#[async_trait]
impl GateClient for HttpGateClient {
    async fn check(&self, identity: &str) -> Verdict {
        let Ok(header) = HeaderValue::from_str(identity) else {
            return Verdict::denied(DenialKind::MalformedRequest);
        };

        let sent = self
            .http
            .post(self.check_url.clone())
            .header(IDENTITY_HEADER, header)
            .send()
            .await;

        let verdict = match sent {
            Ok(response) => self.interpret(response).await,
            Err(e) => {
                warn!(
                    error = %e,
                    timeout = e.is_timeout(),
                    url = %self.check_url,
                    "credit ledger unreachable; failing closed"
                );
                Verdict::dependency_unavailable()
            }
        };

        debug!(account = identity, status = %verdict.status(), "gate verdict");
        verdict
    }
}
