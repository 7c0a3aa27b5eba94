use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use tracing::{instrument, warn};

use crate::token::TokenResolver;

mod types;
pub use types::*;

/// Per-call failure taxonomy. `Upstream` carries the HTTP status so callers
/// can decide between the credential-retry path and plain degradation.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("github responded {status} for {endpoint}")]
    Upstream { status: u16, endpoint: String },
    #[error("failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
    #[error("transport failure for {endpoint}")]
    Transport {
        endpoint: String,
        #[source]
        source: octocrab::Error,
    },
}

impl GithubError {
    /// 401/403 means the credential itself is suspect; anything else is the
    /// endpoint misbehaving.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Upstream { status, .. } if auth_status(*status))
    }
}

pub(crate) fn auth_status(status: u16) -> bool {
    status == 401 || status == 403
}

/// Authenticated GitHub access with transparent credential substitution:
/// a primary client built from the resolved token and an optional fallback
/// client used for exactly one retry when the primary is rejected.
#[derive(Clone)]
pub struct GithubClient {
    primary: Octocrab,
    fallback: Option<Octocrab>,
}

impl GithubClient {
    pub fn new(resolver: &TokenResolver) -> anyhow::Result<Self> {
        let primary = Octocrab::builder()
            .personal_token(resolver.primary().to_string())
            .build()?;
        let fallback = resolver
            .fallback()
            .map(|token| {
                Octocrab::builder()
                    .personal_token(token.to_string())
                    .build()
            })
            .transpose()?;

        Ok(Self { primary, fallback })
    }

    /// REST call by endpoint path. Retries once with the fallback credential
    /// when the primary is rejected with 401/403.
    #[instrument(skip(self))]
    pub async fn rest<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GithubError> {
        let first = attempt_rest(&self.primary, endpoint).await;
        let retry = self
            .fallback
            .as_ref()
            .map(|fallback| attempt_rest(fallback, endpoint));
        retry_on_auth(first, retry).await
    }

    /// Single-shot GraphQL query against the fixed endpoint. The GraphQL
    /// route gives less status detail than REST, so any failure triggers the
    /// one fallback retry.
    #[instrument(skip(self, query))]
    pub async fn graphql<T: DeserializeOwned>(&self, query: &str) -> Result<T, GithubError> {
        let payload = serde_json::json!({ "query": query });
        let first = attempt_graphql(&self.primary, &payload).await;
        let retry = self
            .fallback
            .as_ref()
            .map(|fallback| attempt_graphql(fallback, &payload));
        retry_on_failure(first, retry).await
    }
}

/// Awaits the prepared retry only when the first attempt was rejected with
/// 401/403. The fallback gets exactly one shot and its outcome is final.
async fn retry_on_auth<T, Fut>(
    first: Result<T, GithubError>,
    retry: Option<Fut>,
) -> Result<T, GithubError>
where
    Fut: std::future::Future<Output = Result<T, GithubError>>,
{
    match (first, retry) {
        (Err(err), Some(retry)) if err.is_auth_failure() => {
            warn!("credential rejected ({err}), retrying with fallback token");
            retry.await
        }
        (first, _) => first,
    }
}

async fn retry_on_failure<T, Fut>(
    first: Result<T, GithubError>,
    retry: Option<Fut>,
) -> Result<T, GithubError>
where
    Fut: std::future::Future<Output = Result<T, GithubError>>,
{
    match (first, retry) {
        (Err(err), Some(retry)) => {
            warn!("graphql query failed ({err}), retrying with fallback token");
            retry.await
        }
        (first, _) => first,
    }
}

async fn attempt_rest<T: DeserializeOwned>(
    client: &Octocrab,
    endpoint: &str,
) -> Result<T, GithubError> {
    client
        .get(endpoint, None::<&()>)
        .await
        .map_err(|err| classify(endpoint, err))
}

async fn attempt_graphql<T: DeserializeOwned>(
    client: &Octocrab,
    payload: &serde_json::Value,
) -> Result<T, GithubError> {
    client
        .graphql(payload)
        .await
        .map_err(|err| classify("/graphql", err))
}

fn classify(endpoint: &str, err: octocrab::Error) -> GithubError {
    match err {
        octocrab::Error::GitHub { source, .. } => GithubError::Upstream {
            status: source.status_code.as_u16(),
            endpoint: endpoint.to_string(),
        },
        octocrab::Error::Json { source, .. } => GithubError::Decode {
            endpoint: endpoint.to_string(),
            message: source.to_string(),
        },
        octocrab::Error::Serde { source, .. } => GithubError::Decode {
            endpoint: endpoint.to_string(),
            message: source.to_string(),
        },
        other => GithubError::Transport {
            endpoint: endpoint.to_string(),
            source: other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;

    fn rejected(status: u16) -> GithubError {
        GithubError::Upstream {
            status,
            endpoint: "/user".to_string(),
        }
    }

    #[test]
    fn auth_rejection_gets_exactly_one_fallback_attempt() {
        let calls = Cell::new(0u32);
        let retry = async {
            calls.set(calls.get() + 1);
            Ok(5u32)
        };
        let out = block_on(retry_on_auth(Err(rejected(401)), Some(retry)));
        assert_eq!(out.unwrap(), 5);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn fallback_outcome_is_final_even_when_it_fails_too() {
        let out = block_on(retry_on_auth::<u32, _>(
            Err(rejected(403)),
            Some(async { Err(rejected(403)) }),
        ));
        assert!(matches!(out, Err(GithubError::Upstream { status: 403, .. })));
    }

    #[test]
    fn non_auth_failures_do_not_touch_the_fallback() {
        let calls = Cell::new(0u32);
        let retry = async {
            calls.set(calls.get() + 1);
            Ok(5u32)
        };
        let out = block_on(retry_on_auth(Err(rejected(404)), Some(retry)));
        assert!(matches!(out, Err(GithubError::Upstream { status: 404, .. })));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn success_and_missing_fallback_pass_through() {
        let none: Option<std::future::Ready<Result<u32, GithubError>>> = None;
        let out = block_on(retry_on_auth(Ok(9u32), none));
        assert_eq!(out.unwrap(), 9);

        let none: Option<std::future::Ready<Result<u32, GithubError>>> = None;
        let out = block_on(retry_on_auth(Err(rejected(401)), none));
        assert!(out.is_err());
    }

    #[test]
    fn graphql_retry_fires_on_any_failure() {
        let calls = Cell::new(0u32);
        let retry = async {
            calls.set(calls.get() + 1);
            Ok(1u32)
        };
        let out = block_on(retry_on_failure(Err(rejected(502)), Some(retry)));
        assert_eq!(out.unwrap(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn only_unauthorized_and_forbidden_trigger_the_credential_retry() {
        assert!(auth_status(401));
        assert!(auth_status(403));
        assert!(!auth_status(404));
        assert!(!auth_status(422));
        assert!(!auth_status(500));
    }

    #[test]
    fn upstream_error_reports_status_and_endpoint() {
        let err = GithubError::Upstream {
            status: 403,
            endpoint: "/user/repos".to_string(),
        };
        assert!(err.is_auth_failure());
        assert_eq!(err.to_string(), "github responded 403 for /user/repos");

        let err = GithubError::Decode {
            endpoint: "/user".to_string(),
            message: "expected value".to_string(),
        };
        assert!(!err.is_auth_failure());
    }
}
