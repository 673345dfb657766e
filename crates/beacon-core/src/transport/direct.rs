//! Direct cross-origin GET.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::DeliveryStrategy;
use crate::domain::{AttemptOutcome, ErrorKind, StrategyKind};
use crate::ports::{FetchError, HttpFetch};

pub struct DirectFetch {
    http: Arc<dyn HttpFetch>,
}

impl DirectFetch {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl DeliveryStrategy for DirectFetch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DirectFetch
    }

    async fn attempt(&self, target: &Url) -> AttemptOutcome {
        let response = match self.http.get(target).await {
            Ok(response) => response,
            Err(FetchError::Network(msg)) => {
                tracing::debug!(%target, error = %msg, "direct fetch network error");
                return AttemptOutcome::no_response(ErrorKind::NetworkError);
            }
        };

        let status = response.status;
        let Some(body) = response.body else {
            return AttemptOutcome::no_response(ErrorKind::OpaqueResponse);
        };
        if !(200..300).contains(&status) {
            return AttemptOutcome::failed(ErrorKind::UnexpectedStatus, status);
        }

        match serde_json::from_str(&body) {
            Ok(data) => AttemptOutcome::delivered(data, status),
            Err(e) => {
                tracing::debug!(%target, error = %e, "direct fetch body is not JSON");
                AttemptOutcome::failed(ErrorKind::MalformedPayload, status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::ScriptedFetch;
    use crate::ports::FetchResponse;
    use serde_json::json;

    fn target() -> Url {
        Url::parse("https://backend.test/exec?path=health").unwrap()
    }

    async fn run(reply: Result<FetchResponse, FetchError>) -> AttemptOutcome {
        let http = Arc::new(ScriptedFetch::new());
        http.push("https://backend.test/", reply);
        DirectFetch::new(http).attempt(&target()).await
    }

    #[tokio::test]
    async fn readable_json_is_delivered() {
        let outcome = run(Ok(FetchResponse::readable(200, r#"{"ok":true}"#))).await;
        assert_eq!(outcome, AttemptOutcome::delivered(json!({"ok": true}), 200));
    }

    #[tokio::test]
    async fn opaque_response_is_reported() {
        let outcome = run(Ok(FetchResponse::opaque())).await;
        assert_eq!(outcome, AttemptOutcome::no_response(ErrorKind::OpaqueResponse));
    }

    #[tokio::test]
    async fn error_status_is_reported_with_status() {
        let outcome = run(Ok(FetchResponse::readable(503, "busy"))).await;
        assert_eq!(outcome, AttemptOutcome::failed(ErrorKind::UnexpectedStatus, 503));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let outcome = run(Ok(FetchResponse::readable(200, "<html>"))).await;
        assert_eq!(outcome, AttemptOutcome::failed(ErrorKind::MalformedPayload, 200));
    }

    #[tokio::test]
    async fn network_error_has_no_status() {
        let outcome = run(Err(FetchError::Network("refused".into()))).await;
        assert_eq!(outcome, AttemptOutcome::no_response(ErrorKind::NetworkError));
    }
}
