//! Fetch through a public CORS relay.
//!
//! The relay is called as `GET <relay_url>?url=<target>` and answers with
//! `{ "contents": "<body>", "status": { "http_code": <n> } }`, where
//! `http_code` is the status the relay itself got from the target.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::DeliveryStrategy;
use crate::domain::{AttemptOutcome, ErrorKind, StrategyKind};
use crate::ports::{FetchError, HttpFetch};

pub const DEFAULT_RELAY_URL: &str = "https://api.allorigins.win/get";

#[derive(Debug, Deserialize)]
struct RelayEnvelope {
    #[serde(default)]
    contents: Option<String>,
    status: RelayStatus,
}

#[derive(Debug, Deserialize)]
struct RelayStatus {
    http_code: u16,
}

pub struct RelayFetch {
    http: Arc<dyn HttpFetch>,
    relay_url: Url,
}

impl RelayFetch {
    pub fn new(http: Arc<dyn HttpFetch>, relay_url: Url) -> Self {
        Self { http, relay_url }
    }

    /// The relay URL carrying `target` as its `url` parameter.
    pub fn wrap(&self, target: &Url) -> Url {
        let mut url = self.relay_url.clone();
        url.query_pairs_mut().append_pair("url", target.as_str());
        url
    }
}

/// Inner payload: JSON when it parses, the raw text otherwise.
fn unwrap_contents(contents: Option<String>) -> serde_json::Value {
    match contents {
        None => serde_json::Value::Null,
        Some(raw) => serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw)),
    }
}

#[async_trait]
impl DeliveryStrategy for RelayFetch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RelayFetch
    }

    async fn attempt(&self, target: &Url) -> AttemptOutcome {
        let relayed = self.wrap(target);
        let response = match self.http.get(&relayed).await {
            Ok(response) => response,
            Err(FetchError::Network(msg)) => {
                tracing::debug!(relay = %self.relay_url, error = %msg, "relay network error");
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

        let envelope: RelayEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(relay = %self.relay_url, error = %e, "relay envelope is not JSON");
                return AttemptOutcome::failed(ErrorKind::MalformedPayload, status);
            }
        };

        let inner = envelope.status.http_code;
        if inner != 200 {
            tracing::debug!(%target, inner, "relay reported a non-200 target status");
            return AttemptOutcome::failed(ErrorKind::RelayApplicationError, inner);
        }

        AttemptOutcome::delivered(unwrap_contents(envelope.contents), inner)
    }
}
