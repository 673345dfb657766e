//! StatusClient - status board の 3 つの操作を resolver 経由で呼ぶ
//!
//! endpoint は実行中に差し替えられます。差し替えは検証に通ったときだけ反映され、
//! 失敗したら以前の値が残ります。

use std::sync::{PoisonError, RwLock};

use chrono::SecondsFormat;

use super::resolver::TransportResolver;
use crate::domain::{LogicalRequest, Operation, ResultEnvelope, parse_endpoint};
use crate::error::BeaconError;
use crate::ports::{Clock, SystemClock};

pub struct StatusClient<C = SystemClock> {
    resolver: TransportResolver,
    endpoint: RwLock<String>,
    clock: C,
}

impl StatusClient<SystemClock> {
    pub fn new(resolver: TransportResolver, endpoint: impl Into<String>) -> Self {
        Self::with_clock(resolver, endpoint, SystemClock)
    }
}

impl<C: Clock> StatusClient<C> {
    pub fn with_clock(resolver: TransportResolver, endpoint: impl Into<String>, clock: C) -> Self {
        Self {
            resolver,
            endpoint: RwLock::new(endpoint.into()),
            clock,
        }
    }

    pub fn endpoint(&self) -> String {
        self.endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Point later requests at `endpoint`. Requests already in flight keep the old one.
    pub fn set_endpoint(&self, endpoint: &str) -> Result<(), BeaconError> {
        let url = parse_endpoint(endpoint)
            .map_err(|_| BeaconError::InvalidEndpoint(endpoint.to_string()))?;
        *self.endpoint.write().unwrap_or_else(PoisonError::into_inner) = url.to_string();
        tracing::info!(endpoint = %url, "endpoint updated");
        Ok(())
    }

    pub fn resolver(&self) -> &TransportResolver {
        &self.resolver
    }

    fn request(&self, operation: Operation) -> LogicalRequest {
        LogicalRequest::new(operation, self.endpoint())
    }

    pub async fn health(&self) -> ResultEnvelope {
        self.resolver.resolve(&self.request(Operation::Health)).await
    }

    pub async fn statuses(&self) -> ResultEnvelope {
        self.resolver.resolve(&self.request(Operation::Statuses)).await
    }

    /// Post a status for `name`, stamped with the current time.
    ///
    /// Blank name or status is rejected before anything is sent.
    pub async fn update_status(&self, name: &str, status: &str) -> Result<ResultEnvelope, BeaconError> {
        let name = name.trim();
        let status = status.trim();
        if name.is_empty() {
            return Err(BeaconError::MissingField("name"));
        }
        if status.is_empty() {
            return Err(BeaconError::MissingField("status"));
        }

        let timestamp = self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let request = self
            .request(Operation::UpdateStatus)
            .with_param("name", name)
            .with_param("status", status)
            .with_param("timestamp", timestamp);
        Ok(self.resolver.resolve(&request).await)
    }
}
