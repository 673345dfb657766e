//! Logical request model: what the caller wants, independent of transport.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::errors::ErrorKind;

/// The backend's logical operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Health,
    Statuses,
    UpdateStatus,
}

impl Operation {
    /// Wire name, sent as the `path` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Health => "health",
            Operation::Statuses => "statuses",
            Operation::UpdateStatus => "update-status",
        }
    }

    /// Whether a replayed attempt can change backend state twice.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Operation::UpdateStatus)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request parameter value (string or number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Integer(n) => write!(f, "{n}"),
            ParamValue::Float(n) => write!(f, "{n}"),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

/// One call's worth of intent: operation, parameters and the endpoint to reach.
///
/// Parameters are kept in a `BTreeMap` so the serialized query string is
/// stable regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalRequest {
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParamValue>,
    pub endpoint: String,
}

impl LogicalRequest {
    pub fn new(operation: Operation, endpoint: impl Into<String>) -> Self {
        Self {
            operation,
            parameters: BTreeMap::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Build the backend URL for this request.
    ///
    /// The endpoint's own query is preserved; `path=<operation>` and then the
    /// parameters are appended.
    pub fn target_url(&self) -> Result<Url, ErrorKind> {
        let mut url = parse_endpoint(&self.endpoint)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("path", self.operation.as_str());
            for (key, value) in &self.parameters {
                query.append_pair(key, &value.to_string());
            }
        }
        Ok(url)
    }
}

/// Parse an endpoint string, accepting only absolute http(s) URLs with a host.
pub fn parse_endpoint(raw: &str) -> Result<Url, ErrorKind> {
    let url = Url::parse(raw.trim()).map_err(|_| ErrorKind::InvalidEndpoint)?;
    if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
        return Err(ErrorKind::InvalidEndpoint);
    }
    Ok(url)
}
