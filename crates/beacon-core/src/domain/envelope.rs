//! ResultEnvelope - the only value `resolve` hands back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::ErrorKind;

/// The delivery strategies, in their default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrategyKind {
    #[serde(alias = "direct")]
    DirectFetch,
    #[serde(alias = "relay")]
    RelayFetch,
    #[serde(alias = "callback", alias = "jsonp")]
    CallbackInjection,
}

impl StrategyKind {
    pub const DEFAULT_ORDER: [StrategyKind; 3] = [
        StrategyKind::DirectFetch,
        StrategyKind::RelayFetch,
        StrategyKind::CallbackInjection,
    ];

    /// Short name used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::DirectFetch => "direct",
            StrategyKind::RelayFetch => "relay",
            StrategyKind::CallbackInjection => "callback",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(StrategyKind::DirectFetch),
            "relay" => Ok(StrategyKind::RelayFetch),
            "callback" | "jsonp" => Ok(StrategyKind::CallbackInjection),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// Why one strategy gave up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyFailure {
    pub strategy: StrategyKind,
    pub error_kind: ErrorKind,
    pub attempts: u32,
    pub http_status: u16,
}

/// Normalized result of one `resolve` call.
///
/// Fields are private: an envelope is built once by the resolver and only
/// read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,

    http_status: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    strategy_used: Option<StrategyKind>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    failures: Vec<StrategyFailure>,
}

impl ResultEnvelope {
    pub fn success(data: serde_json::Value, http_status: u16, strategy: StrategyKind) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_kind: None,
            http_status,
            strategy_used: Some(strategy),
            failures: Vec::new(),
        }
    }

    /// A failure that never obtained a real HTTP response.
    pub fn failure(kind: ErrorKind) -> Self {
        Self {
            success: false,
            data: None,
            error_kind: Some(kind),
            http_status: 0,
            strategy_used: None,
            failures: Vec::new(),
        }
    }

    pub fn exhausted(failures: Vec<StrategyFailure>) -> Self {
        Self {
            failures,
            ..Self::failure(ErrorKind::AllStrategiesExhausted)
        }
    }

    /// Attach the trail of strategies that failed before the final result.
    pub fn with_failures(mut self, failures: Vec<StrategyFailure>) -> Self {
        self.failures = failures;
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<serde_json::Value> {
        self.data
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    pub fn strategy_used(&self) -> Option<StrategyKind> {
        self.strategy_used
    }

    pub fn failures(&self) -> &[StrategyFailure] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_has_data_and_no_error() {
        let env = ResultEnvelope::success(json!({"ok": true}), 200, StrategyKind::RelayFetch);
        assert!(env.is_success());
        assert_eq!(env.data(), Some(&json!({"ok": true})));
        assert_eq!(env.error_kind(), None);
        assert_eq!(env.strategy_used(), Some(StrategyKind::RelayFetch));
    }

    #[test]
    fn failure_has_error_and_zero_status() {
        let env = ResultEnvelope::failure(ErrorKind::InvalidEndpoint);
        assert!(!env.is_success());
        assert!(env.data().is_none());
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidEndpoint));
        assert_eq!(env.http_status(), 0);
        assert_eq!(env.strategy_used(), None);
    }

    #[test]
    fn envelope_json_shape() {
        let env = ResultEnvelope::exhausted(vec![StrategyFailure {
            strategy: StrategyKind::RelayFetch,
            error_kind: ErrorKind::RelayApplicationError,
            attempts: 1,
            http_status: 500,
        }]);

        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["errorKind"], "allStrategiesExhausted");
        assert_eq!(v["httpStatus"], 0);
        assert!(v.get("data").is_none());
        assert_eq!(v["failures"][0]["strategy"], "relayFetch");
        assert_eq!(v["failures"][0]["errorKind"], "relayApplicationError");
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!("direct".parse::<StrategyKind>().unwrap(), StrategyKind::DirectFetch);
        assert_eq!(" Relay ".parse::<StrategyKind>().unwrap(), StrategyKind::RelayFetch);
        assert_eq!("jsonp".parse::<StrategyKind>().unwrap(), StrategyKind::CallbackInjection);
        assert!("carrier-pigeon".parse::<StrategyKind>().is_err());
    }
}
