//! Resolver configuration.
//!
//! Defaults mirror the production client: 3 attempts per strategy, 10s per
//! attempt, 1s linear backoff step, direct → relay → callback.
//! Environment variables prefixed with `BEACON_` override individual fields.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{DEFAULT_RETRYABLE_STATUSES, RetryPolicy, StrategyKind};
use crate::transport::relay::DEFAULT_RELAY_URL;

pub const ENV_PREFIX: &str = "BEACON_";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid_value(key: &str, value: &str, reason: impl ToString) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Attempts per strategy, first try included.
    pub max_attempts: u32,

    /// Bound on every single attempt.
    pub timeout_ms: u64,

    /// Retry n waits `n × backoff_step_ms`.
    pub backoff_step_ms: u64,

    pub retryable_statuses: Vec<u16>,

    /// The target URL is appended as the `url` query parameter.
    pub relay_url: String,

    /// Page origin to present; responses not granting it are opaque.
    pub origin: Option<String>,

    /// Strategies in priority order.
    pub strategies: Vec<StrategyKind>,

    /// Retry mutating operations (`update-status`) on transient failures.
    pub retry_mutations: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_ms: 10_000,
            backoff_step_ms: 1_000,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
            relay_url: DEFAULT_RELAY_URL.to_string(),
            origin: None,
            strategies: StrategyKind::DEFAULT_ORDER.to_vec(),
            retry_mutations: true,
        }
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::invalid_value(key, raw, e))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value(key, raw, "expected a boolean")),
    }
}

fn parse_list<T: std::str::FromStr>(key: &str, raw: &str) -> Result<Vec<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(|e| ConfigError::invalid_value(key, raw, e)))
        .collect()
}

impl ResolverConfig {
    /// Defaults overlaid with `BEACON_*` environment variables, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default().overlay(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (keys are full variable names).
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((key, v)) = get("MAX_ATTEMPTS") {
            self.max_attempts = parse_num(&key, &v)?;
        }
        if let Some((key, v)) = get("TIMEOUT_MS") {
            self.timeout_ms = parse_num(&key, &v)?;
        }
        if let Some((key, v)) = get("BACKOFF_STEP_MS") {
            self.backoff_step_ms = parse_num(&key, &v)?;
        }
        if let Some((key, v)) = get("RETRYABLE_STATUSES") {
            self.retryable_statuses = parse_list(&key, &v)?;
        }
        if let Some((_, v)) = get("RELAY_URL") {
            self.relay_url = v;
        }
        if let Some((_, v)) = get("ORIGIN") {
            self.origin = Some(v).filter(|o| !o.trim().is_empty());
        }
        if let Some((key, v)) = get("STRATEGIES") {
            self.strategies = parse_list(&key, &v)?;
        }
        if let Some((key, v)) = get("RETRY_MUTATIONS") {
            self.retry_mutations = parse_bool(&key, &v)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".into()));
        }
        if self.strategies.is_empty() {
            return Err(ConfigError::Invalid("at least one strategy is required".into()));
        }
        if self.strategies.contains(&StrategyKind::RelayFetch) {
            self.relay_url()?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_step: Duration::from_millis(self.backoff_step_ms),
            retryable_statuses: self.retryable_statuses.iter().copied().collect(),
        }
    }

    pub fn relay_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.relay_url)
            .map_err(|e| ConfigError::invalid_value("relay_url", &self.relay_url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = ResolverConfig::default();
        config.validate().unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.relay_url().unwrap().as_str(), DEFAULT_RELAY_URL);
    }

    #[test]
    fn overlay_applies_overrides() {
        let config = ResolverConfig::default()
            .overlay(env(&[
                ("BEACON_MAX_ATTEMPTS", "5"),
                ("BEACON_TIMEOUT_MS", "2500"),
                ("BEACON_STRATEGIES", "callback, relay"),
                ("BEACON_RETRY_MUTATIONS", "off"),
                ("BEACON_ORIGIN", "https://app.test"),
            ]))
            .unwrap();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert_eq!(
            config.strategies,
            vec![StrategyKind::CallbackInjection, StrategyKind::RelayFetch]
        );
        assert!(!config.retry_mutations);
        assert_eq!(config.origin.as_deref(), Some("https://app.test"));
    }

    #[test]
    fn overlay_rejects_bad_values() {
        let err = ResolverConfig::default()
            .overlay(env(&[("BEACON_MAX_ATTEMPTS", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "BEACON_MAX_ATTEMPTS"));

        let err = ResolverConfig::default()
            .overlay(env(&[("BEACON_STRATEGIES", "direct,smoke-signal")]))
            .unwrap_err();
        assert!(err.to_string().contains("smoke-signal"));
    }

    #[test]
    fn validate_catches_unusable_settings() {
        let zero = ResolverConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let none = ResolverConfig {
            strategies: vec![],
            ..Default::default()
        };
        assert!(none.validate().is_err());

        let bad_relay = ResolverConfig {
            relay_url: "relay please".into(),
            ..Default::default()
        };
        assert!(bad_relay.validate().is_err());

        let no_relay = ResolverConfig {
            relay_url: "relay please".into(),
            strategies: vec![StrategyKind::DirectFetch],
            ..Default::default()
        };
        assert!(no_relay.validate().is_ok());
    }

    #[test]
    fn deserializes_with_short_strategy_names() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"strategies": ["relay", "jsonp"], "timeout_ms": 500}"#).unwrap();
        assert_eq!(
            config.strategies,
            vec![StrategyKind::RelayFetch, StrategyKind::CallbackInjection]
        );
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.max_attempts, 3);
    }
}
