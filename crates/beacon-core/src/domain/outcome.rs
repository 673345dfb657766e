//! Outcome model: the result of a single delivery attempt.
//!
//! Strategies report what they observed; they do not decide whether to retry.
//! That judgment lives in `RetryPolicy::classify`, so every strategy is held to
//! the same rules.

use serde::{Deserialize, Serialize};

use super::errors::ErrorKind;

/// What one attempt of one strategy produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AttemptOutcome {
    /// The payload crossed the origin boundary and was decoded.
    Delivered {
        data: serde_json::Value,
        http_status: u16,
    },

    /// The attempt failed. `http_status` is 0 when no response was obtained.
    Failed {
        error_kind: ErrorKind,
        http_status: u16,
    },
}

impl AttemptOutcome {
    pub fn delivered(data: serde_json::Value, http_status: u16) -> Self {
        AttemptOutcome::Delivered { data, http_status }
    }

    pub fn failed(error_kind: ErrorKind, http_status: u16) -> Self {
        AttemptOutcome::Failed {
            error_kind,
            http_status,
        }
    }

    /// A failure with no HTTP response behind it.
    pub fn no_response(error_kind: ErrorKind) -> Self {
        Self::failed(error_kind, 0)
    }

    pub fn timed_out() -> Self {
        Self::no_response(ErrorKind::Timeout)
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AttemptOutcome::Delivered { http_status, .. }
            | AttemptOutcome::Failed { http_status, .. } => *http_status,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            AttemptOutcome::Delivered { .. } => None,
            AttemptOutcome::Failed { error_kind, .. } => Some(*error_kind),
        }
    }
}

/// How the resolver should read an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeClass {
    Success,
    /// Worth re-issuing the same strategy after a backoff.
    TransientFailure,
    /// This strategy cannot succeed for this request; move on.
    TerminalFailure,
    /// Data may have moved but could not be read; move on without retrying.
    Inconclusive,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessors_report_status_and_kind() {
        let ok = AttemptOutcome::delivered(json!({"ok": true}), 200);
        assert_eq!(ok.http_status(), 200);
        assert_eq!(ok.error_kind(), None);

        let t = AttemptOutcome::timed_out();
        assert_eq!(t.http_status(), 0);
        assert_eq!(t.error_kind(), Some(ErrorKind::Timeout));
    }

    #[test]
    fn outcome_class_serializes_as_screaming_snake() {
        let s = serde_json::to_string(&OutcomeClass::TransientFailure).unwrap();
        assert_eq!(s, "\"TRANSIENT_FAILURE\"");
    }
}
