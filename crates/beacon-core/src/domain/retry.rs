//! Retry policy: classifies attempt outcomes and decides backoff delays.

use std::collections::BTreeSet;
use std::time::Duration;

use super::errors::ErrorKind;
use super::outcome::{AttemptOutcome, OutcomeClass};

/// Statuses that mark a failure as transient. 0 stands for "no response".
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 7] = [0, 408, 429, 500, 502, 503, 504];

/// Retry policy applied to every strategy independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per strategy, first try included.
    pub max_attempts: u32,

    /// Delay step for linear backoff.
    pub backoff_step: Duration,

    pub retryable_statuses: BTreeSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(1000),
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Same policy with a single attempt per strategy.
    pub fn without_retries(&self) -> Self {
        Self {
            max_attempts: 1,
            ..self.clone()
        }
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Delay to wait before re-issuing, given the number of attempts already made.
    ///
    /// Linear: `attempts × backoff_step` (1s, 2s, 3s, ... with the default step).
    pub fn next_delay(&self, attempts: u32) -> Duration {
        self.backoff_step.saturating_mul(attempts.max(1))
    }

    /// Whether another attempt of the same strategy is allowed.
    pub fn can_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    pub fn classify(&self, outcome: &AttemptOutcome) -> OutcomeClass {
        let (kind, status) = match outcome {
            AttemptOutcome::Delivered { .. } => return OutcomeClass::Success,
            AttemptOutcome::Failed {
                error_kind,
                http_status,
            } => (*error_kind, *http_status),
        };

        match kind {
            ErrorKind::Timeout | ErrorKind::NetworkError => OutcomeClass::TransientFailure,
            ErrorKind::OpaqueResponse => OutcomeClass::Inconclusive,
            ErrorKind::UnexpectedStatus if self.is_retryable_status(status) => {
                OutcomeClass::TransientFailure
            }
            // The relay's own report of the target's status is never retried,
            // even when that status would be retryable on a direct response.
            ErrorKind::RelayApplicationError
            | ErrorKind::MalformedPayload
            | ErrorKind::UnexpectedStatus
            | ErrorKind::InvalidEndpoint
            | ErrorKind::AllStrategiesExhausted => OutcomeClass::TerminalFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn default_policy_has_reasonable_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff_step, Duration::from_secs(1));
        assert_eq!(
            policy.retryable_statuses.iter().copied().collect::<Vec<_>>(),
            vec![0, 408, 429, 500, 502, 503, 504]
        );
    }

    #[test]
    fn linear_backoff_increases() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.next_delay(1), Duration::from_secs(1));
        assert_eq!(policy.next_delay(2), Duration::from_secs(2));
        assert_eq!(policy.next_delay(3), Duration::from_secs(3));
        assert_eq!(policy.next_delay(0), Duration::from_secs(1));
    }

    #[test]
    fn retry_ceiling() {
        let policy = RetryPolicy::default();
        assert!(policy.can_retry(1));
        assert!(policy.can_retry(2));
        assert!(!policy.can_retry(3));

        let once = policy.without_retries();
        assert!(!once.can_retry(1));
    }

    #[rstest]
    #[case(ErrorKind::Timeout, 0, OutcomeClass::TransientFailure)]
    #[case(ErrorKind::NetworkError, 0, OutcomeClass::TransientFailure)]
    #[case(ErrorKind::UnexpectedStatus, 408, OutcomeClass::TransientFailure)]
    #[case(ErrorKind::UnexpectedStatus, 429, OutcomeClass::TransientFailure)]
    #[case(ErrorKind::UnexpectedStatus, 503, OutcomeClass::TransientFailure)]
    #[case(ErrorKind::UnexpectedStatus, 404, OutcomeClass::TerminalFailure)]
    #[case(ErrorKind::UnexpectedStatus, 401, OutcomeClass::TerminalFailure)]
    #[case(ErrorKind::OpaqueResponse, 0, OutcomeClass::Inconclusive)]
    #[case(ErrorKind::RelayApplicationError, 500, OutcomeClass::TerminalFailure)]
    #[case(ErrorKind::RelayApplicationError, 302, OutcomeClass::TerminalFailure)]
    #[case(ErrorKind::MalformedPayload, 200, OutcomeClass::TerminalFailure)]
    fn failures_are_classified(
        #[case] kind: ErrorKind,
        #[case] status: u16,
        #[case] expected: OutcomeClass,
    ) {
        let policy = RetryPolicy::default();
        assert_eq!(policy.classify(&AttemptOutcome::failed(kind, status)), expected);
    }

    #[test]
    fn delivered_is_success() {
        let policy = RetryPolicy::default();
        let outcome = AttemptOutcome::delivered(json!(null), 200);
        assert_eq!(policy.classify(&outcome), OutcomeClass::Success);
    }
}
