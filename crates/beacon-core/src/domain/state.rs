//! State - 1 回の resolve の状態機械
//!
//! # 状態遷移
//! - Init → Trying(0, 1)（strategy が 1 つもなければ Exhausted）
//! - Trying(i, n) --Success--> Succeeded
//! - Trying(i, n) --TransientFailure, n < max--> Trying(i, n + 1)
//! - Trying(i, n) --それ以外--> Trying(i + 1, 1) または Exhausted
//!
//! AttemptState は I/O を持ちません。outcome を受け取って Decision を返すだけなので、
//! retry / fallthrough の規則はネットワークなしでテストできます。

use super::decision::Decision;
use super::envelope::{StrategyFailure, StrategyKind};
use super::outcome::{AttemptOutcome, OutcomeClass};
use super::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    /// `strategy` indexes the configured order; `attempt` is 1-based.
    Trying { strategy: usize, attempt: u32 },
    Succeeded,
    Exhausted,
}

/// Transient per-request state: position in the strategy order, attempt
/// count, strategies tried and why each one gave up.
#[derive(Debug, Clone)]
pub struct AttemptState {
    phase: Phase,
    order: Vec<StrategyKind>,
    tried: Vec<StrategyKind>,
    failures: Vec<StrategyFailure>,
}

impl AttemptState {
    pub fn new(order: Vec<StrategyKind>) -> Self {
        Self {
            phase: Phase::Init,
            order,
            tried: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Leave `Init`. Calling it again has no effect.
    pub fn start(&mut self) -> Phase {
        if self.phase == Phase::Init {
            self.phase = if self.order.is_empty() {
                Phase::Exhausted
            } else {
                Phase::Trying {
                    strategy: 0,
                    attempt: 1,
                }
            };
        }
        self.phase
    }

    /// The strategy and attempt number to issue next, if any.
    pub fn current(&self) -> Option<(StrategyKind, u32)> {
        match self.phase {
            Phase::Trying { strategy, attempt } => {
                self.order.get(strategy).map(|kind| (*kind, attempt))
            }
            _ => None,
        }
    }

    /// Record the outcome of the current attempt and transition.
    pub fn record(&mut self, outcome: &AttemptOutcome, policy: &RetryPolicy) -> Decision {
        let Phase::Trying { strategy, attempt } = self.phase else {
            return match self.phase {
                Phase::Succeeded => Decision::Complete,
                _ => Decision::Exhausted {
                    reason: "no attempt in flight".to_string(),
                },
            };
        };
        let kind = self.order[strategy];
        if self.tried.last() != Some(&kind) {
            self.tried.push(kind);
        }

        let class = policy.classify(outcome);
        match class {
            OutcomeClass::Success => {
                self.phase = Phase::Succeeded;
                return Decision::Complete;
            }
            OutcomeClass::TransientFailure if policy.can_retry(attempt) => {
                let delay = policy.next_delay(attempt);
                self.phase = Phase::Trying {
                    strategy,
                    attempt: attempt + 1,
                };
                return Decision::Retry {
                    delay,
                    reason: format!(
                        "{kind} attempt {}/{} after {:?}",
                        attempt + 1,
                        policy.max_attempts,
                        delay
                    ),
                };
            }
            _ => {}
        }

        let error_kind = outcome
            .error_kind()
            .unwrap_or(super::errors::ErrorKind::NetworkError);
        self.failures.push(StrategyFailure {
            strategy: kind,
            error_kind,
            attempts: attempt,
            http_status: outcome.http_status(),
        });

        let why = match class {
            OutcomeClass::Inconclusive => "inconclusive",
            OutcomeClass::TransientFailure => "retries exhausted",
            _ => "terminal failure",
        };

        if strategy + 1 < self.order.len() {
            self.phase = Phase::Trying {
                strategy: strategy + 1,
                attempt: 1,
            };
            Decision::NextStrategy {
                reason: format!("{kind} {why} ({error_kind}), trying {}", self.order[strategy + 1]),
            }
        } else {
            self.phase = Phase::Exhausted;
            Decision::Exhausted {
                reason: format!("{kind} {why} ({error_kind}), no strategy left"),
            }
        }
    }

    pub fn tried(&self) -> &[StrategyKind] {
        &self.tried
    }

    pub fn failures(&self) -> &[StrategyFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<StrategyFailure> {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use serde_json::json;
    use std::time::Duration;

    fn all() -> AttemptState {
        AttemptState::new(StrategyKind::DEFAULT_ORDER.to_vec())
    }

    #[test]
    fn start_enters_first_strategy() {
        let mut st = all();
        assert_eq!(st.phase(), Phase::Init);
        assert_eq!(
            st.start(),
            Phase::Trying {
                strategy: 0,
                attempt: 1
            }
        );
        assert_eq!(st.current(), Some((StrategyKind::DirectFetch, 1)));
    }

    #[test]
    fn empty_order_is_exhausted_immediately() {
        let mut st = AttemptState::new(Vec::new());
        assert_eq!(st.start(), Phase::Exhausted);
        assert_eq!(st.current(), None);
    }

    #[test]
    fn opaque_falls_through_without_retry() {
        let policy = RetryPolicy::default();
        let mut st = all();
        st.start();

        let d = st.record(&AttemptOutcome::no_response(ErrorKind::OpaqueResponse), &policy);
        assert!(matches!(d, Decision::NextStrategy { .. }));
        assert_eq!(st.current(), Some((StrategyKind::RelayFetch, 1)));
        assert_eq!(st.failures()[0].attempts, 1);
        assert_eq!(st.failures()[0].error_kind, ErrorKind::OpaqueResponse);
    }

    #[test]
    fn transient_failures_retry_with_linear_delay_then_fall_through() {
        let policy = RetryPolicy::default();
        let mut st = all();
        st.start();

        let d1 = st.record(&AttemptOutcome::timed_out(), &policy);
        assert!(matches!(d1, Decision::Retry { delay, .. } if delay == Duration::from_secs(1)));
        let d2 = st.record(&AttemptOutcome::timed_out(), &policy);
        assert!(matches!(d2, Decision::Retry { delay, .. } if delay == Duration::from_secs(2)));
        assert_eq!(st.current(), Some((StrategyKind::DirectFetch, 3)));

        let d3 = st.record(&AttemptOutcome::timed_out(), &policy);
        assert!(matches!(d3, Decision::NextStrategy { .. }));
        assert_eq!(st.current(), Some((StrategyKind::RelayFetch, 1)));
        assert_eq!(st.failures()[0].attempts, 3);
    }

    #[test]
    fn terminal_failure_moves_on_immediately() {
        let policy = RetryPolicy::default();
        let mut st = all();
        st.start();
        st.record(&AttemptOutcome::no_response(ErrorKind::OpaqueResponse), &policy);

        let d = st.record(
            &AttemptOutcome::failed(ErrorKind::RelayApplicationError, 500),
            &policy,
        );
        assert!(matches!(d, Decision::NextStrategy { .. }));
        assert_eq!(st.current(), Some((StrategyKind::CallbackInjection, 1)));
        assert_eq!(
            st.tried(),
            &[StrategyKind::DirectFetch, StrategyKind::RelayFetch]
        );
    }

    #[test]
    fn last_strategy_failure_exhausts() {
        let policy = RetryPolicy::default().without_retries();
        let mut st = AttemptState::new(vec![StrategyKind::CallbackInjection]);
        st.start();

        let d = st.record(&AttemptOutcome::timed_out(), &policy);
        assert!(d.is_final());
        assert!(matches!(d, Decision::Exhausted { .. }));
        assert_eq!(st.phase(), Phase::Exhausted);
    }

    #[test]
    fn success_completes() {
        let policy = RetryPolicy::default();
        let mut st = all();
        st.start();

        let d = st.record(&AttemptOutcome::delivered(json!({"ok": true}), 200), &policy);
        assert_eq!(d, Decision::Complete);
        assert_eq!(st.phase(), Phase::Succeeded);
        assert!(st.failures().is_empty());
    }
}
