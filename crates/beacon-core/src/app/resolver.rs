//! TransportResolver - strategy を優先順に試し、結果を 1 つの envelope にまとめる
//!
//! # 流れ（1 回の resolve）
//! 1. endpoint を検証（不正なら通信せずに InvalidEndpoint）
//! 2. AttemptState を開始し、現在の strategy を timeout 付きで 1 回試す
//! 3. outcome を state に記録し、Decision に従う（retry / 次の strategy / 終了）
//!
//! strategy と retry は常に直列に実行されます。timeout 時は試行中の future を
//! drop するので、callback 登録や注入済み script はその場で解放されます。

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use super::builder::ResolverBuilder;
use crate::domain::{
    AttemptOutcome, AttemptState, Decision, LogicalRequest, ResultEnvelope, RetryPolicy,
    StrategyKind,
};
use crate::ports::IdGenerator;
use crate::transport::{CallbackRegistry, DeliveryStrategy};

pub struct TransportResolver {
    pub(crate) strategies: Vec<Arc<dyn DeliveryStrategy>>,
    pub(crate) policy: RetryPolicy,
    pub(crate) timeout: Duration,
    pub(crate) retry_mutations: bool,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) registry: Arc<CallbackRegistry>,
}

impl TransportResolver {
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    pub fn strategy_order(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Callback registrations and injected scripts currently held.
    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    /// Resolve one logical request. Never fails: every failure is in the envelope.
    pub async fn resolve(&self, request: &LogicalRequest) -> ResultEnvelope {
        let request_id = self.ids.generate_request_id();
        let span = tracing::info_span!(
            "resolve",
            request_id = %request_id,
            operation = %request.operation
        );
        self.run(request).instrument(span).await
    }

    fn policy_for(&self, request: &LogicalRequest) -> RetryPolicy {
        if request.operation.is_mutating() && !self.retry_mutations {
            self.policy.without_retries()
        } else {
            self.policy.clone()
        }
    }

    fn strategy(&self, kind: StrategyKind) -> Option<&Arc<dyn DeliveryStrategy>> {
        self.strategies.iter().find(|s| s.kind() == kind)
    }

    async fn run(&self, request: &LogicalRequest) -> ResultEnvelope {
        let target = match request.target_url() {
            Ok(url) => url,
            Err(kind) => {
                tracing::warn!(endpoint = %request.endpoint, "rejecting request: {kind}");
                return ResultEnvelope::failure(kind);
            }
        };

        let policy = self.policy_for(request);
        let mut state = AttemptState::new(self.strategy_order());
        state.start();

        while let Some((kind, attempt)) = state.current() {
            let Some(strategy) = self.strategy(kind) else {
                break;
            };

            tracing::debug!(strategy = %kind, attempt, "issuing attempt");
            let outcome = match tokio::time::timeout(self.timeout, strategy.attempt(&target)).await
            {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::debug!(strategy = %kind, attempt, timeout = ?self.timeout, "attempt timed out");
                    AttemptOutcome::timed_out()
                }
            };

            match state.record(&outcome, &policy) {
                Decision::Complete => {
                    if let AttemptOutcome::Delivered { data, http_status } = outcome {
                        tracing::debug!(strategy = %kind, attempt, http_status, "delivered");
                        return ResultEnvelope::success(data, http_status, kind)
                            .with_failures(state.into_failures());
                    }
                    break;
                }
                Decision::Retry { delay, reason } => {
                    tracing::warn!(%reason, "retrying");
                    tokio::time::sleep(delay).await;
                }
                Decision::NextStrategy { reason } => {
                    tracing::info!(%reason, "falling through");
                }
                Decision::Exhausted { reason } => {
                    tracing::warn!(%reason, "giving up");
                    break;
                }
            }
        }

        ResultEnvelope::exhausted(state.into_failures())
    }
}
