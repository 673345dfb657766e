//! Transport - 配送 strategy の実装
//!
//! 各 strategy は 1 回の試行を行い、観測した結果を `AttemptOutcome` として返すだけです。
//! retry するか、次の strategy に進むかは resolver（domain::state）が決めます。
//!
//! # 含まれる strategy（既定の優先順）
//! - **DirectFetch**: 素の GET。読めない (opaque) 応答は inconclusive
//! - **RelayFetch**: 公開 CORS relay 越しの GET。relay の封筒を開けて中身を取り出す
//! - **CallbackInjection**: callback 名付きで script を読み込み、payload の配送を待つ

pub mod callback;
pub mod direct;
pub mod registry;
pub mod relay;

use async_trait::async_trait;
use url::Url;

use crate::domain::{AttemptOutcome, StrategyKind};

pub use self::callback::CallbackInjection;
pub use self::direct::DirectFetch;
pub use self::registry::CallbackRegistry;
pub use self::relay::RelayFetch;

/// One way of moving a payload across the origin boundary.
///
/// `attempt` must release everything it acquired when its future is dropped:
/// the resolver enforces timeouts by dropping the in-flight attempt.
#[async_trait]
pub trait DeliveryStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Make one attempt at fetching `target`.
    async fn attempt(&self, target: &Url) -> AttemptOutcome;
}
