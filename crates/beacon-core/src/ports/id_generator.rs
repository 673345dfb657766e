//! IdGenerator port - ID 生成の抽象化
//!
//! callback 名の一意性はここで決まります。同時に走る resolve 同士が同じ名前を
//! 引かないことが、payload を取り違えないための唯一の前提です。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::{CallbackId, RequestId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は correlation 用の ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数タスクから使える）
pub trait IdGenerator: Send + Sync {
    /// Callback ID を生成
    fn generate_callback_id(&self) -> CallbackId;

    /// Request ID を生成
    fn generate_request_id(&self) -> RequestId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// ランダム部分は 80-bit なので、同一ミリ秒内の衝突は実用上起きません。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    /// 新しい UlidGenerator を作成
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_callback_id(&self) -> CallbackId {
        CallbackId::from(self.next_ulid())
    }

    fn generate_request_id(&self) -> RequestId {
        RequestId::from(self.next_ulid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let ids: HashSet<CallbackId> = (0..10_000).map(|_| id_gen.generate_callback_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn ulid_generator_with_fixed_clock_is_still_unique() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id1 = id_gen.generate_callback_id();
        let id2 = id_gen.generate_callback_id();

        // FixedClock でもランダム部分があるので ID は異なる
        assert_ne!(id1, id2);

        // timestamp 部分は同じ
        let timestamp1 = (id1.as_ulid().0 >> 80) as u64;
        let timestamp2 = (id2.as_ulid().0 >> 80) as u64;
        assert_eq!(timestamp1, timestamp2);
        assert_eq!(timestamp1, fixed_time.timestamp_millis() as u64);
    }

    #[test]
    fn different_id_types_are_generated() {
        let id_gen = UlidGenerator::new(SystemClock);

        assert!(id_gen.generate_callback_id().to_string().starts_with("jsonp_cb_"));
        assert!(id_gen.generate_request_id().to_string().starts_with("req-"));
    }
}
