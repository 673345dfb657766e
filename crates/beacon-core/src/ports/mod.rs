//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部（HTTP, script 読み込み, 時刻, ID 生成）へのインターフェースを提供し、
//! 実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - strategy はポート越しにしか外へ出ない（テストでは impls::scripted に差し替え）
//! - timeout / retry はポートの責務ではない（resolver が一括で持つ）

pub mod clock;
pub mod http_fetch;
pub mod id_generator;
pub mod script_loader;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::http_fetch::{FetchError, FetchResponse, HttpFetch};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::script_loader::{ScriptError, ScriptLoader};
