//! Impls - ポートの実装
//!
//! # 含まれる実装
//! - **ReqwestFetch**: reqwest による HttpFetch（CORS 読み取り許可の再現付き）
//! - **HttpScriptLoader**: reqwest による ScriptLoader
//! - **ScriptedFetch / ScriptedLoader**: 開発・テスト用（ネットワークなし）

pub mod http_script_loader;
pub mod reqwest_fetch;
pub mod scripted;

// 主要な型を再エクスポート
pub use self::http_script_loader::HttpScriptLoader;
pub use self::reqwest_fetch::ReqwestFetch;
pub use self::scripted::{ScriptedFetch, ScriptedLoader};
