//! ScriptLoader port - script の読み込み
//!
//! ブラウザの `<script src=...>` 注入に相当します。ローダーは script 本文を
//! 取得するだけで、評価（callback の呼び出し）は transport::callback が行います。
//! script 読み込みでは HTTP status は見えないので、失敗は全て `ScriptError` です。

use async_trait::async_trait;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to load script: {0}")]
    Load(String),

    #[error("script is not a callback invocation: {0}")]
    Malformed(String),

    #[error("script invoked unknown callback `{0}`")]
    UnknownCallback(String),
}

#[async_trait]
pub trait ScriptLoader: Send + Sync {
    /// Fetch the script source at `src`.
    async fn load(&self, src: &Url) -> Result<String, ScriptError>;
}
