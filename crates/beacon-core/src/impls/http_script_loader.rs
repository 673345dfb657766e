//! HttpScriptLoader - reqwest で script 本文を取得する ScriptLoader 実装
//!
//! ブラウザの `<script>` と同じく、CORS の読み取り許可は見ません。
//! 2xx 以外は読み込み失敗（onerror 相当）として扱います。

use async_trait::async_trait;
use url::Url;

use crate::ports::{ScriptError, ScriptLoader};

#[derive(Debug, Clone, Default)]
pub struct HttpScriptLoader {
    client: reqwest::Client,
}

impl HttpScriptLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScriptLoader for HttpScriptLoader {
    async fn load(&self, src: &Url) -> Result<String, ScriptError> {
        let response = self
            .client
            .get(src.clone())
            .send()
            .await
            .map_err(|e| ScriptError::Load(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScriptError::Load(format!("HTTP {}", status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| ScriptError::Load(e.to_string()))
    }
}
