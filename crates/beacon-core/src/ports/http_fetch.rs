//! HttpFetch port - クロスオリジン GET の抽象化
//!
//! ブラウザの fetch と同じく、レスポンスが「読めない」(opaque) 場合があります。
//! その場合 `body` は `None` になり、status は 0 として報告されます。

use async_trait::async_trait;
use url::Url;

/// A completed HTTP exchange as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    /// `None` when the server did not grant read permission.
    pub body: Option<String>,
}

impl FetchResponse {
    pub fn readable(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(body.into()),
        }
    }

    pub fn opaque() -> Self {
        Self {
            status: 0,
            body: None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.body.is_none()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
}

/// HttpFetch は GET を 1 回発行する
///
/// timeout と retry は呼び出し側（resolver）の責務なので、実装は持たない。
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError>;
}
