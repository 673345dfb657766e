//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID
//! ID は ULID (Universally Unique Lexicographically Sortable Identifier) を使用します。
//! Phantom type パターンで `CallbackId` と `RequestId` を型レベルで区別します。
//!
//! ## なぜ ULID か
//! - **衝突しない**: 80-bit のランダム部分があるので、同一ミリ秒内でも一意
//! - **識別子として安全**: Crockford Base32（英数字のみ）なので、そのまま
//!   script の関数名の一部として使える

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"jsonp_cb_", "req-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData で、実行時にはメモリを消費しませんが、
/// コンパイル時に型安全性を提供します。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Display 形式（プレフィックス + ULID）からの復元
///
/// callback script が呼び出した関数名から CallbackId を引き当てるのに使います。
impl<T: IdMarker> FromStr for Id<T> {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix(T::prefix())
            .ok_or_else(|| ParseIdError(s.to_string()))?;
        let ulid = Ulid::from_string(raw).map_err(|_| ParseIdError(s.to_string()))?;
        Ok(Self::from_ulid(ulid))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a valid identifier: {0}")]
pub struct ParseIdError(pub String);

// ========================================
// マーカー型の定義
// ========================================

/// Callback のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Callback {}

impl IdMarker for Callback {
    fn prefix() -> &'static str {
        "jsonp_cb_"
    }
}

/// Request のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Request {}

impl IdMarker for Request {
    fn prefix() -> &'static str {
        "req-"
    }
}

/// Correlation id of one callback-injection attempt.
/// Its Display form is the function name the backend must call.
pub type CallbackId = Id<Callback>;

/// Identifier of one `resolve` call (tracing only).
pub type RequestId = Id<Request>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_id_is_a_script_identifier() {
        let id = CallbackId::from_ulid(Ulid::new());
        let name = id.to_string();

        assert!(name.starts_with("jsonp_cb_"));
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        assert!(!name.chars().next().unwrap().is_ascii_digit());
    }

    #[test]
    fn display_form_parses_back() {
        let id = CallbackId::from_ulid(Ulid::new());
        let parsed: CallbackId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        let req = RequestId::from_ulid(Ulid::new());
        let err = req.to_string().parse::<CallbackId>().unwrap_err();
        assert!(err.to_string().contains("req-"));

        assert!("jsonp_cb_not-a-ulid".parse::<CallbackId>().is_err());
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<CallbackId>(), size_of::<Ulid>());
        assert_eq!(size_of::<RequestId>(), size_of::<Ulid>());
    }
}
