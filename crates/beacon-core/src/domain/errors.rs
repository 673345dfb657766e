//! Errors - 失敗の分類
//!
//! ErrorKind は `ResultEnvelope` に載る失敗の種類です。
//! resolve は `Err` を返さないので、呼び出し側が見る失敗は全てこの enum で表現されます。

use serde::{Deserialize, Serialize};

/// Classification of a failed attempt or a failed resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Endpoint is not an absolute URL. Nothing was sent.
    InvalidEndpoint,

    /// Direct fetch completed but the body is unreadable.
    OpaqueResponse,

    /// The relay answered, but the status it reports for the target was not 200.
    RelayApplicationError,

    /// A body was obtained but could not be decoded.
    MalformedPayload,

    /// A real HTTP response with a non-2xx status.
    UnexpectedStatus,

    Timeout,

    NetworkError,

    AllStrategiesExhausted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidEndpoint => "invalid endpoint",
            ErrorKind::OpaqueResponse => "opaque response",
            ErrorKind::RelayApplicationError => "relay application error",
            ErrorKind::MalformedPayload => "malformed payload",
            ErrorKind::UnexpectedStatus => "unexpected status",
            ErrorKind::Timeout => "timeout",
            ErrorKind::NetworkError => "network error",
            ErrorKind::AllStrategiesExhausted => "all strategies exhausted",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_serializes_camel_case() {
        let s = serde_json::to_string(&ErrorKind::AllStrategiesExhausted).unwrap();
        assert_eq!(s, "\"allStrategiesExhausted\"");

        let s = serde_json::to_string(&ErrorKind::InvalidEndpoint).unwrap();
        assert_eq!(s, "\"invalidEndpoint\"");
    }
}
