//! App - アプリケーション層
//!
//! ports と transport を組み合わせて resolve の流れを実装します。
//!
//! # 主要コンポーネント
//! - **ResolverBuilder**: 設定の検証と strategy のワイヤリング
//! - **TransportResolver**: strategy を順に試し、ResultEnvelope を返す
//! - **StatusClient**: health / statuses / update-status の呼び出し口

pub mod builder;
pub mod client;
pub mod config;
pub mod resolver;

pub use self::builder::{BuildError, ResolverBuilder};
pub use self::client::StatusClient;
pub use self::config::{ConfigError, ResolverConfig};
pub use self::resolver::TransportResolver;
pub use crate::domain::RetryPolicy;
