//! beacon-core
//!
//! Cross-origin transport for a small status board backend.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, request, envelope, outcome, retry, decision, state, errors, status）
//! - **ports**: 抽象化レイヤー（HttpFetch, ScriptLoader, Clock, IdGenerator）
//! - **transport**: 3 つの delivery strategy（direct / relay / callback）と callback registry
//! - **app**: アプリケーションロジック（builder, resolver, config, client）
//! - **impls**: 実装（reqwest ベースの本番用、Scripted* の開発・テスト用）

pub mod app;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod transport;

pub use app::{ResolverBuilder, ResolverConfig, StatusClient, TransportResolver};
pub use domain::{ErrorKind, LogicalRequest, Operation, ResultEnvelope, StrategyKind};
pub use error::BeaconError;
