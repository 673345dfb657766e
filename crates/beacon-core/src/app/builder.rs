//! ResolverBuilder - TransportResolver の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: 設定値・strategy の重複・足りない port は build() で弾く

use std::collections::HashSet;
use std::sync::Arc;

use super::config::{ConfigError, ResolverConfig};
use super::resolver::TransportResolver;
use crate::domain::StrategyKind;
use crate::impls::{HttpScriptLoader, ReqwestFetch};
use crate::ports::{HttpFetch, IdGenerator, ScriptLoader, SystemClock, UlidGenerator};
use crate::transport::{CallbackInjection, CallbackRegistry, DeliveryStrategy, DirectFetch, RelayFetch};

/// ResolverBuilder は TransportResolver を構築
///
/// # 使用例
/// ```ignore
/// let resolver = ResolverBuilder::new()
///     .config(ResolverConfig::from_env()?)
///     .with_reqwest(reqwest::Client::new())
///     .build()?;
/// ```
#[derive(Default)]
pub struct ResolverBuilder {
    config: ResolverConfig,
    http: Option<Arc<dyn HttpFetch>>,
    loader: Option<Arc<dyn ScriptLoader>>,
    ids: Option<Arc<dyn IdGenerator>>,
    client: Option<reqwest::Client>,
}

/// BuildError は resolver 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no delivery strategy configured")]
    NoStrategies,

    #[error("strategy {0} is listed more than once")]
    DuplicateStrategy(StrategyKind),

    #[error("strategy {0} needs a {1} but none was provided")]
    MissingPort(StrategyKind, &'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// HTTP port for the direct and relay strategies.
    pub fn http(mut self, http: Arc<dyn HttpFetch>) -> Self {
        self.http = Some(http);
        self
    }

    /// Script loader for the callback strategy.
    pub fn script_loader(mut self, loader: Arc<dyn ScriptLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Back every port not set explicitly with `client`.
    ///
    /// The HTTP port presents `config.origin` when one is configured.
    pub fn with_reqwest(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// 検証してから組み立てる
    ///
    /// # 検証
    /// - 設定値（ResolverConfig::validate）
    /// - strategy の重複
    /// - 各 strategy に必要な port が揃っているか
    pub fn build(self) -> Result<TransportResolver, BuildError> {
        let ResolverBuilder {
            config,
            mut http,
            mut loader,
            ids,
            client,
        } = self;

        if config.strategies.is_empty() {
            return Err(BuildError::NoStrategies);
        }
        config.validate()?;

        let mut seen = HashSet::new();
        if let Some(dup) = config.strategies.iter().find(|k| !seen.insert(**k)) {
            return Err(BuildError::DuplicateStrategy(*dup));
        }

        if let Some(client) = client {
            if http.is_none() {
                let fetch = match &config.origin {
                    Some(origin) => ReqwestFetch::new(client.clone()).with_origin(origin.clone()),
                    None => ReqwestFetch::new(client.clone()),
                };
                http = Some(Arc::new(fetch));
            }
            if loader.is_none() {
                loader = Some(Arc::new(HttpScriptLoader::new(client)));
            }
        }

        let ids = ids.unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));
        let registry = Arc::new(CallbackRegistry::new());

        let mut strategies: Vec<Arc<dyn DeliveryStrategy>> = Vec::with_capacity(config.strategies.len());
        for kind in &config.strategies {
            let strategy: Arc<dyn DeliveryStrategy> = match kind {
                StrategyKind::DirectFetch => {
                    let http = http.clone().ok_or(BuildError::MissingPort(*kind, "HTTP client"))?;
                    Arc::new(DirectFetch::new(http))
                }
                StrategyKind::RelayFetch => {
                    let http = http.clone().ok_or(BuildError::MissingPort(*kind, "HTTP client"))?;
                    Arc::new(RelayFetch::new(http, config.relay_url()?))
                }
                StrategyKind::CallbackInjection => {
                    let loader = loader
                        .clone()
                        .ok_or(BuildError::MissingPort(*kind, "script loader"))?;
                    Arc::new(CallbackInjection::new(loader, registry.clone(), ids.clone()))
                }
            };
            strategies.push(strategy);
        }

        tracing::debug!(
            order = ?config.strategies,
            max_attempts = config.max_attempts,
            timeout_ms = config.timeout_ms,
            "transport resolver built"
        );

        Ok(TransportResolver {
            strategies,
            policy: config.retry_policy(),
            timeout: config.timeout(),
            retry_mutations: config.retry_mutations,
            ids,
            registry,
        })
    }
}
