//! ScriptedFetch / ScriptedLoader - 開発・テスト用のポート実装
//!
//! ネットワークに出ずに、あらかじめ決めた応答を返します。
//!
//! # 学習ポイント
//! - URL prefix ごとの応答キュー（一度きりの応答 + 以降ずっと返す既定応答）
//! - `Hang` で timeout を再現（tokio の paused time と組み合わせて使う）

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::ports::{FetchError, FetchResponse, HttpFetch, ScriptError, ScriptLoader};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
enum Step {
    Reply(Result<FetchResponse, FetchError>),
    Hang,
}

#[derive(Debug)]
struct Route {
    prefix: String,
    queue: VecDeque<Step>,
    fallback: Option<Step>,
}

/// HttpFetch that answers from per-prefix scripts.
///
/// The route with the longest matching prefix wins. Queued replies are used
/// once, in order; after that the route's standing reply (if any) repeats.
/// An unmatched URL fails with a network error.
#[derive(Debug, Default)]
pub struct ScriptedFetch {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<Url>>,
}

impl ScriptedFetch {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(&self, prefix: &str, edit: impl FnOnce(&mut Route)) {
        let mut routes = lock(&self.routes);
        match routes.iter_mut().find(|r| r.prefix == prefix) {
            Some(route) => edit(route),
            None => {
                let mut route = Route {
                    prefix: prefix.to_string(),
                    queue: VecDeque::new(),
                    fallback: None,
                };
                edit(&mut route);
                routes.push(route);
            }
        }
    }

    /// Queue a one-time reply for URLs starting with `prefix`.
    pub fn push(&self, prefix: &str, reply: Result<FetchResponse, FetchError>) {
        self.route(prefix, |r| r.queue.push_back(Step::Reply(reply)));
    }

    /// Reply the same way every time once the queue is drained.
    pub fn always(&self, prefix: &str, reply: Result<FetchResponse, FetchError>) {
        self.route(prefix, |r| r.fallback = Some(Step::Reply(reply)));
    }

    /// Never answer.
    pub fn hang(&self, prefix: &str) {
        self.route(prefix, |r| r.fallback = Some(Step::Hang));
    }

    /// Every URL requested so far.
    pub fn calls(&self) -> Vec<Url> {
        lock(&self.calls).clone()
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|u| u.as_str().starts_with(prefix))
            .count()
    }

    fn next_step(&self, url: &Url) -> Option<Step> {
        let mut routes = lock(&self.routes);
        let route = routes
            .iter_mut()
            .filter(|r| url.as_str().starts_with(&r.prefix))
            .max_by_key(|r| r.prefix.len())?;
        route.queue.pop_front().or_else(|| route.fallback.clone())
    }
}

#[async_trait]
impl HttpFetch for ScriptedFetch {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        lock(&self.calls).push(url.clone());
        match self.next_step(url) {
            Some(Step::Reply(reply)) => reply,
            Some(Step::Hang) => std::future::pending().await,
            None => Err(FetchError::Network(format!("no scripted reply for {url}"))),
        }
    }
}

type PayloadFn = dyn Fn(&Url) -> serde_json::Value + Send + Sync;

enum LoaderMode {
    /// Answer `<callback>(<payload>)` using the `callback` query parameter.
    Echo(Arc<PayloadFn>),
    Raw(String),
    Fail(String),
    Hang,
}

/// ScriptLoader that plays the backend's callback-wrapping role.
pub struct ScriptedLoader {
    mode: LoaderMode,
    delay: Duration,
    calls: Mutex<Vec<Url>>,
}

impl ScriptedLoader {
    fn with_mode(mode: LoaderMode) -> Self {
        Self {
            mode,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn echo(payload: serde_json::Value) -> Self {
        Self::with_mode(LoaderMode::Echo(Arc::new(move |_: &Url| payload.clone())))
    }

    /// Echo a payload computed from the requested URL.
    pub fn echo_with(f: impl Fn(&Url) -> serde_json::Value + Send + Sync + 'static) -> Self {
        Self::with_mode(LoaderMode::Echo(Arc::new(f)))
    }

    pub fn raw(source: impl Into<String>) -> Self {
        Self::with_mode(LoaderMode::Raw(source.into()))
    }

    pub fn failing(msg: impl Into<String>) -> Self {
        Self::with_mode(LoaderMode::Fail(msg.into()))
    }

    pub fn hanging() -> Self {
        Self::with_mode(LoaderMode::Hang)
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Url> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl ScriptLoader for ScriptedLoader {
    async fn load(&self, src: &Url) -> Result<String, ScriptError> {
        lock(&self.calls).push(src.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.mode {
            LoaderMode::Echo(payload) => {
                let callback = src
                    .query_pairs()
                    .find(|(k, _)| k == "callback")
                    .map(|(_, v)| v.into_owned())
                    .ok_or_else(|| ScriptError::Load("no callback parameter".to_string()))?;
                Ok(format!("{callback}({})", payload.as_ref()(src)))
            }
            LoaderMode::Raw(source) => Ok(source.clone()),
            LoaderMode::Fail(msg) => Err(ScriptError::Load(msg.clone())),
            LoaderMode::Hang => std::future::pending().await,
        }
    }
}
