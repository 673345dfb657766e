//! Script injection with a named callback.
//!
//! Each attempt registers a fresh callback name, loads
//! `<target>&callback=<name>` as a script and waits for the script to call
//! `<name>(<json>)`. The backend must answer in that form; status codes are
//! invisible here, so a delivered payload always counts as HTTP 200.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::DeliveryStrategy;
use super::registry::CallbackRegistry;
use crate::domain::{AttemptOutcome, CallbackId, ErrorKind, StrategyKind};
use crate::ports::{IdGenerator, ScriptError, ScriptLoader};

/// Split a callback script into function name and JSON argument.
///
/// Accepts `name(json)`, optionally preceded by `/**/` and followed by `;`.
pub fn parse_invocation(source: &str) -> Result<(&str, serde_json::Value), ScriptError> {
    let malformed = |why: &str| ScriptError::Malformed(why.to_string());

    let mut body = source.trim();
    if let Some(rest) = body.strip_prefix("/**/") {
        body = rest.trim_start();
    }
    let body = body.strip_suffix(';').unwrap_or(body).trim_end();

    let open = body.find('(').ok_or_else(|| malformed("no call expression"))?;
    let name = body[..open].trim();
    let is_ident = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if !is_ident {
        return Err(malformed("callee is not an identifier"));
    }

    let args = body[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| malformed("unterminated call"))?;
    let payload = serde_json::from_str(args).map_err(|e| ScriptError::Malformed(e.to_string()))?;
    Ok((name, payload))
}

/// Run a script loaded for callback `own`: deliver its argument if it calls `own`.
///
/// A script naming any other callback, even one registered by a concurrent
/// attempt, is rejected and the registry is left untouched.
pub fn evaluate(source: &str, own: CallbackId, registry: &CallbackRegistry) -> Result<(), ScriptError> {
    let (name, payload) = parse_invocation(source)?;
    if name.parse::<CallbackId>().ok() != Some(own) {
        return Err(ScriptError::UnknownCallback(name.to_string()));
    }
    registry.deliver(name, payload)
}

enum Settled {
    Callback(Option<serde_json::Value>),
    Script(Result<(), ScriptError>),
}

pub struct CallbackInjection {
    loader: Arc<dyn ScriptLoader>,
    registry: Arc<CallbackRegistry>,
    ids: Arc<dyn IdGenerator>,
}

impl CallbackInjection {
    pub fn new(
        loader: Arc<dyn ScriptLoader>,
        registry: Arc<CallbackRegistry>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            loader,
            registry,
            ids,
        }
    }

    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }
}

#[async_trait]
impl DeliveryStrategy for CallbackInjection {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CallbackInjection
    }

    async fn attempt(&self, target: &Url) -> AttemptOutcome {
        // Both guards release their resources when this future completes or is dropped.
        let mut pending = self.registry.register_fresh(self.ids.as_ref());
        let own = pending.id();
        let name = own.to_string();

        let mut src = target.clone();
        src.query_pairs_mut().append_pair("callback", &name);

        let loader = Arc::clone(&self.loader);
        let registry = Arc::clone(&self.registry);
        let mut script = self.registry.inject(async move {
            let source = loader.load(&src).await?;
            evaluate(&source, own, &registry)
        });

        let settled = tokio::select! {
            biased;
            payload = pending.wait() => Settled::Callback(payload),
            finished = script.finished() => Settled::Script(finished),
        };

        match settled {
            Settled::Callback(Some(data)) => AttemptOutcome::delivered(data, 200),
            Settled::Callback(None) => AttemptOutcome::no_response(ErrorKind::NetworkError),
            Settled::Script(Ok(())) => match pending.try_take() {
                Some(data) => AttemptOutcome::delivered(data, 200),
                None => AttemptOutcome::no_response(ErrorKind::MalformedPayload),
            },
            Settled::Script(Err(ScriptError::Load(msg))) => {
                tracing::debug!(callback = %name, error = %msg, "callback script failed to load");
                AttemptOutcome::no_response(ErrorKind::NetworkError)
            }
            Settled::Script(Err(e)) => {
                tracing::debug!(callback = %name, error = %e, "callback script did not deliver");
                AttemptOutcome::no_response(ErrorKind::MalformedPayload)
            }
        }
    }
}
