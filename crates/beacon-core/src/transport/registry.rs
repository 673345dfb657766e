//! CallbackRegistry - correlation id から待機中の完了ハンドルへの対応表
//!
//! ブラウザではグローバルな関数名で callback を登録しますが、ここでは resolver が
//! 所有する表で代替します。登録と script 注入はどちらも guard 型で表され、
//! guard が drop された時点（成功・失敗・timeout のいずれでも）で必ず解放されます。

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::domain::CallbackId;
use crate::ports::{IdGenerator, ScriptError};

#[derive(Default)]
pub struct CallbackRegistry {
    pending: Mutex<HashMap<CallbackId, oneshot::Sender<serde_json::Value>>>,
    scripts: AtomicUsize,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<CallbackId, oneshot::Sender<serde_json::Value>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `id`. Returns `None` if the id is already taken.
    pub fn register(self: &Arc<Self>, id: CallbackId) -> Option<PendingCallback> {
        let (tx, rx) = oneshot::channel();
        let mut table = self.table();
        if table.contains_key(&id) {
            return None;
        }
        table.insert(id, tx);
        Some(PendingCallback {
            id,
            rx,
            registry: Arc::clone(self),
        })
    }

    /// Register under a freshly generated id, drawing again on collision.
    pub fn register_fresh(self: &Arc<Self>, ids: &dyn IdGenerator) -> PendingCallback {
        loop {
            if let Some(pending) = self.register(ids.generate_callback_id()) {
                return pending;
            }
            tracing::warn!("callback id collision, drawing a new one");
        }
    }

    /// Hand `payload` to the callback registered under `name`.
    ///
    /// The registration is consumed; a second delivery to the same name fails.
    pub fn deliver(&self, name: &str, payload: serde_json::Value) -> Result<(), ScriptError> {
        let unknown = || ScriptError::UnknownCallback(name.to_string());
        let id: CallbackId = name.parse().map_err(|_| unknown())?;
        let sender = self.table().remove(&id).ok_or_else(unknown)?;
        // receiver gone means the attempt already settled
        sender.send(payload).map_err(|_| unknown())
    }

    /// Start a script load/evaluation in the background.
    pub fn inject<F>(self: &Arc<Self>, script: F) -> InjectedScript
    where
        F: Future<Output = Result<(), ScriptError>> + Send + 'static,
    {
        self.scripts.fetch_add(1, Ordering::SeqCst);
        InjectedScript {
            handle: tokio::spawn(script),
            registry: Arc::clone(self),
        }
    }

    /// Callbacks still waiting for a payload.
    pub fn pending(&self) -> usize {
        self.table().len()
    }

    /// Scripts injected and not yet removed.
    pub fn injected_scripts(&self) -> usize {
        self.scripts.load(Ordering::SeqCst)
    }

    fn deregister(&self, id: &CallbackId) {
        self.table().remove(id);
    }
}

/// A registered callback awaiting delivery. Deregisters on drop.
pub struct PendingCallback {
    id: CallbackId,
    rx: oneshot::Receiver<serde_json::Value>,
    registry: Arc<CallbackRegistry>,
}

impl PendingCallback {
    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// Wait for the payload. `None` if the registration was dropped without one.
    pub async fn wait(&mut self) -> Option<serde_json::Value> {
        (&mut self.rx).await.ok()
    }

    /// Take the payload if it has already arrived.
    pub fn try_take(&mut self) -> Option<serde_json::Value> {
        self.rx.try_recv().ok()
    }
}

impl Drop for PendingCallback {
    fn drop(&mut self) {
        self.registry.deregister(&self.id);
    }
}

/// A script running in the background. Removed (aborted) on drop.
pub struct InjectedScript {
    handle: JoinHandle<Result<(), ScriptError>>,
    registry: Arc<CallbackRegistry>,
}

impl InjectedScript {
    /// Wait until the script has loaded and run. Call at most once.
    pub async fn finished(&mut self) -> Result<(), ScriptError> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) => Err(ScriptError::Load(format!("script task ended: {e}"))),
        }
    }
}

impl Drop for InjectedScript {
    fn drop(&mut self) {
        self.handle.abort();
        self.registry.scripts.fetch_sub(1, Ordering::SeqCst);
    }
}
