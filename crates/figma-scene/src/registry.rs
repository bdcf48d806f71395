//! Correlation registry
//!
//! Maps call identifiers to the continuation waiting on them. Two kinds of
//! record exist:
//!
//! - **Pending calls** are settled exactly once by a `return` or `error`
//!   envelope and then removed.
//! - **Callbacks** fire on every `return` carrying their identifier and stay
//!   registered until explicitly forgotten.
//!
//! A single inbound `return` checks both maps independently, so one identifier
//! may settle a pending call and fire a callback at the same time.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};

use figma_scene_common::protocol::error::{BridgeError, Result};
use figma_scene_common::CallId;
use futures_util::future::BoxFuture;
use serde_json::Value as JsonValue;
use tokio::sync::oneshot;

/// Subscriber invoked with each firing's result.
pub type Callback = Arc<dyn Fn(JsonValue) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Default)]
struct RegistryState {
    pending: HashMap<CallId, oneshot::Sender<Result<JsonValue>>>,
    callbacks: HashMap<CallId, Callback>,
}

impl RegistryState {
    fn is_live(&self, id: &CallId) -> bool {
        self.pending.contains_key(id) || self.callbacks.contains_key(id)
    }
}

/// Live pending calls and callbacks for one bridge instance.
///
/// The lock is never held across an await: callbacks are cloned out before
/// they run.
#[derive(Default)]
pub struct Registry {
    state: Mutex<RegistryState>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Produces an identifier not currently live in either map.
    pub fn allocate(&self) -> CallId {
        let state = self.state();
        loop {
            let id = CallId::generate();
            if !state.is_live(&id) {
                return id;
            }
        }
    }

    /// Records a pending call and returns the future that settles with it.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::DuplicateId` if `id` is already live.
    pub fn register_pending(self: &Arc<Self>, id: CallId) -> Result<PendingCall> {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state();
            if state.is_live(&id) {
                return Err(BridgeError::DuplicateId(id.to_string()));
            }
            state.pending.insert(id.clone(), tx);
        }

        Ok(PendingCall {
            id,
            rx,
            registry: Arc::downgrade(self),
            settled: false,
        })
    }

    /// Records a callback fired by every `return` carrying `id`.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::DuplicateId` if `id` is already live.
    pub fn register_callback(&self, id: CallId, callback: Callback) -> Result<()> {
        let mut state = self.state();
        if state.is_live(&id) {
            return Err(BridgeError::DuplicateId(id.to_string()));
        }
        state.callbacks.insert(id, callback);
        Ok(())
    }

    /// Settles the pending call for `id` with `value` and fires its callback.
    ///
    /// Either lookup may miss; an identifier matching nothing is ignored, so
    /// a repeated resolve is a no-op. The callback's future is returned rather
    /// than awaited so the caller decides where it runs; dropping it skips the
    /// firing.
    pub fn resolve(&self, id: &CallId, value: JsonValue) -> Option<BoxFuture<'static, ()>> {
        let (pending, callback) = {
            let mut state = self.state();
            (state.pending.remove(id), state.callbacks.get(id).cloned())
        };

        if pending.is_none() && callback.is_none() {
            tracing::debug!("No live record for {}, return ignored", id);
            return None;
        }

        if let Some(tx) = pending {
            // The caller may have dropped its future already.
            let _ = tx.send(Ok(value.clone()));
        }
        callback.map(|callback| callback(value))
    }

    /// Rejects the pending call for `id`. Returns `false` when nothing was
    /// waiting, in which case the error is dropped.
    pub fn reject(&self, id: &CallId, message: impl Into<String>) -> bool {
        let pending = self.state().pending.remove(id);
        match pending {
            Some(tx) => {
                let _ = tx.send(Err(BridgeError::Remote(message.into())));
                true
            }
            None => {
                tracing::debug!("No pending call for {}, error dropped", id);
                false
            }
        }
    }

    /// Removes any record for `id`. Returns whether one existed.
    pub fn forget(&self, id: &CallId) -> bool {
        let mut state = self.state();
        let pending = state.pending.remove(id).is_some();
        let callback = state.callbacks.remove(id).is_some();
        pending || callback
    }

    pub fn is_live(&self, id: &CallId) -> bool {
        self.state().is_live(id)
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    pub fn callback_count(&self) -> usize {
        self.state().callbacks.len()
    }
}

/// Future for an outstanding call.
///
/// Resolves with the peer's return value or rejects with its error message.
/// Dropping it before it settles removes the registry record, so wrapping
/// it in `tokio::time::timeout` never leaks entries.
pub struct PendingCall {
    id: CallId,
    rx: oneshot::Receiver<Result<JsonValue>>,
    registry: Weak<Registry>,
    settled: bool,
}

impl PendingCall {
    pub fn id(&self) -> &CallId {
        &self.id
    }
}

impl Future for PendingCall {
    type Output = Result<JsonValue>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(outcome) => {
                self.settled = true;
                Poll::Ready(outcome.unwrap_or(Err(BridgeError::Disconnected)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.state().pending.remove(&self.id);
        }
    }
}
