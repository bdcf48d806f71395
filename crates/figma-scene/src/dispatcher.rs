//! Inbound envelope routing
//!
//! One dispatcher runs per bridge. It consumes the inbound envelope stream in
//! arrival order and routes each envelope by action:
//!
//! | action | UI | sandbox |
//! |--------|----|---------|
//! | `figma-scene-run` | `Not implemented` | execute, reply `return`/`error` |
//! | `figma-scene-on` | `Not implemented` | listen, reply `return` per firing |
//! | `figma-scene-return` | resolve | resolve |
//! | `figma-scene-error` | reject | reject |
//! | `figma-scene-init` | record advertised functions | `Not implemented` |
//!
//! Calls and subscriptions run on their own tasks so a slow callable never
//! holds up later envelopes. Returns are settled inline and their callbacks
//! queued on a single worker, so firings reach a callback in arrival order
//! and a callback may itself await `run`.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use figma_scene_common::protocol::error::{BridgeError, Result};
use figma_scene_common::transport::{Envelopes, TransportAdapter};
use figma_scene_common::{Action, CallId, Envelope, Role};
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::{json, Value as JsonValue};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::registry::Registry;
use crate::sandbox::SandboxExecutor;

/// Pass-through names the sandbox advertised in its handshake.
///
/// `None` until the handshake arrives.
#[derive(Default)]
pub(crate) struct AdvertisedFunctions {
    names: Mutex<Option<HashSet<String>>>,
}

impl AdvertisedFunctions {
    pub(crate) fn record(&self, names: Vec<String>) {
        let mut guard = self.names.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(names.into_iter().collect());
    }

    pub(crate) fn snapshot(&self) -> Option<HashSet<String>> {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a forwarded call to `name` may be sent. Everything is allowed
    /// before the handshake, since it may still be in flight.
    pub(crate) fn permits(&self, name: &str) -> bool {
        match &*self.names.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(names) => names.contains(name),
            None => true,
        }
    }
}

pub(crate) struct Dispatcher {
    transport: TransportAdapter,
    registry: Arc<Registry>,
    executor: Option<SandboxExecutor>,
    advertised: Arc<AdvertisedFunctions>,
    handle: Handle,
}

impl Dispatcher {
    pub(crate) fn new(
        transport: TransportAdapter,
        registry: Arc<Registry>,
        executor: Option<SandboxExecutor>,
        advertised: Arc<AdvertisedFunctions>,
        handle: Handle,
    ) -> Self {
        Self {
            transport,
            registry,
            executor,
            advertised,
            handle,
        }
    }

    /// Consumes envelopes until the channel closes.
    pub(crate) async fn run(self, mut envelopes: Envelopes) {
        let (callbacks, mut pending_callbacks) = mpsc::unbounded_channel::<BoxFuture<'static, ()>>();
        self.handle.spawn(async move {
            while let Some(firing) = pending_callbacks.recv().await {
                // A panicking callback must not take the other subscriptions down with it.
                if AssertUnwindSafe(firing).catch_unwind().await.is_err() {
                    tracing::error!("Callback panicked, continuing with the next firing");
                }
            }
        });

        while let Some(envelope) = envelopes.next().await {
            let id = envelope.id.clone();
            let action = envelope.action;
            if let Err(e) = self.route(envelope, &callbacks) {
                match &e {
                    BridgeError::InvalidEnvelope(_) => {
                        tracing::trace!("Dropping malformed {}: {}", action.as_str(), e)
                    }
                    _ => tracing::error!("Failed to route {}: {}", action.as_str(), e),
                }
                if id.is_some() {
                    self.send(&Envelope::error(id, e.peer_message()));
                }
            }
        }

        tracing::debug!("Inbound channel closed, dispatcher stopping");
    }

    fn route(
        &self,
        envelope: Envelope,
        callbacks: &mpsc::UnboundedSender<BoxFuture<'static, ()>>,
    ) -> Result<()> {
        tracing::debug!(
            "Received {} (id: {:?})",
            envelope.action.as_str(),
            envelope.id.as_ref().map(|id| id.as_str())
        );

        match (envelope.action, self.transport.role()) {
            (Action::Return, _) => {
                let id = require_id(&envelope)?;
                let value = envelope.return_value.unwrap_or(JsonValue::Null);
                if let Some(firing) = self.registry.resolve(&id, value) {
                    if callbacks.send(firing).is_err() {
                        tracing::warn!("Callback worker is gone, firing for {} dropped", id);
                    }
                }
                Ok(())
            }
            (Action::Error, _) => {
                let message = envelope.error.unwrap_or_default();
                match envelope.id {
                    Some(id) => {
                        self.registry.reject(&id, message);
                    }
                    // The sandbox answers the handshake this way.
                    None => tracing::debug!("Ignoring error without id: {}", message),
                }
                Ok(())
            }
            (Action::Init, Role::Ui) => {
                let functions = envelope.functions.unwrap_or_default();
                tracing::info!("Sandbox advertised {} host functions", functions.len());
                self.advertised.record(functions);
                Ok(())
            }
            (Action::Init, Role::Sandbox) => {
                tracing::warn!("Ignoring handshake sent to the sandbox");
                self.send(&Envelope::error(envelope.id, BridgeError::NotImplemented.to_string()));
                Ok(())
            }
            (Action::Run, Role::Sandbox) => self.handle_run(envelope),
            (Action::On, Role::Sandbox) => self.handle_on(envelope),
            (Action::Run | Action::On, Role::Ui) => Err(BridgeError::NotImplemented),
        }
    }

    fn executor(&self) -> Result<&SandboxExecutor> {
        self.executor.as_ref().ok_or(BridgeError::NotImplemented)
    }

    fn handle_run(&self, envelope: Envelope) -> Result<()> {
        let id = require_id(&envelope)?;
        let function = envelope
            .function
            .ok_or_else(|| BridgeError::InvalidEnvelope("run without function".to_string()))?;
        let args = envelope.args.unwrap_or(JsonValue::Null);
        let executor = self.executor()?.clone();
        let transport = self.transport.clone();

        self.handle.spawn(async move {
            let reply = match executor.execute(&function, args).await {
                Ok(value) => Envelope::ret(id, value),
                Err(e) => {
                    tracing::debug!("Call {} failed: {}", id, e);
                    Envelope::error(Some(id), e.peer_message())
                }
            };
            if let Err(e) = transport.send(&reply) {
                tracing::error!("Failed to send reply: {}", e);
            }
        });

        Ok(())
    }

    fn handle_on(&self, envelope: Envelope) -> Result<()> {
        let id = require_id(&envelope)?;
        let event = envelope
            .event
            .ok_or_else(|| BridgeError::InvalidEnvelope("subscription without event".to_string()))?;
        let function = envelope
            .function
            .ok_or_else(|| BridgeError::InvalidEnvelope("subscription without function".to_string()))?;
        let executor = self.executor()?.clone();
        executor.admit(&function)?;
        let mut firings = executor.listen(&event)?;
        let transport = self.transport.clone();

        tracing::debug!("Subscribed {} to {}", id, event);

        self.handle.spawn(async move {
            while firings.recv().await.is_some() {
                match executor.execute(&function, json!([])).await {
                    Ok(value) => {
                        if let Err(e) = transport.send(&Envelope::ret(id.clone(), value)) {
                            tracing::error!("Failed to send {} firing: {}", event, e);
                        }
                    }
                    Err(e) => tracing::warn!("Handler for {} failed: {}", event, e),
                }
            }
            tracing::debug!("Event stream for {} ended", event);
        });

        Ok(())
    }

    fn send(&self, envelope: &Envelope) {
        if let Err(e) = self.transport.send(envelope) {
            tracing::error!("Failed to send {}: {}", envelope.action.as_str(), e);
        }
    }
}

fn require_id(envelope: &Envelope) -> Result<CallId> {
    envelope.id.clone().ok_or_else(|| {
        BridgeError::InvalidEnvelope(format!("{} without id", envelope.action.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_everything_permitted_before_handshake() {
        let advertised = AdvertisedFunctions::default();
        assert!(advertised.permits("createRectangle"));
        assert!(advertised.snapshot().is_none());
    }

    #[test]
    fn test_handshake_narrows_permitted_names() {
        let advertised = AdvertisedFunctions::default();
        advertised.record(vec!["createRectangle".to_string()]);

        assert!(advertised.permits("createRectangle"));
        assert!(!advertised.permits("closePlugin"));
    }

    #[test]
    fn test_require_id() {
        assert!(matches!(require_id(&Envelope::init()), Err(BridgeError::InvalidEnvelope(_))));
        let envelope = Envelope::ret(CallId::from("abc"), JsonValue::Null);
        assert_eq!(require_id(&envelope).unwrap(), CallId::from("abc"));
    }
}
