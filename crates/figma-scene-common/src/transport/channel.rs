//! Cross-context message channels
//!
//! A [`Channel`] is the host's raw message primitive: it posts JSON messages
//! to the other context and hands every inbound message to exactly one
//! listener. Delivery is FIFO per channel and fire-and-forget; when the peer
//! has been torn down, posted messages are silently dropped.

use serde_json::Value as JsonValue;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

use crate::protocol::error::{BridgeError, Result};
use crate::protocol::{Role, PLUGIN_MESSAGE_FIELD};

/// Inbound message queue handed to the single registered listener.
pub type Inbound = mpsc::UnboundedReceiver<JsonValue>;

/// The host's cross-context messaging primitive.
pub trait Channel: Send + Sync {
    /// Posts a message to the peer context. Never blocks, never fails.
    fn post(&self, message: JsonValue);

    /// Registers the single inbound listener.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::ListenerTaken` if the listener was already taken.
    fn take_inbound(&self) -> Result<Inbound>;
}

/// Holder for the inbound half of a channel, given out at most once.
pub(crate) struct InboundSlot(Mutex<Option<Inbound>>);

impl InboundSlot {
    pub(crate) fn new(inbound: Inbound) -> Self {
        Self(Mutex::new(Some(inbound)))
    }

    pub(crate) fn take(&self) -> Result<Inbound> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(BridgeError::ListenerTaken)
    }
}

/// In-process channel connecting a UI end to a sandbox end.
///
/// Models the plugin host's delivery rules:
///
/// - the UI posts `{ pluginMessage, pluginId }`; the sandbox receives only the
///   `pluginMessage` body, and UI messages without one never reach it
/// - the sandbox posts a bare message; the UI receives it wrapped as
///   `{ pluginMessage: message }`
///
/// # Example
///
/// ```
/// use figma_scene_common::transport::{Channel, MemoryChannel};
/// use serde_json::json;
///
/// let (ui, sandbox) = MemoryChannel::pair();
/// let mut inbound = sandbox.take_inbound().unwrap();
///
/// ui.post(json!({"pluginMessage": {"action": "figma-scene-init"}, "pluginId": "*"}));
/// assert_eq!(inbound.try_recv().unwrap(), json!({"action": "figma-scene-init"}));
/// ```
pub struct MemoryChannel {
    role: Role,
    outbound: mpsc::UnboundedSender<JsonValue>,
    inbound: InboundSlot,
}

impl MemoryChannel {
    /// Creates a connected `(ui, sandbox)` pair.
    pub fn pair() -> (MemoryChannel, MemoryChannel) {
        let (to_sandbox, sandbox_inbound) = mpsc::unbounded_channel();
        let (to_ui, ui_inbound) = mpsc::unbounded_channel();

        let ui = MemoryChannel {
            role: Role::Ui,
            outbound: to_sandbox,
            inbound: InboundSlot::new(ui_inbound),
        };
        let sandbox = MemoryChannel {
            role: Role::Sandbox,
            outbound: to_ui,
            inbound: InboundSlot::new(sandbox_inbound),
        };

        (ui, sandbox)
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl Channel for MemoryChannel {
    fn post(&self, message: JsonValue) {
        let delivered = match self.role {
            Role::Ui => match message {
                JsonValue::Object(mut fields) => match fields.remove(PLUGIN_MESSAGE_FIELD) {
                    Some(body) => body,
                    None => {
                        tracing::trace!("Dropping UI message without {}", PLUGIN_MESSAGE_FIELD);
                        return;
                    }
                },
                _ => {
                    tracing::trace!("Dropping non-object UI message");
                    return;
                }
            },
            Role::Sandbox => {
                let mut wrapper = serde_json::Map::new();
                wrapper.insert(PLUGIN_MESSAGE_FIELD.to_string(), message);
                JsonValue::Object(wrapper)
            }
        };

        if self.outbound.send(delivered).is_err() {
            tracing::debug!("Peer context is gone, message dropped");
        }
    }

    fn take_inbound(&self) -> Result<Inbound> {
        self.inbound.take()
    }
}
