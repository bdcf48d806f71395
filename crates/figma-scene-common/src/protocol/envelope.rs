//! Envelope Wire Format
//!
//! An [`Envelope`] is the only thing that crosses the boundary between the UI
//! and the sandbox. Field names are fixed for interoperability with the
//! JavaScript side of the bridge:
//!
//! ```text
//! { action: "figma-scene-init" | "figma-scene-run" | "figma-scene-on"
//!         | "figma-scene-return" | "figma-scene-error",
//!   id?, function?, args?, event?, functions?, return?, error? }
//! ```
//!
//! Messages sent from the UI are wrapped under [`PLUGIN_MESSAGE_FIELD`] and
//! addressed to [`WILDCARD_PLUGIN_ID`]; the sandbox sends bare envelopes and
//! the host wraps them on delivery.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::CallId;

/// Field under which the host wraps plugin messages.
pub const PLUGIN_MESSAGE_FIELD: &str = "pluginMessage";

/// Field carrying the addressed plugin.
pub const PLUGIN_ID_FIELD: &str = "pluginId";

/// Recipient marker meaning "any listener"; the host enforces the boundary.
pub const WILDCARD_PLUGIN_ID: &str = "*";

/// The action tag of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Handshake. Sent by the UI on startup, and by the sandbox carrying the
    /// pass-through function names.
    #[serde(rename = "figma-scene-init")]
    Init,
    /// Call request: execute `function` with `args`.
    #[serde(rename = "figma-scene-run")]
    Run,
    /// Subscribe request: execute `function` every time `event` fires.
    #[serde(rename = "figma-scene-on")]
    On,
    /// Successful result for `id`.
    #[serde(rename = "figma-scene-return")]
    Return,
    /// Failure for `id`.
    #[serde(rename = "figma-scene-error")]
    Error,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Init => "figma-scene-init",
            Action::Run => "figma-scene-run",
            Action::On => "figma-scene-on",
            Action::Return => "figma-scene-return",
            Action::Error => "figma-scene-error",
        }
    }
}

/// Which side of the boundary a bridge instance runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The unprivileged panel context.
    Ui,
    /// The privileged context with access to the host document API.
    Sandbox,
}

impl Role {
    /// Resolves the role from a probe for the UI-only global.
    pub fn detect(has_ui_global: bool) -> Self {
        if has_ui_global {
            Role::Ui
        } else {
            Role::Sandbox
        }
    }
}

/// A single protocol message.
///
/// Envelopes are built once through the constructors below and never mutated
/// after being handed to a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CallId>,
    /// Source text of a callable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<String>>,
    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    fn bare(action: Action) -> Self {
        Envelope {
            action,
            id: None,
            function: None,
            args: None,
            event: None,
            functions: None,
            return_value: None,
            error: None,
        }
    }

    /// UI readiness handshake.
    pub fn init() -> Self {
        Self::bare(Action::Init)
    }

    /// Sandbox handshake advertising the pass-through host functions.
    pub fn advertise(functions: Vec<String>) -> Self {
        Envelope {
            functions: Some(functions),
            ..Self::bare(Action::Init)
        }
    }

    pub fn run(id: CallId, function: impl Into<String>, args: JsonValue) -> Self {
        Envelope {
            id: Some(id),
            function: Some(function.into()),
            args: Some(args),
            ..Self::bare(Action::Run)
        }
    }

    pub fn on(id: CallId, event: impl Into<String>, function: impl Into<String>) -> Self {
        Envelope {
            id: Some(id),
            event: Some(event.into()),
            function: Some(function.into()),
            ..Self::bare(Action::On)
        }
    }

    pub fn ret(id: CallId, value: JsonValue) -> Self {
        Envelope {
            id: Some(id),
            return_value: Some(value),
            ..Self::bare(Action::Return)
        }
    }

    /// Error reply. `id` is absent when the failing message carried none.
    pub fn error(id: Option<CallId>, message: impl Into<String>) -> Self {
        Envelope {
            id,
            error: Some(message.into()),
            ..Self::bare(Action::Error)
        }
    }

    /// Extracts an envelope from a raw host message.
    ///
    /// Accepts both the host-wrapped form (`{ pluginMessage: {...} }`) and a
    /// bare envelope. Anything without a recognised `action` marker yields
    /// `None`; such messages belong to other listeners on the same channel.
    pub fn from_message(message: &JsonValue) -> Option<Self> {
        let body = message.get(PLUGIN_MESSAGE_FIELD).unwrap_or(message);
        body.get("action")?.as_str()?;
        serde_json::from_value(body.clone()).ok()
    }

    /// Renders the envelope as the message a given role hands to the host.
    pub fn to_message(&self, role: Role) -> serde_json::Result<JsonValue> {
        let envelope = serde_json::to_value(self)?;
        Ok(match role {
            Role::Ui => {
                let mut wrapper = Map::new();
                wrapper.insert(PLUGIN_MESSAGE_FIELD.to_string(), envelope);
                wrapper.insert(PLUGIN_ID_FIELD.to_string(), JsonValue::from(WILDCARD_PLUGIN_ID));
                JsonValue::Object(wrapper)
            }
            Role::Sandbox => envelope,
        })
    }
}
