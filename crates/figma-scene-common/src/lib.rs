//! figma-scene Common Types and Transport
//!
//! This crate provides the envelope protocol and the transports shared by both
//! ends of the figma-scene bridge.
//!
//! # Overview
//!
//! A plugin runs in two isolated contexts: a privileged sandbox with the host
//! document API, and an unprivileged UI panel. They only talk through an
//! asynchronous message primitive. This crate defines what travels over it:
//!
//! - **Protocol Layer**: [`Envelope`], [`Action`], [`CallId`], [`Role`] and [`BridgeError`]
//! - **Transport Layer**: the [`Channel`](transport::Channel) abstraction and its
//!   in-memory and byte-stream implementations
//!
//! # Wire Format
//!
//! Envelopes are JSON objects with fixed field names so they interoperate
//! with the JavaScript implementation of the bridge:
//!
//! ```text
//! { action: "figma-scene-run", id: "…", function: "(x) => x + 1", args: 5 }
//! { action: "figma-scene-return", id: "…", return: 6 }
//! ```
//!
//! # Example
//!
//! ```
//! use figma_scene_common::{CallId, Envelope};
//! use serde_json::json;
//!
//! let call = Envelope::run(CallId::generate(), "(x) => x + 1", json!(5));
//! let reply = Envelope::ret(call.id.clone().unwrap(), json!(6));
//! assert_eq!(reply.return_value, Some(json!(6)));
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
