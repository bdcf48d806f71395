//! figma-scene
//!
//! A typed RPC and event bridge between the two isolated contexts of a
//! plugin: the unprivileged UI panel and the privileged sandbox that owns the
//! host document API.
//!
//! # Overview
//!
//! - [`Bridge::run`] ships a self-contained callable and its arguments to the
//!   sandbox, which executes it and replies with the result or the thrown
//!   message.
//! - [`Bridge::on`] subscribes a callable to a host event; every firing runs
//!   it in the sandbox and delivers the result to a local callback.
//! - Convenience methods (`notify`, `resize_ui`, `current_user`, client
//!   storage, ...) are fixed callables from [`scripts`] sent through `run`.
//! - [`Bridge::call_host`] forwards to top-level host functions from the
//!   [`HostFunction`] catalog.
//!
//! # Example
//!
//! ```no_run
//! use figma_scene::BridgeBuilder;
//! use figma_scene_common::transport::MemoryChannel;
//! use figma_scene_sandbox::{HostApi, HostEvents};
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct Document;
//!
//! impl HostApi for Document {
//!     fn invoke(&self, _function: &str, _args: Vec<Value>) -> Result<Value, String> {
//!         Ok(Value::Null)
//!     }
//!
//!     fn listen(&self, event: &str) -> Result<HostEvents, String> {
//!         Err(format!("no such event: {}", event))
//!     }
//! }
//!
//! # async fn demo() -> figma_scene_common::Result<()> {
//! let (ui_channel, sandbox_channel) = MemoryChannel::pair();
//! let sandbox = BridgeBuilder::new(sandbox_channel).host(Arc::new(Document)).build()?;
//! sandbox.init();
//!
//! let ui = BridgeBuilder::new(ui_channel).build()?;
//! let six: i64 = ui.run("(x) => x + 1", json!(5)).await?;
//! assert_eq!(six, 6);
//!
//! ui.notify("Done", None).await?;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod host_functions;
pub mod registry;
pub mod scripts;

mod dispatcher;
mod sandbox;

pub use bridge::{Bridge, BridgeBuilder, NotifyOptions, Subscription, User};
pub use config::{BridgeConfig, ScriptPolicy};
pub use host_functions::HostFunction;
pub use registry::{Callback, PendingCall, Registry};
