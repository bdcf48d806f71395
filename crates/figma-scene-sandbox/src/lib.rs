//! figma-scene sandbox runtime
//!
//! This crate executes marshaled callables on the sandbox side of the bridge
//! using the Boa JavaScript engine. Callables see a `figma` global whose
//! members forward to a [`HostApi`] supplied by the embedding application.
//!
//! # Example
//!
//! ```no_run
//! use figma_scene_sandbox::{HostApi, HostEvents, ScriptLimits, ScriptRuntime};
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
//! # async fn run() -> figma_scene_common::Result<()> {
//! let runtime = ScriptRuntime::new(Arc::new(Document), ScriptLimits::default());
//! let six = runtime.execute("(x) => x + 1", json!(5)).await?;
//! assert_eq!(six, json!(6));
//! # Ok(())
//! # }
//! ```

pub mod host;
pub mod limits;
pub mod runtime;

pub use host::{HostApi, HostEvents};
pub use limits::ScriptLimits;
pub use runtime::{ScriptContext, ScriptRuntime};
