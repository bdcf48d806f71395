pub mod context;

mod bindings;
mod conversions;


use std::sync::Arc;

use figma_scene_common::protocol::error::{BridgeError, Result};
use serde_json::Value as JsonValue;

use crate::host::HostApi;
use crate::limits::ScriptLimits;

pub use context::ScriptContext;
pub use conversions::{js_value_to_json, json_to_js_value};

/// Executes marshaled callables against a host.
///
/// Cheap to clone. Each call gets its own [`ScriptContext`] on a blocking
/// thread so a long-running callable never stalls the dispatcher.
#[derive(Clone)]
pub struct ScriptRuntime {
    host: Arc<dyn HostApi>,
    limits: ScriptLimits,
}

impl ScriptRuntime {
    pub fn new(host: Arc<dyn HostApi>, limits: ScriptLimits) -> Self {
        Self { host, limits }
    }

    pub fn host(&self) -> &Arc<dyn HostApi> {
        &self.host
    }

    pub fn limits(&self) -> &ScriptLimits {
        &self.limits
    }

    /// Runs `source` with `args` and returns the settled value.
    ///
    /// # Errors
    ///
    /// - `BridgeError::ScriptExecution` when the callable fails
    /// - `BridgeError::Timeout` when it outlives `execution_timeout`
    ///
    /// A timeout only abandons the result. The engine cannot be interrupted,
    /// so the callable keeps its blocking thread until it finishes or hits a
    /// loop or recursion limit, and shutting the tokio runtime down waits for
    /// it. `ScriptLimits::loop_iteration_limit` is what bounds that thread.
    pub async fn execute(&self, source: &str, args: JsonValue) -> Result<JsonValue> {
        let host = Arc::clone(&self.host);
        let limits = self.limits.clone();
        let source = source.to_string();
        let timeout = self.limits.execution_timeout;

        let task = tokio::task::spawn_blocking(move || {
            let mut ctx = ScriptContext::new(host, &limits)?;
            ctx.execute(&source, args)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(BridgeError::ScriptExecution(format!("Script task failed: {}", e))),
            Err(_) => {
                tracing::warn!("Callable exceeded {}ms", timeout.as_millis());
                Err(BridgeError::Timeout(timeout.as_millis() as u64))
            }
        }
    }
}
