use std::sync::Arc;

use figma_scene_common::protocol::error::{BridgeError, Result};
use figma_scene_sandbox::{HostApi, HostEvents, ScriptRuntime};
use serde_json::Value as JsonValue;

use crate::config::{BridgeConfig, ScriptPolicy};

/// Sandbox-side executor: the script runtime guarded by the script policy.
#[derive(Clone)]
pub(crate) struct SandboxExecutor {
    runtime: ScriptRuntime,
    policy: ScriptPolicy,
}

impl SandboxExecutor {
    pub(crate) fn new(host: Arc<dyn HostApi>, config: &BridgeConfig) -> Self {
        Self {
            runtime: ScriptRuntime::new(host, config.limits.clone()),
            policy: config.policy,
        }
    }

    /// Fails fast when the policy refuses `source`.
    pub(crate) fn admit(&self, source: &str) -> Result<()> {
        self.policy.check(source)
    }

    pub(crate) async fn execute(&self, source: &str, args: JsonValue) -> Result<JsonValue> {
        self.admit(source)?;
        self.runtime.execute(source, args).await
    }

    pub(crate) fn listen(&self, event: &str) -> Result<HostEvents> {
        self.runtime.host().listen(event).map_err(BridgeError::Host)
    }

    pub(crate) fn pass_through_functions(&self) -> Vec<String> {
        self.runtime.host().pass_through_functions()
    }
}
