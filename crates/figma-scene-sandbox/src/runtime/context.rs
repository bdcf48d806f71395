use std::sync::Arc;

use boa_engine::{property::Attribute, Context, JsString, Source};
use figma_scene_common::protocol::error::{BridgeError, Result};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::host::HostApi;
use crate::limits::ScriptLimits;
use crate::runtime::{
    bindings,
    conversions::{js_value_to_json, json_to_js_value},
};

const SOURCE_GLOBAL: &str = "__figmaSceneSource";
const ARGS_GLOBAL: &str = "__figmaSceneArgs";
const OUTCOME_GLOBAL: &str = "__figmaSceneOutcome";

/// Rebuilds the callable from its source text, invokes it once with the
/// arguments, and records how the resulting promise settled.
const INVOKE_WRAPPER: &str = r#"
(() => {
    const settle = (outcome) => { globalThis.__figmaSceneOutcome = outcome; };
    const describe = (e) => (e instanceof Error ? e.message : String(e));
    let callable;
    try {
        callable = new Function("return " + globalThis.__figmaSceneSource)();
    } catch (e) {
        settle({ ok: false, error: describe(e) });
        return;
    }
    Promise.resolve()
        .then(() => callable(globalThis.__figmaSceneArgs))
        .then(
            (value) => settle({ ok: true, value: value === undefined ? null : value }),
            (e) => settle({ ok: false, error: describe(e) }),
        );
})();
"#;

#[derive(Debug, Deserialize)]
struct Outcome {
    ok: bool,
    #[serde(default)]
    value: JsonValue,
    #[serde(default)]
    error: Option<String>,
}

/// Boa context with the `figma` bindings installed.
///
/// A context runs exactly one callable: state left on `globalThis` by one call
/// must never leak into the next, so [`ScriptRuntime`](super::ScriptRuntime)
/// builds a fresh one each time.
pub struct ScriptContext {
    ctx: Context,
}

impl ScriptContext {
    /// Create a new Boa context with host bindings and resource limits applied.
    pub fn new(host: Arc<dyn HostApi>, limits: &ScriptLimits) -> Result<Self> {
        let mut ctx = Context::default();
        ctx.runtime_limits_mut()
            .set_loop_iteration_limit(limits.loop_iteration_limit);
        ctx.runtime_limits_mut()
            .set_recursion_limit(limits.recursion_limit);

        bindings::install_figma_bindings(&mut ctx, host)?;

        Ok(Self { ctx })
    }

    /// Executes a marshaled callable with `args` and drives its promise to
    /// completion.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::ScriptExecution` carrying the thrown message when
    /// the source does not parse, the callable throws or rejects, a resource
    /// limit is hit, or the returned promise never settles.
    pub fn execute(&mut self, source: &str, args: JsonValue) -> Result<JsonValue> {
        let ctx = &mut self.ctx;

        ctx.register_global_property(JsString::from(SOURCE_GLOBAL), JsString::from(source), Attribute::all())
            .map_err(|e| BridgeError::ScriptExecution(e.to_string()))?;
        let js_args = json_to_js_value(args, ctx)?;
        ctx.register_global_property(JsString::from(ARGS_GLOBAL), js_args, Attribute::all())
            .map_err(|e| BridgeError::ScriptExecution(e.to_string()))?;

        ctx.eval(Source::from_bytes(INVOKE_WRAPPER))
            .map_err(|e| BridgeError::ScriptExecution(e.to_string()))?;

        tracing::debug!("Running pending jobs");
        ctx.run_jobs()
            .map_err(|e| BridgeError::ScriptExecution(e.to_string()))?;

        let outcome = ctx
            .global_object()
            .get(JsString::from(OUTCOME_GLOBAL), ctx)
            .map_err(|e| BridgeError::ScriptExecution(e.to_string()))?;
        if outcome.is_undefined() {
            return Err(BridgeError::ScriptExecution("callable did not settle".into()));
        }

        let outcome: Outcome = serde_json::from_value(js_value_to_json(outcome, ctx)?)?;
        if outcome.ok {
            Ok(outcome.value)
        } else {
            Err(BridgeError::ScriptExecution(
                outcome.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}
