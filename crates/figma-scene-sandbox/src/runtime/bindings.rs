//! JavaScript bindings for the sandbox
//!
//! Installs the `figma` global that marshaled callables see. Every member is
//! a thin JavaScript shim over one native function, `__figmaSceneHost(path,
//! args)`, which forwards to the embedding [`HostApi`].
//!
//! # JavaScript API
//!
//! - `figma.notify(message, options)`
//! - `figma.ui.resize(width, height)`
//! - `figma.currentUser` (getter)
//! - `figma.clientStorage.getAsync/setAsync/deleteAsync/keysAsync` (return Promises)
//! - `figma.createVideoAsync(bytes)` (returns a Promise)
//! - `figma.base64Decode(text)` (returns a `Uint8Array`)
//! - `figma.<name>(...args)` for each pass-through function
//!
//! A host error surfaces in JavaScript as a thrown `Error` (or a rejected
//! Promise for the async members) carrying the host's message.

use std::sync::Arc;

use boa_engine::{
    native_function::NativeFunction, property::Attribute, Context, JsNativeError, JsString,
    JsValue, Source,
};
use boa_gc::{Finalize, Trace};
use figma_scene_common::protocol::error::{BridgeError, Result};
use serde_json::Value as JsonValue;

use crate::host::HostApi;
use crate::runtime::conversions::{js_value_to_json, json_to_js_value};

const HOST_FUNCTION_GLOBAL: &str = "__figmaSceneHost";
const PASS_THROUGH_GLOBAL: &str = "__figmaScenePassThrough";

const PRELUDE: &str = r#"
(() => {
    const call = (path, args) => globalThis.__figmaSceneHost(path, args);
    const callAsync = (path, args) => new Promise((resolve) => resolve(call(path, args)));
    const figma = {
        notify: (message, options) =>
            call("notify", [message, options === undefined ? null : options]),
        ui: {
            resize: (width, height) => call("ui.resize", [width, height]),
        },
        get currentUser() {
            return call("currentUser", []);
        },
        clientStorage: {
            getAsync: (key) => callAsync("clientStorage.getAsync", [key]),
            setAsync: (key, value) => callAsync("clientStorage.setAsync", [key, value]),
            deleteAsync: (key) => callAsync("clientStorage.deleteAsync", [key]),
            keysAsync: () => callAsync("clientStorage.keysAsync", []),
        },
        createVideoAsync: (data) => callAsync("createVideoAsync", [Array.from(data)]),
        base64Decode: (data) => new Uint8Array(call("base64Decode", [data])),
    };
    for (const name of globalThis.__figmaScenePassThrough) {
        if (!(name in figma)) {
            figma[name] = (...args) => call(name, args);
        }
    }
    globalThis.figma = figma;
})();
"#;

/// Host handle carried by the native bridge function.
#[derive(Trace, Finalize)]
struct HostCapture {
    // Holds no garbage-collected values.
    #[unsafe_ignore_trace]
    host: Arc<dyn HostApi>,
}

fn host_call(
    host: &dyn HostApi,
    args: &[JsValue],
    ctx: &mut Context,
) -> boa_engine::JsResult<JsValue> {
    let path = args
        .first()
        .and_then(|v| v.as_string())
        .ok_or_else(|| JsNativeError::typ().with_message("host function path must be a string"))?
        .to_std_string_escaped();

    let call_args = match args.get(1).cloned() {
        Some(value) => js_value_to_json(value, ctx)
            .map_err(|e| JsNativeError::typ().with_message(e.to_string()))?,
        None => JsonValue::Null,
    };
    let call_args = match call_args {
        JsonValue::Array(values) => values,
        JsonValue::Null => Vec::new(),
        other => vec![other],
    };

    tracing::debug!("Forwarding figma.{} to host", path);

    let result = host
        .invoke(&path, call_args)
        .map_err(|message| JsNativeError::error().with_message(message))?;

    json_to_js_value(result, ctx).map_err(|e| JsNativeError::typ().with_message(e.to_string()).into())
}

/// Install the host bridge and the `figma` global into a context.
///
/// # Errors
///
/// Returns `BridgeError::ScriptExecution` if a global cannot be registered or
/// the prelude fails to evaluate.
pub(crate) fn install_figma_bindings(ctx: &mut Context, host: Arc<dyn HostApi>) -> Result<()> {
    let pass_through = JsonValue::from(host.pass_through_functions());
    let pass_through = json_to_js_value(pass_through, ctx)?;
    ctx.register_global_property(JsString::from(PASS_THROUGH_GLOBAL), pass_through, Attribute::all())
        .map_err(|e| BridgeError::ScriptExecution(e.to_string()))?;

    let host_fn = NativeFunction::from_copy_closure_with_captures(
        |_this, args, captures: &HostCapture, ctx| host_call(captures.host.as_ref(), args, ctx),
        HostCapture { host },
    );
    ctx.register_global_builtin_callable(JsString::from(HOST_FUNCTION_GLOBAL), 2, host_fn)
        .map_err(|e| BridgeError::ScriptExecution(e.to_string()))?;

    ctx.eval(Source::from_bytes(PRELUDE))
        .map_err(|e| BridgeError::ScriptExecution(format!("Prelude evaluation error: {}", e)))?;

    Ok(())
}
