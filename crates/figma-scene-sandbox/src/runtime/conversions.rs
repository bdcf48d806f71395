//! JSON <-> JavaScript Value Conversions
//!
//! Arguments arrive as JSON and results leave as JSON, mirroring the
//! structured-clone boundary between the two plugin contexts.
//!
//! # Type Mapping
//!
//! | JSON Type | JavaScript Type |
//! |-----------|-----------------|
//! | null | null |
//! | boolean | Boolean |
//! | number | Number |
//! | string | String |
//! | array | Array |
//! | object | Object |
//!
//! # Limitations
//!
//! - `undefined` and symbols become JSON `null`
//! - Symbol keys in JavaScript objects are skipped
//! - Integral numbers within the safe integer range become JSON integers, so
//!   `5 + 1` comes back as `6` rather than `6.0`
//! - NaN and infinities cannot be represented and cause an error
//! - Cyclic values, and values nested deeper than [`MAX_DEPTH`], cause an error

use boa_engine::{
    object::{builtins::JsArray, JsObject},
    property::PropertyKey,
    value::JsValue,
    Context, JsString,
};
use figma_scene_common::protocol::error::{BridgeError, Result};
use serde_json::Value as JsonValue;

/// Largest integer a JavaScript number represents exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Deepest array/object nesting accepted when leaving the engine.
pub const MAX_DEPTH: usize = 256;

/// Convert serde_json::Value to Boa JsValue.
///
/// # Errors
///
/// Returns `BridgeError::ScriptExecution` if a number is out of range or an
/// array/object cannot be populated.
pub fn json_to_js_value(json: JsonValue, ctx: &mut Context) -> Result<JsValue> {
    match json {
        JsonValue::Null => Ok(JsValue::null()),
        JsonValue::Bool(b) => Ok(JsValue::new(b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64().and_then(|i| i32::try_from(i).ok()) {
                return Ok(JsValue::new(i));
            }
            n.as_f64()
                .map(JsValue::new)
                .ok_or_else(|| BridgeError::ScriptExecution("Number out of range".into()))
        }
        JsonValue::String(s) => Ok(JsValue::new(JsString::from(s.as_str()))),
        JsonValue::Array(arr) => {
            let js_array = JsArray::new(ctx);
            for (i, v) in arr.into_iter().enumerate() {
                let js_value = json_to_js_value(v, ctx)?;
                js_array.push(js_value, ctx).map_err(|e| {
                    BridgeError::ScriptExecution(format!("Failed to push array element {}: {}", i, e))
                })?;
            }
            Ok(js_array.into())
        }
        JsonValue::Object(obj) => {
            let js_obj = JsObject::with_object_proto(ctx.intrinsics());

            for (key, value) in obj {
                let js_value = json_to_js_value(value, ctx)?;
                js_obj
                    .create_data_property_or_throw(JsString::from(key.as_str()), js_value, ctx)
                    .map_err(|e| {
                        BridgeError::ScriptExecution(format!("Failed to set property '{}': {}", key, e))
                    })?;
            }

            Ok(js_obj.into())
        }
    }
}

fn number_to_json(n: f64) -> Result<JsonValue> {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Ok(JsonValue::from(n as i64));
    }

    serde_json::Number::from_f64(n)
        .map(JsonValue::Number)
        .ok_or_else(|| BridgeError::ScriptExecution(format!("Cannot represent {} as JSON", n)))
}

/// Convert Boa JsValue to serde_json::Value.
///
/// # Conversion Rules
///
/// - `undefined` and `null` → JSON `null`
/// - `Boolean` → JSON `boolean`
/// - `Number` → JSON `number` (integral values as integers)
/// - `String` → JSON `string`
/// - `Array` → JSON `array` (recursively converts elements)
/// - `Object` → JSON `object` (skips symbol keys, recursively converts values)
/// - `Symbol` → JSON `null`
///
/// # Errors
///
/// Returns `BridgeError::ScriptExecution` for non-finite numbers, cyclic
/// values and nesting deeper than [`MAX_DEPTH`].
pub fn js_value_to_json(value: JsValue, ctx: &mut Context) -> Result<JsonValue> {
    let mut ancestors = Vec::new();
    convert(value, ctx, &mut ancestors)
}

/// `ancestors` holds the objects currently being converted, outermost first.
fn convert(value: JsValue, ctx: &mut Context, ancestors: &mut Vec<JsObject>) -> Result<JsonValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(JsonValue::Null);
    }

    if let Some(b) = value.as_boolean() {
        return Ok(JsonValue::Bool(b));
    }

    if let Some(n) = value.as_number() {
        return number_to_json(n);
    }

    if let Some(s) = value.as_string() {
        return Ok(JsonValue::String(s.to_std_string().map_err(|e| {
            BridgeError::ScriptExecution(format!("String conversion error: {:?}", e))
        })?));
    }

    let Some(obj) = value.as_object() else {
        return Ok(JsonValue::Null);
    };

    if ancestors.iter().any(|seen| JsObject::equals(seen, &obj)) {
        return Err(BridgeError::ScriptExecution("cyclic value cannot be transferred".into()));
    }
    if ancestors.len() >= MAX_DEPTH {
        return Err(BridgeError::ScriptExecution(format!(
            "value nested deeper than {} levels cannot be transferred",
            MAX_DEPTH
        )));
    }

    ancestors.push(obj.clone());
    let result = convert_object(&obj, ctx, ancestors);
    ancestors.pop();
    result
}

fn convert_object(obj: &JsObject, ctx: &mut Context, ancestors: &mut Vec<JsObject>) -> Result<JsonValue> {
    if obj.is_array() {
        let array = JsArray::from_object(obj.clone())
            .map_err(|e| BridgeError::ScriptExecution(format!("Object is not a valid array: {}", e)))?;

        let length: usize = array
            .length(ctx)
            .map_err(|e| BridgeError::ScriptExecution(format!("Failed to get array length: {}", e)))?
            .try_into()
            .map_err(|_| BridgeError::ScriptExecution("Array length overflow".into()))?;

        let mut result = Vec::with_capacity(length);
        for i in 0..length {
            let elem = array.get(i, ctx).map_err(|e| {
                BridgeError::ScriptExecution(format!("Failed to get array element {}: {}", i, e))
            })?;
            result.push(convert(elem, ctx, ancestors)?);
        }
        return Ok(JsonValue::Array(result));
    }

    let keys = obj
        .own_property_keys(ctx)
        .map_err(|e| BridgeError::ScriptExecution(format!("Failed to get object keys: {}", e)))?;

    let mut result = serde_json::Map::new();

    for key in keys {
        let key_str = match &key {
            PropertyKey::String(s) => s.to_std_string().map_err(|e| {
                BridgeError::ScriptExecution(format!("String conversion error: {:?}", e))
            }),
            PropertyKey::Index(i) => Ok(i.get().to_string()),
            PropertyKey::Symbol(_) => continue,
        }?;

        let prop_value = obj.get(key.clone(), ctx).map_err(|e| {
            BridgeError::ScriptExecution(format!("Failed to get property '{}': {}", key_str, e))
        })?;
        result.insert(key_str, convert(prop_value, ctx, ancestors)?);
    }

    Ok(JsonValue::Object(result))
}
