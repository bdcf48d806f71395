//! Built-in callables
//!
//! Source text for every callable the convenience methods send. Each one
//! takes all of its state through the argument payload. Under
//! [`ScriptPolicy::CatalogOnly`](crate::ScriptPolicy::CatalogOnly) these are
//! the only callables a sandbox accepts.

pub const NOTIFY: &str = "({ message, options }) => { figma.notify(message, options); }";

pub const RESIZE_UI: &str =
    "({ width, height }) => { figma.ui.resize(Math.floor(width), Math.floor(height)); }";

pub const GET_CURRENT_USER: &str = "() => { return figma.currentUser; }";

/// Probes video support by decoding a one-frame WebM clip. Resolves to
/// `false` on any failure.
pub const SUPPORTS_VIDEO: &str = r#"async () => {
    try {
        const webm = "GkXfo0AgQoaBAUL3gQFC8oEEQvOBCEKCQAR3ZWJtQoeBAkKFgQIYU4BnQI0VSalmQCgq17FAAw9CQE2AQAZ3aGFtbXlXQUAGd2hhbW15RIlACECPQAAAAAAAFlSua0AxrkAu14EBY8WBAZyBACK1nEADdW5khkAFVl9WUDglhohAA1ZQOIOBAeBABrCBCLqBCB9DtnVAIueBAKNAHIEAAIAwAQCdASoIAAgAAUAmJaQAA3AA/vz0AAA=";
        await figma.createVideoAsync(figma.base64Decode(webm));
        return true;
    } catch (e) {
        return false;
    }
}"#;

pub const GET_CLIENT_STORAGE: &str =
    "async (key) => { return await figma.clientStorage.getAsync(key); }";

pub const SET_CLIENT_STORAGE: &str =
    "async (args) => { return await figma.clientStorage.setAsync(args.key, args.value); }";

pub const DELETE_CLIENT_STORAGE: &str =
    "async (key) => { return await figma.clientStorage.deleteAsync(key); }";

pub const KEYS_CLIENT_STORAGE: &str =
    "async () => { return await figma.clientStorage.keysAsync(); }";

/// Forwards `{ name, args }` to `figma[name](...args)`. Resolves to `null`
/// when the sandbox has no such function.
pub const PASS_THROUGH: &str = r#"(args) => {
    if (typeof figma[args.name] === "function") {
        return figma[args.name].apply(null, args.args);
    }
}"#;

/// Every built-in callable.
pub const CATALOG: &[&str] = &[
    NOTIFY,
    RESIZE_UI,
    GET_CURRENT_USER,
    SUPPORTS_VIDEO,
    GET_CLIENT_STORAGE,
    SET_CLIENT_STORAGE,
    DELETE_CLIENT_STORAGE,
    KEYS_CLIENT_STORAGE,
    PASS_THROUGH,
];

/// Returns whether `source` is exactly one of the built-in callables.
pub fn is_builtin(source: &str) -> bool {
    CATALOG.contains(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entries_are_recognised() {
        for source in CATALOG {
            assert!(is_builtin(source));
        }
    }

    #[test]
    fn test_arbitrary_source_is_not_builtin() {
        assert!(!is_builtin("(x) => x + 1"));
        assert!(!is_builtin(&format!("{} ", NOTIFY)));
    }
}
