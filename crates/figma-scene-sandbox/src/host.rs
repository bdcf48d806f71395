//! Host API boundary
//!
//! The sandbox never implements the document API itself. Callables executed
//! in the sandbox see a `figma` global whose members forward to a [`HostApi`]
//! implementation supplied by the embedding application.
//!
//! # Function Paths
//!
//! Every forwarded call is identified by the dotted path of the member that
//! was invoked on the `figma` global:
//!
//! | JavaScript | path |
//! |------------|------|
//! | `figma.notify(message, options)` | `notify` |
//! | `figma.ui.resize(width, height)` | `ui.resize` |
//! | `figma.currentUser` | `currentUser` |
//! | `figma.clientStorage.getAsync(key)` | `clientStorage.getAsync` |
//! | `figma.clientStorage.setAsync(key, value)` | `clientStorage.setAsync` |
//! | `figma.clientStorage.deleteAsync(key)` | `clientStorage.deleteAsync` |
//! | `figma.clientStorage.keysAsync()` | `clientStorage.keysAsync` |
//! | `figma.createVideoAsync(data)` | `createVideoAsync` |
//! | `figma.base64Decode(data)` | `base64Decode` |
//! | `figma.<name>(...args)` | `<name>` for each pass-through function |

use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

pub const NOTIFY: &str = "notify";
pub const UI_RESIZE: &str = "ui.resize";
pub const CURRENT_USER: &str = "currentUser";
pub const CLIENT_STORAGE_GET: &str = "clientStorage.getAsync";
pub const CLIENT_STORAGE_SET: &str = "clientStorage.setAsync";
pub const CLIENT_STORAGE_DELETE: &str = "clientStorage.deleteAsync";
pub const CLIENT_STORAGE_KEYS: &str = "clientStorage.keysAsync";
pub const CREATE_VIDEO: &str = "createVideoAsync";
pub const BASE64_DECODE: &str = "base64Decode";

/// Stream of payloads for one host event subscription.
pub type HostEvents = mpsc::UnboundedReceiver<JsonValue>;

/// The privileged document API the sandbox forwards to.
pub trait HostApi: Send + Sync + 'static {
    /// Invokes a host function by path.
    ///
    /// An `Err` is thrown into the calling script as an `Error` carrying the
    /// returned message.
    fn invoke(&self, function: &str, args: Vec<JsonValue>) -> Result<JsonValue, String>;

    /// Names of top-level host functions exposed as `figma.<name>(...)`
    /// pass-throughs and advertised to the UI during the handshake.
    fn pass_through_functions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Subscribes to a named host event (`selectionchange`, `currentpagechange`, ...).
    ///
    /// Each payload received on the returned stream is one firing.
    fn listen(&self, event: &str) -> Result<HostEvents, String>;
}
