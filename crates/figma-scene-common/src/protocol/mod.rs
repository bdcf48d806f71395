pub mod envelope;
pub mod error;
pub mod id;

#[cfg(test)]
mod tests;

pub use envelope::{Action, Envelope, Role, PLUGIN_ID_FIELD, PLUGIN_MESSAGE_FIELD, WILDCARD_PLUGIN_ID};
pub use error::{BridgeError, Result};
pub use id::CallId;
