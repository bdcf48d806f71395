//! Correlation identifiers
//!
//! Every call and subscription is tagged with a [`CallId`]. Locally generated
//! identifiers are random 128-bit UUIDs rendered as hyphenated text, but the
//! wire accepts any string so peers using a different generator interoperate.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier correlating a request with its responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    /// Generates a fresh random identifier.
    ///
    /// Uses UUID v4, so generation never blocks and needs no shared state.
    pub fn generate() -> Self {
        CallId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallId {
    fn from(value: &str) -> Self {
        CallId(value.to_string())
    }
}

impl From<String> for CallId {
    fn from(value: String) -> Self {
        CallId(value)
    }
}
