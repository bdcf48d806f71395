use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error message reported by the peer in a `figma-scene-error` envelope.
    #[error("{0}")]
    Remote(String),

    /// A callable failed while being reconstructed or invoked locally.
    #[error("{0}")]
    ScriptExecution(String),

    #[error("Script execution timed out after {0}ms")]
    Timeout(u64),

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Not implemented")]
    NotImplemented,

    #[error("Script rejected by policy: {0}")]
    ScriptRejected(String),

    #[error("Host function '{0}' was not advertised by the sandbox")]
    UnsupportedHostFunction(String),

    #[error("Unknown host function: {0}")]
    UnknownHostFunction(String),

    #[error("Identifier already live: {0}")]
    DuplicateId(String),

    #[error("Inbound listener already registered")]
    ListenerTaken,

    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),

    #[error("Bridge disconnected before the call settled")]
    Disconnected,

    #[error("Message too large: {0} bytes")]
    MessageTooLarge(usize),

    #[error("Host error: {0}")]
    Host(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BridgeError {
    /// Text carried by an outbound `figma-scene-error` envelope.
    ///
    /// Script and remote failures keep the original message untouched so the
    /// caller sees exactly what the callable threw.
    pub fn peer_message(&self) -> String {
        match self {
            BridgeError::Remote(message) | BridgeError::ScriptExecution(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
