use thiserror::Error;

/// Library result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the messaging client.
#[derive(Error, Debug)]
pub enum Error {
    #[error("bridge: {0}")]
    Bridge(#[from] BridgeError),

    /// Failure reported by the messaging client itself. The text is kept
    /// verbatim so the gateway can hand it back to HTTP callers.
    #[error("{0}")]
    Client(String),

    #[error("client not initialized")]
    NotInitialized,

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client(message.into())
    }
}

/// Errors from the child process hosting the messaging client.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("failed to spawn `{program}`: {message}")]
    Spawn { program: String, message: String },

    #[error("missing {0} pipe")]
    MissingPipe(&'static str),

    #[error("bridge process closed")]
    Closed,

    #[error("protocol: {0}")]
    Protocol(String),
}
