//! Error types for protocol handling.
//!
//! Tool failures are not errors here; they travel inside successful
//! responses. [`ServerError`] covers what the protocol itself rejects:
//! unknown names, malformed arguments, and transport failures.

use thiserror::Error;

use crate::protocol::JsonRpcError;

/// Errors raised while dispatching a request.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Reading from or writing to the transport failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A message or response could not be (de)serialized.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments did not match the tool's input schema.
    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown prompt: {0}")]
    UnknownPrompt(String),

    /// A required prompt argument was missing or empty.
    #[error("prompt {prompt} requires argument {argument}")]
    MissingArgument { prompt: String, argument: String },

    #[error("unknown resource: {0}")]
    UnknownResource(String),
}

impl From<ServerError> for JsonRpcError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::IoError(_) | ServerError::JsonError(_) => {
                JsonRpcError::internal_error(err.to_string())
            }
            other => JsonRpcError::invalid_params(other.to_string()),
        }
    }
}

/// Convenience alias for results with [`ServerError`].
pub type Result<T> = std::result::Result<T, ServerError>;
