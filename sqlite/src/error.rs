//! Error types for gateway operations.
//!
//! Internal code propagates [`GatewayError`] with `?`; the public gateway
//! methods convert it into a [`Failure`] at their boundary.

use sqlite_mcp_core::{ErrorCategory, Failure};
use sqlite_mcp_db::SandboxError;
use thiserror::Error;

/// Errors that can occur while serving a tool call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Leading keyword is not in the allow-list.
    #[error("Operation {0} not allowed")]
    OperationNotAllowed(String),

    /// A database the operation reads from does not exist.
    #[error("{0}")]
    NotFound(String),

    /// SQLite engine failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Filesystem failure outside the engine.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Name resolution or listing failure in the data directory.
    #[error(transparent)]
    SandboxError(#[from] SandboxError),
}

impl GatewayError {
    /// Category reported to callers.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::OperationNotAllowed(_) => ErrorCategory::OperationNotAllowed,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::DatabaseError(_) => ErrorCategory::EngineError,
            Self::IoError(_) => ErrorCategory::IoError,
            Self::SandboxError(SandboxError::PathEscape(_)) => ErrorCategory::PathEscape,
            Self::SandboxError(_) => ErrorCategory::IoError,
        }
    }
}

impl From<GatewayError> for Failure {
    fn from(err: GatewayError) -> Self {
        let category = err.category();
        match err {
            // Engine messages are passed through verbatim, without our prefix.
            GatewayError::DatabaseError(inner) => {
                let code = engine_code(&inner);
                let failure = Failure::new(category, inner.to_string());
                match code {
                    Some(code) => failure.with_engine_code(code),
                    None => failure,
                }
            }
            other => Failure::new(category, other.to_string()),
        }
    }
}

/// Name of SQLite's primary result code for an engine failure.
fn engine_code(err: &rusqlite::Error) -> Option<String> {
    match err {
        rusqlite::Error::SqliteFailure(inner, _) => Some(format!("{:?}", inner.code)),
        _ => None,
    }
}

/// Convenience alias for results with [`GatewayError`].
pub type Result<T> = std::result::Result<T, GatewayError>;
