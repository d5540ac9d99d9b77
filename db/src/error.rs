//! Error types for sandbox and configuration operations.

use thiserror::Error;

/// Errors that can occur while resolving or listing sandboxed databases.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A database name resolves outside the sandbox directory.
    #[error("database name '{0}' resolves outside the data directory")]
    PathEscape(String),
}

/// Convenience alias for results with [`SandboxError`].
pub type Result<T> = std::result::Result<T, SandboxError>;
