//! Server configuration.
//!
//! Loaded from an optional YAML file; every field has a default, so a
//! partial file (or no file at all) yields a working configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! data_dir: ./data
//! max_results: 1000
//! allowed_operations:
//!   - SELECT
//!   - INSERT
//!   - UPDATE
//!   - DELETE
//!   - CREATE
//!   - DROP
//!   - ALTER
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default sandbox directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default cap on rows returned by a single `SELECT`.
pub const DEFAULT_MAX_RESULTS: usize = 1000;

/// Leading keywords accepted by `execute_sql` unless configured otherwise.
pub const DEFAULT_ALLOWED_OPERATIONS: [&str; 7] =
    ["SELECT", "INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER"];

/// Runtime configuration shared by every tool call.
///
/// # Examples
///
/// ```
/// use sqlite_mcp_db::ServerConfig;
///
/// let config = ServerConfig::default();
/// assert_eq!(config.max_results, 1000);
/// assert!(config.is_allowed("select"));
/// assert!(!config.is_allowed("PRAGMA"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Sandbox directory holding every managed database and backup.
    pub data_dir: PathBuf,
    /// Maximum number of rows materialized for a `SELECT`.
    pub max_results: usize,
    /// Allowed leading SQL keywords (compared case-insensitively).
    pub allowed_operations: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            max_results: DEFAULT_MAX_RESULTS,
            allowed_operations: DEFAULT_ALLOWED_OPERATIONS
                .iter()
                .map(|op| op.to_string())
                .collect(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::SandboxError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::SandboxError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if `keyword` is an allowed leading SQL keyword.
    pub fn is_allowed(&self, keyword: &str) -> bool {
        self.allowed_operations
            .iter()
            .any(|op| op.eq_ignore_ascii_case(keyword))
    }
}
