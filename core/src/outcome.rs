//! Structured outcomes returned by every tool.
//!
//! An operation either produces a report or a [`Failure`]. The pair is
//! modelled as [`Outcome<T>`], a plain `Result`, and flattened onto the wire
//! as a single JSON object carrying a `success` flag via [`ToResponse`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Category of a structured failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Leading SQL keyword is not in the allow-list.
    OperationNotAllowed,
    /// A database file required by the operation does not exist.
    NotFound,
    /// Any failure reported by the SQLite engine.
    EngineError,
    /// Filesystem failure outside the engine.
    #[serde(rename = "IOError")]
    IoError,
    /// A database name resolved outside the sandbox directory.
    PathEscape,
}

impl ErrorCategory {
    /// Wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OperationNotAllowed => "OperationNotAllowed",
            Self::NotFound => "NotFound",
            Self::EngineError => "EngineError",
            Self::IoError => "IOError",
            Self::PathEscape => "PathEscape",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured failure: `success = false` plus a category and message.
///
/// # Examples
///
/// ```
/// use sqlite_mcp_core::{ErrorCategory, Failure};
///
/// let failure = Failure::new(ErrorCategory::NotFound, "Database x.db does not exist");
/// assert_eq!(failure.category, ErrorCategory::NotFound);
/// assert!(failure.engine_code.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Failure category.
    #[serde(rename = "error_type")]
    pub category: ErrorCategory,
    /// Human-readable message.
    #[serde(rename = "error")]
    pub message: String,
    /// Native SQLite error code name, for engine failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_code: Option<String>,
}

impl Failure {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            engine_code: None,
        }
    }

    /// Attaches the engine's native error code name.
    pub fn with_engine_code(mut self, code: impl Into<String>) -> Self {
        self.engine_code = Some(code.into());
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

/// Result of a tool operation.
pub type Outcome<T> = Result<T, Failure>;

/// A successful payload that can be flattened into a tool response.
///
/// Most reports are unconditionally successful; reports that aggregate
/// several sub-operations override [`is_success`](Report::is_success).
pub trait Report: Serialize {
    fn is_success(&self) -> bool {
        true
    }
}

impl Report for Value {}

/// Flattens an outcome into the `{ "success": bool, ... }` wire shape.
pub trait ToResponse {
    fn to_response(&self) -> Value;
}

impl<T: Report> ToResponse for Outcome<T> {
    fn to_response(&self) -> Value {
        match self {
            Ok(report) => {
                let body = serde_json::to_value(report).unwrap_or(Value::Null);
                with_success(report.is_success(), body)
            }
            Err(failure) => {
                let body = serde_json::to_value(failure).unwrap_or(Value::Null);
                with_success(false, body)
            }
        }
    }
}

fn with_success(success: bool, body: Value) -> Value {
    let mut object = Map::new();
    object.insert("success".to_string(), Value::Bool(success));
    match body {
        Value::Object(fields) => object.extend(fields),
        Value::Null => {}
        other => {
            object.insert("data".to_string(), other);
        }
    }
    Value::Object(object)
}

/// Inserts extra top-level fields into a flattened response.
///
/// Existing fields with the same name are overwritten.
pub fn annotate(mut response: Value, fields: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    if let Value::Object(object) = &mut response {
        for (key, value) in fields {
            object.insert(key.to_string(), value);
        }
    }
    response
}

/// Current local time in RFC 3339 form, used for response timestamps.
pub fn timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}
