//! Structured error types for store, import and export operations.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Transfer format errors
    ParseError,
    SchemaError,

    // Not found errors
    ProjectNotFound,
    TestNotFound,

    // Internal errors
    PersistenceError,
    IoError,
    ConfigError,
    EncodeError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::SchemaError => "SCHEMA_ERROR",
            ErrorCode::ProjectNotFound => "PROJECT_NOT_FOUND",
            ErrorCode::TestNotFound => "TEST_NOT_FOUND",
            ErrorCode::PersistenceError => "PERSISTENCE_ERROR",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::EncodeError => "ENCODE_ERROR",
        }
    }
}

/// Errors raised at the I/O-adjacent boundary of the crate.
///
/// Diffing, classification and merging never fail; everything here comes
/// from reading transfer files, talking to the store, or loading config.
#[derive(Debug, Error)]
pub enum Error {
    /// Transfer bytes are not well-formed JSON (or a corrupt gzip stream).
    #[error("Invalid transfer file: {0}")]
    Parse(String),

    /// Well-formed JSON without a usable `projects` array.
    #[error("Invalid transfer format: {0}")]
    Schema(String),

    /// The record store failed during read, clear, insert or update.
    #[error("Storage failure: {0}")]
    Persistence(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Test not found: {test_id} (project {project_id})")]
    TestNotFound { project_id: String, test_id: String },

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to encode transfer file: {0}")]
    Encode(String),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Parse(_) => ErrorCode::ParseError,
            Error::Schema(_) => ErrorCode::SchemaError,
            Error::Persistence(_) => ErrorCode::PersistenceError,
            Error::ProjectNotFound(_) => ErrorCode::ProjectNotFound,
            Error::TestNotFound { .. } => ErrorCode::TestNotFound,
            Error::Io { .. } => ErrorCode::IoError,
            Error::Config(_) => ErrorCode::ConfigError,
            Error::Encode(_) => ErrorCode::EncodeError,
        }
    }

    /// True for the not-found family (missing project or test).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ProjectNotFound(_) | Error::TestNotFound { .. }
        )
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn test_not_found(project_id: &str, test_id: &str) -> Self {
        Error::TestNotFound {
            project_id: project_id.to_string(),
            test_id: test_id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl From<refinery::Error> for Error {
    fn from(err: refinery::Error) -> Self {
        Error::Persistence(format!("migration failed: {}", err))
    }
}

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::Parse("x".into()).code(), ErrorCode::ParseError);
        assert_eq!(Error::Schema("x".into()).code(), ErrorCode::SchemaError);
        assert_eq!(
            Error::test_not_found("p1", "t1").code(),
            ErrorCode::TestNotFound
        );
    }

    #[test]
    fn test_not_found_family() {
        assert!(Error::ProjectNotFound("p1".into()).is_not_found());
        assert!(Error::test_not_found("p1", "t1").is_not_found());
        assert!(!Error::Persistence("boom".into()).is_not_found());
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::PersistenceError).unwrap();
        assert_eq!(json, "\"PERSISTENCE_ERROR\"");
        assert_eq!(ErrorCode::PersistenceError.as_str(), "PERSISTENCE_ERROR");
    }

    #[test]
    fn test_display_includes_ids() {
        let err = Error::test_not_found("p1", "t9");
        assert_eq!(err.to_string(), "Test not found: t9 (project p1)");
    }
}
