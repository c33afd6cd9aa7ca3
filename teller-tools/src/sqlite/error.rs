//! SQLite-specific error types

use std::path::PathBuf;
use teller_core::ToolError;
use thiserror::Error;

/// Errors that can occur during SQLite tool operations
#[derive(Debug, Error)]
pub enum SqliteToolError {
    /// Failed to open/create database connection
    #[error("Failed to connect to database '{path}': {message}")]
    ConnectionFailed { path: PathBuf, message: String },

    /// Invalid query for the operation type
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// A CSV file could not be loaded
    #[error("Failed to load '{path}': {message}")]
    CsvLoad { path: PathBuf, message: String },

    /// Invalid table name
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The blocking task running the query panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(String),

    /// Generic SQLite error wrapper
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SqliteToolError> for ToolError {
    fn from(err: SqliteToolError) -> Self {
        ToolError::Custom(err.to_string())
    }
}

impl From<SqliteToolError> for teller_core::Error {
    fn from(err: SqliteToolError) -> Self {
        ToolError::from(err).into()
    }
}

impl From<serde_json::Error> for SqliteToolError {
    fn from(err: serde_json::Error) -> Self {
        SqliteToolError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failed_display() {
        let err = SqliteToolError::ConnectionFailed {
            path: PathBuf::from("/tmp/customers.db"),
            message: "permission denied".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/customers.db"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn test_invalid_query_display() {
        let err = SqliteToolError::InvalidQuery("DELETE not allowed".to_string());
        assert_eq!(err.to_string(), "Invalid query: DELETE not allowed");
    }

    #[test]
    fn test_table_not_found_display() {
        let err = SqliteToolError::TableNotFound("customers".to_string());
        assert_eq!(err.to_string(), "Table not found: customers");
    }

    #[test]
    fn test_from_sqlite_error() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let sqlite_err = conn.prepare("INVALID SQL SYNTAX").unwrap_err();
        let err: SqliteToolError = sqlite_err.into();
        assert!(err.to_string().contains("SQLite error"));
    }

    #[test]
    fn test_into_tool_error() {
        let err = SqliteToolError::TableNotFound("pending_transactions".to_string());
        let tool_err: ToolError = err.into();
        match tool_err {
            ToolError::Custom(msg) => assert!(msg.contains("pending_transactions")),
            _ => panic!("Expected ToolError::Custom"),
        }
    }
}
