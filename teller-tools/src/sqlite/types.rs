//! Shared types for SQLite tools

use rusqlite::types::ValueRef;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Column definition for schema introspection
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,

    /// Declared SQLite type; empty for untyped columns
    #[serde(rename = "type")]
    pub data_type: String,

    /// Whether the column allows NULL values
    #[serde(default)]
    pub nullable: bool,

    /// Whether this column is (part of) the primary key
    #[serde(default)]
    pub primary_key: bool,
}

/// Information about a table
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableInfo {
    /// Table name
    pub name: String,

    /// Column definitions
    pub columns: Vec<ColumnDefinition>,

    /// Number of rows
    pub row_count: i64,
}

impl TableInfo {
    /// `name(col1, col2, ...)`, as used in agent prompts
    pub fn signature(&self) -> String {
        let columns: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        format!("{}({})", self.name, columns.join(", "))
    }
}

/// Result of a query execution
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,

    /// Row data as arrays of JSON values
    pub rows: Vec<Vec<serde_json::Value>>,

    /// Number of rows returned
    pub row_count: usize,

    /// Whether rows beyond the limit were dropped
    #[serde(default)]
    pub truncated: bool,
}

/// Convert a SQLite value to JSON
///
/// Blobs are not meaningful to a model and are summarized by size.
pub fn sql_to_json(value: ValueRef) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(s) => serde_json::Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => serde_json::Value::String(format!("<blob {} bytes>", b.len())),
    }
}
