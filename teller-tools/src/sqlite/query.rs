//! Read-only table tools
//!
//! These are the only tools a table agent gets, so the model can inspect
//! and query the data but never change it.

use teller_core::tool::{box_tool, DynTool};

use crate::prelude::*;
use crate::sqlite::database::SqliteDatabase;
use crate::sqlite::error::SqliteToolError;
use crate::sqlite::types::{sql_to_json, QueryResult};

/// Input for read query execution
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadQueryInput {
    /// SQL query to execute (SELECT, WITH ... SELECT, or PRAGMA only)
    pub query: String,

    /// Maximum number of rows to return (default: 200)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl ReadQueryInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    200
}

/// Tool for executing read-only queries
pub struct ReadQueryTool {
    db: SqliteDatabase,
}

impl ReadQueryTool {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    /// Validates that a query is read-only
    fn is_read_only(sql: &str) -> bool {
        let normalized = sql.trim().to_uppercase();

        // WITH queries must lead to a SELECT
        if normalized.starts_with("WITH") {
            return normalized.contains("SELECT");
        }

        ["SELECT", "PRAGMA"]
            .iter()
            .any(|prefix| normalized.starts_with(prefix))
    }
}

impl Tool for ReadQueryTool {
    type Input = ReadQueryInput;

    fn name(&self) -> &str {
        "sql_query"
    }

    fn description(&self) -> &str {
        "Execute a read-only SQL query (SELECT, WITH ... SELECT, PRAGMA) against the tables. \
         Returns the column names and row data."
    }

    async fn execute(&self, input: Self::Input, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        if !Self::is_read_only(&input.query) {
            return Err(SqliteToolError::InvalidQuery(
                "Only SELECT, WITH...SELECT and PRAGMA queries are allowed.".to_string(),
            )
            .into());
        }

        let query = input.query;
        let limit = input.limit;

        let result = self
            .db
            .run(move |conn| {
                let mut stmt = conn.prepare(&query)?;
                if !stmt.readonly() {
                    return Err(SqliteToolError::InvalidQuery(
                        "Query would modify the database.".to_string(),
                    ));
                }

                let columns: Vec<String> =
                    stmt.column_names().iter().map(|s| s.to_string()).collect();
                let mut rows_result = stmt.query([])?;
                let mut rows: Vec<Vec<serde_json::Value>> = Vec::new();
                let mut truncated = false;

                while let Some(row) = rows_result.next()? {
                    if rows.len() >= limit {
                        truncated = true;
                        break;
                    }
                    let mut row_data = Vec::with_capacity(columns.len());
                    for i in 0..columns.len() {
                        row_data.push(sql_to_json(row.get_ref(i)?));
                    }
                    rows.push(row_data);
                }

                Ok(QueryResult {
                    row_count: rows.len(),
                    columns,
                    rows,
                    truncated,
                })
            })
            .await?;

        Ok(ToolResult::json(result)?)
    }
}

/// Input for listing tables
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListTablesInput {}

/// Tool listing the tables available to query
pub struct ListTablesTool {
    db: SqliteDatabase,
}

impl ListTablesTool {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

impl Tool for ListTablesTool {
    type Input = ListTablesInput;

    fn name(&self) -> &str {
        "sql_list_tables"
    }

    fn description(&self) -> &str {
        "List the tables available to query."
    }

    async fn execute(&self, _input: Self::Input, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let tables = self.db.table_names().await?;
        Ok(ToolResult::json(tables)?)
    }
}

/// Input for describing a table
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Table name to describe
    pub table: String,
}

/// Tool returning the columns, types and row count of a table
pub struct DescribeTableTool {
    db: SqliteDatabase,
}

impl DescribeTableTool {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

impl Tool for DescribeTableTool {
    type Input = DescribeTableInput;

    fn name(&self) -> &str {
        "sql_describe_table"
    }

    fn description(&self) -> &str {
        "Get the column names, types and row count of a table."
    }

    async fn execute(&self, input: Self::Input, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let info = self.db.describe(&input.table).await?;
        Ok(ToolResult::json(info)?)
    }
}

/// The three read-only tools over `db`
pub fn read_only_tools(db: &SqliteDatabase) -> Vec<Box<dyn DynTool>> {
    vec![
        box_tool(ListTablesTool::new(db.clone())),
        box_tool(DescribeTableTool::new(db.clone())),
        box_tool(ReadQueryTool::new(db.clone())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> SqliteDatabase {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.with_connection(|conn| {
            conn.execute_batch(
                "CREATE TABLE customers (id TEXT PRIMARY KEY, first_name TEXT, balance REAL);
                 INSERT INTO customers VALUES ('C001', 'Ada', 1000.0);
                 INSERT INTO customers VALUES ('C004', 'Grace', 250.5);
                 INSERT INTO customers VALUES ('C007', 'Alan', NULL);",
            )?;
            Ok(())
        })
        .await
        .unwrap();
        db
    }

    #[test]
    fn test_is_read_only() {
        assert!(ReadQueryTool::is_read_only("SELECT * FROM customers"));
        assert!(ReadQueryTool::is_read_only("  select 1"));
        assert!(ReadQueryTool::is_read_only("PRAGMA table_info(customers)"));
        assert!(ReadQueryTool::is_read_only(
            "WITH c AS (SELECT 1) SELECT * FROM c"
        ));
        assert!(!ReadQueryTool::is_read_only("DELETE FROM customers"));
        assert!(!ReadQueryTool::is_read_only("UPDATE customers SET balance = 0"));
        assert!(!ReadQueryTool::is_read_only("DROP TABLE customers"));
        assert!(!ReadQueryTool::is_read_only("EXPLAIN SELECT 1"));
    }

    #[tokio::test]
    async fn test_read_query() {
        let tool = ReadQueryTool::new(seeded().await);
        let result = tool
            .execute(
                ReadQueryInput::new("SELECT id, balance FROM customers ORDER BY id"),
                ToolContext::default(),
            )
            .await
            .unwrap();

        let result: QueryResult = serde_json::from_str(&result.as_text()).unwrap();
        assert_eq!(result.columns, vec!["id", "balance"]);
        assert_eq!(result.row_count, 3);
        assert_eq!(result.rows[1], vec![serde_json::json!("C004"), serde_json::json!(250.5)]);
        assert_eq!(result.rows[2][1], serde_json::Value::Null);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn test_read_query_limit() {
        let tool = ReadQueryTool::new(seeded().await);
        let mut input = ReadQueryInput::new("SELECT id FROM customers");
        input.limit = 2;
        let result = tool.execute(input, ToolContext::default()).await.unwrap();

        let result: QueryResult = serde_json::from_str(&result.as_text()).unwrap();
        assert_eq!(result.row_count, 2);
        assert!(result.truncated);
    }

    #[tokio::test]
    async fn test_write_queries_are_rejected() {
        let db = seeded().await;
        let tool = ReadQueryTool::new(db.clone());

        let err = tool
            .execute(
                ReadQueryInput::new("DELETE FROM customers"),
                ToolContext::default(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid query"));

        // Passes the prefix check but is caught by the prepared statement
        let err = tool
            .execute(
                ReadQueryInput::new(
                    "WITH x AS (SELECT 1) DELETE FROM customers WHERE id IN (SELECT * FROM x)",
                ),
                ToolContext::default(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("modify"));

        assert_eq!(db.describe("customers").await.unwrap().row_count, 3);
    }

    #[tokio::test]
    async fn test_list_and_describe() {
        let db = seeded().await;

        let list = ListTablesTool::new(db.clone())
            .execute(ListTablesInput::default(), ToolContext::default())
            .await
            .unwrap();
        assert_eq!(list.as_text(), r#"["customers"]"#);

        let described = DescribeTableTool::new(db.clone())
            .execute(
                DescribeTableInput {
                    table: "customers".to_string(),
                },
                ToolContext::default(),
            )
            .await
            .unwrap();
        let info: serde_json::Value = serde_json::from_str(&described.as_text()).unwrap();
        assert_eq!(info["row_count"], 3);
        assert_eq!(info["columns"][0]["name"], "id");
        assert_eq!(info["columns"][0]["primary_key"], true);
        assert_eq!(info["columns"][2]["type"], "REAL");
    }

    #[test]
    fn test_read_only_tools() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let names: Vec<String> = read_only_tools(&db)
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["sql_list_tables", "sql_describe_table", "sql_query"]);
    }
}
