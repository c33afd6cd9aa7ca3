//! SQLite database handle shared by the table tools

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Connection;

use crate::sqlite::error::SqliteToolError;
use crate::sqlite::types::{ColumnDefinition, TableInfo};
use teller_core::ToolError;

/// A single SQLite connection shared between tools
///
/// Cloning is cheap; clones use the same connection. Every operation runs on
/// tokio's blocking pool.
#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
    label: String,
}

impl SqliteDatabase {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqliteToolError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| SqliteToolError::ConnectionFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::from_connection(conn, path.display().to_string()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, SqliteToolError> {
        let conn = Connection::open_in_memory().map_err(|e| SqliteToolError::ConnectionFailed {
            path: PathBuf::from(":memory:"),
            message: e.to_string(),
        })?;
        Ok(Self::from_connection(conn, ":memory:".to_string()))
    }

    fn from_connection(conn: Connection, label: String) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            label,
        }
    }

    /// Where the database lives, for logs
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run `f` with the connection on the blocking pool
    pub async fn with_connection<T, F>(&self, f: F) -> Result<T, SqliteToolError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SqliteToolError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn)
        })
        .await
        .map_err(|e| SqliteToolError::Join(e.to_string()))?
    }

    /// Like [`with_connection`](Self::with_connection) for tool bodies
    pub(crate) async fn run<T, F>(&self, f: F) -> Result<T, ToolError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SqliteToolError> + Send + 'static,
    {
        self.with_connection(f).await.map_err(Into::into)
    }

    /// Load a CSV file with a header row into a new table
    ///
    /// Any existing table of that name is replaced. Column types are
    /// inferred from the data: a column whose every non-empty value parses
    /// as an integer becomes INTEGER, as a number REAL, and TEXT otherwise.
    /// Returns the number of rows loaded.
    pub async fn load_csv(
        &self,
        table: &str,
        path: impl AsRef<Path>,
    ) -> Result<usize, SqliteToolError> {
        validate_identifier(table)?;
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(SqliteToolError::CsvLoad {
                path,
                message: "file not found".to_string(),
            });
        }
        let table = table.to_string();

        let rows = self
            .with_connection(move |conn| load_csv_blocking(conn, &table, &path))
            .await?;
        log::debug!("loaded {} rows into {}", rows, self.label);
        Ok(rows)
    }

    /// Names of the user tables, sorted
    pub async fn table_names(&self) -> Result<Vec<String>, SqliteToolError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master
                 WHERE type IN ('table', 'view')
                   AND name NOT LIKE 'sqlite_%'
                   AND name NOT LIKE '\\_%' ESCAPE '\\'
                 ORDER BY name",
            )?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names)
        })
        .await
    }

    /// Columns and row count of `table`
    pub async fn describe(&self, table: &str) -> Result<TableInfo, SqliteToolError> {
        let table = table.to_string();
        self.with_connection(move |conn| describe_blocking(conn, &table))
            .await
    }
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("label", &self.label)
            .finish()
    }
}

/// Table names are interpolated into SQL, so only plain identifiers are accepted
pub(crate) fn validate_identifier(name: &str) -> Result<(), SqliteToolError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SqliteToolError::InvalidTableName(name.to_string()))
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Affinity {
    Integer,
    Real,
    Text,
}

impl Affinity {
    fn sql(self) -> &'static str {
        match self {
            Affinity::Integer => "INTEGER",
            Affinity::Real => "REAL",
            Affinity::Text => "TEXT",
        }
    }

    fn widen(self, value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return self;
        }
        match self {
            Affinity::Integer if value.parse::<i64>().is_ok() => Affinity::Integer,
            Affinity::Integer | Affinity::Real if value.parse::<f64>().is_ok() => Affinity::Real,
            _ => Affinity::Text,
        }
    }
}

fn load_csv_blocking(
    conn: &Connection,
    table: &str,
    path: &Path,
) -> Result<usize, SqliteToolError> {
    let csv_error = |e: rusqlite::Error| SqliteToolError::CsvLoad {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    rusqlite::vtab::csvtab::load_module(conn)?;
    let staging = format!("_csv_{}", table);
    let filename = path.display().to_string().replace('\'', "''");
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS temp.\"{staging}\";
         CREATE VIRTUAL TABLE temp.\"{staging}\" USING csv(filename='{filename}', header=yes);"
    ))
    .map_err(csv_error)?;

    let result = copy_staged(conn, &staging, table);
    conn.execute_batch(&format!("DROP TABLE IF EXISTS temp.\"{staging}\";"))?;
    result
}

fn copy_staged(conn: &Connection, staging: &str, table: &str) -> Result<usize, SqliteToolError> {
    let (columns, affinities, records) = {
        let mut stmt = conn.prepare(&format!("SELECT * FROM temp.\"{staging}\""))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mut affinities = vec![Affinity::Integer; columns.len()];
        let mut records: Vec<Vec<Option<String>>> = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut record = Vec::with_capacity(columns.len());
            for (i, affinity) in affinities.iter_mut().enumerate() {
                let value: Option<String> = row.get(i)?;
                if let Some(v) = &value {
                    *affinity = affinity.widen(v);
                }
                record.push(value.filter(|v| !v.trim().is_empty()));
            }
            records.push(record);
        }
        (columns, affinities, records)
    };

    let definitions: Vec<String> = columns
        .iter()
        .zip(&affinities)
        .map(|(name, affinity)| format!("\"{}\" {}", name.replace('"', "\"\""), affinity.sql()))
        .collect();
    let placeholders = vec!["?"; columns.len()].join(", ");

    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS \"{table}\"; CREATE TABLE \"{table}\" ({});",
        definitions.join(", ")
    ))?;
    let mut insert = conn.prepare(&format!("INSERT INTO \"{table}\" VALUES ({placeholders})"))?;
    for record in &records {
        insert.execute(rusqlite::params_from_iter(record.iter()))?;
    }
    Ok(records.len())
}

fn describe_blocking(conn: &Connection, table: &str) -> Result<TableInfo, SqliteToolError> {
    conn.query_row(
        "SELECT name FROM sqlite_master WHERE name = ?1 AND type IN ('table', 'view')",
        [table],
        |row| row.get::<_, String>(0),
    )
    .map_err(|_| SqliteToolError::TableNotFound(table.to_string()))?;

    let mut stmt = conn.prepare("SELECT * FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| {
            let notnull: i32 = row.get(3)?;
            let pk: i32 = row.get(5)?;
            Ok(ColumnDefinition {
                name: row.get(1)?,
                data_type: row.get(2)?,
                nullable: notnull == 0,
                primary_key: pk > 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let row_count = conn.query_row(
        &format!("SELECT COUNT(*) FROM \"{}\"", table.replace('"', "\"\"")),
        [],
        |row| row.get(0),
    )?;

    Ok(TableInfo {
        name: table.to_string(),
        columns,
        row_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("pending_transactions").is_ok());
        assert!(validate_identifier("_x1").is_ok());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("a; DROP TABLE b").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn test_affinity_widening() {
        let a = Affinity::Integer.widen("12");
        assert!(a == Affinity::Integer);
        let a = a.widen("12.5");
        assert!(a == Affinity::Real);
        let a = a.widen("");
        assert!(a == Affinity::Real);
        assert!(a.widen("n/a") == Affinity::Text);
        assert!(Affinity::Text.widen("3") == Affinity::Text);
    }

    #[tokio::test]
    async fn test_load_csv_infers_types() {
        let csv = write_csv(
            "customer_id,amount,description\nC001,250.75,Rent\nC002,100,Groceries\nC001,,Refund\n",
        );
        let db = SqliteDatabase::open_in_memory().unwrap();
        let rows = db.load_csv("pending_transactions", csv.path()).await.unwrap();
        assert_eq!(rows, 3);

        let info = db.describe("pending_transactions").await.unwrap();
        assert_eq!(info.row_count, 3);
        let types: Vec<&str> = info.columns.iter().map(|c| c.data_type.as_str()).collect();
        assert_eq!(types, vec!["TEXT", "REAL", "TEXT"]);

        let total: f64 = db
            .with_connection(|conn| {
                Ok(conn.query_row(
                    "SELECT SUM(amount) FROM pending_transactions WHERE customer_id = 'C001'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert!((total - 250.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_load_csv_replaces_table() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let first = write_csv("id,name\n1,a\n2,b\n");
        let second = write_csv("id,name\n3,c\n");
        db.load_csv("customers", first.path()).await.unwrap();
        db.load_csv("customers", second.path()).await.unwrap();

        assert_eq!(db.describe("customers").await.unwrap().row_count, 1);
        assert_eq!(db.table_names().await.unwrap(), vec!["customers"]);
    }

    #[tokio::test]
    async fn test_load_csv_missing_file() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let err = db
            .load_csv("customers", "/nonexistent/customers.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, SqliteToolError::CsvLoad { .. }));
    }

    #[tokio::test]
    async fn test_describe_unknown_table() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let err = db.describe("nope").await.unwrap_err();
        assert!(matches!(err, SqliteToolError::TableNotFound(_)));
    }

    #[tokio::test]
    async fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.db");
        {
            let db = SqliteDatabase::open(&path).unwrap();
            db.with_connection(|conn| {
                conn.execute_batch("CREATE TABLE accounts (id TEXT); INSERT INTO accounts VALUES ('A1');")?;
                Ok(())
            })
            .await
            .unwrap();
        }
        let db = SqliteDatabase::open(&path).unwrap();
        assert_eq!(db.table_names().await.unwrap(), vec!["accounts"]);
        assert!(db.label().ends_with("bank.db"));
    }
}
