//! SQLite-backed conversation checkpoints

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use teller_core::{Checkpoint, CheckpointError, Checkpointer};

/// SQLite-based checkpoint storage
///
/// One row per thread holding the full message history as JSON, so
/// conversations survive restarts of the shell.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use teller_cli::SqliteCheckpointer;
///
/// # fn example() -> Result<(), teller_core::CheckpointError> {
/// let checkpointer = Arc::new(SqliteCheckpointer::new(".teller/threads.db")?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SqliteCheckpointer {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCheckpointer {
    /// Open or create the database at `path`
    ///
    /// Creates the parent directory and the schema if they don't exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CheckpointError::Storage(format!("Failed to create directory: {}", e))
            })?;
        }

        let conn = Connection::open(&path)
            .map_err(|e| CheckpointError::Storage(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    /// Private in-memory database
    pub fn in_memory() -> Result<Self, CheckpointError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CheckpointError::Storage(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, CheckpointError> {
        conn.execute_batch(include_str!("schema.sql"))
            .map_err(|e| CheckpointError::Storage(format!("Failed to initialize schema: {}", e)))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, CheckpointError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, CheckpointError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&mut conn.lock()))
            .await
            .map_err(|e| CheckpointError::Storage(format!("Task join error: {}", e)))?
    }
}

fn storage(e: rusqlite::Error) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}

fn timestamp(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}

#[async_trait]
impl Checkpointer for SqliteCheckpointer {
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        if thread_id.is_empty() {
            return Err(CheckpointError::ThreadIdRequired);
        }
        let thread_id = thread_id.to_string();

        self.blocking(move |conn| {
            let row = conn
                .query_row(
                    "SELECT step, messages, created_at, updated_at
                     FROM checkpoints WHERE thread_id = ?",
                    params![thread_id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, i64>(3)?,
                        ))
                    },
                )
                .optional()
                .map_err(storage)?;

            let Some((step, messages, created_at, updated_at)) = row else {
                return Ok(None);
            };

            Ok(Some(Checkpoint {
                thread_id,
                messages: serde_json::from_str(&messages)?,
                step: step as u64,
                created_at: timestamp(created_at),
                updated_at: timestamp(updated_at),
            }))
        })
        .await
    }

    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        if checkpoint.thread_id.is_empty() {
            return Err(CheckpointError::ThreadIdRequired);
        }
        let messages = serde_json::to_string(&checkpoint.messages)?;
        let checkpoint = checkpoint.clone();

        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO checkpoints (thread_id, step, messages, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(thread_id) DO UPDATE SET
                     step = excluded.step,
                     messages = excluded.messages,
                     updated_at = excluded.updated_at",
                params![
                    checkpoint.thread_id,
                    checkpoint.step as i64,
                    messages,
                    checkpoint.created_at.timestamp_millis(),
                    checkpoint.updated_at.timestamp_millis(),
                ],
            )
            .map_err(storage)?;
            Ok(())
        })
        .await
    }

    async fn list_threads(&self) -> Result<Vec<String>, CheckpointError> {
        self.blocking(|conn| {
            let mut stmt = conn
                .prepare("SELECT thread_id FROM checkpoints ORDER BY updated_at DESC, thread_id")
                .map_err(storage)?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(storage)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(storage)?;
            Ok(ids)
        })
        .await
    }

    async fn delete(&self, thread_id: &str) -> Result<bool, CheckpointError> {
        let thread_id = thread_id.to_string();
        self.blocking(move |conn| {
            let rows = conn
                .execute(
                    "DELETE FROM checkpoints WHERE thread_id = ?",
                    params![thread_id],
                )
                .map_err(storage)?;
            Ok(rows > 0)
        })
        .await
    }
}

impl std::fmt::Debug for SqliteCheckpointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCheckpointer").finish_non_exhaustive()
    }
}
