//! SQLite-backed table agents
//!
//! Loads CSV exports or opens an existing database file, exposes the tables
//! through read-only tools and wraps them in a [`TableAgent`] that answers
//! free-text questions. The bundled pending-transaction and customer
//! collaborators are both table agents.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use teller_core::{Gemini2Flash, OpenAiCompatProvider};
//! use teller_tools::sqlite::{SqliteDatabase, TableAgent};
//!
//! # async fn example() -> teller_core::Result<()> {
//! let db = SqliteDatabase::open_in_memory()?;
//! db.load_csv("pending_transactions", "data/pending_transactions.csv").await?;
//!
//! let provider = Arc::new(OpenAiCompatProvider::new(Gemini2Flash, None)?);
//! let agent = TableAgent::new("pandas_agent", db, provider).await?;
//! println!("{}", agent.ask("total pending for c004").await?);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod database;
pub mod error;
pub mod query;
pub mod types;

pub use agent::TableAgent;
pub use database::SqliteDatabase;
pub use error::SqliteToolError;
pub use query::{read_only_tools, DescribeTableTool, ListTablesTool, ReadQueryTool};
pub use types::{ColumnDefinition, QueryResult, TableInfo};
