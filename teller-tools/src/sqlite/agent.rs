//! Agents that answer questions by querying SQLite tables

use std::sync::Arc;

use async_trait::async_trait;
use teller_core::{Agent, ModelProvider, ToolError};

use crate::banking::{CustomerDirectory, PendingTransactions};
use crate::sqlite::database::SqliteDatabase;
use crate::sqlite::query::read_only_tools;
use crate::sqlite::types::TableInfo;

const TABLE_AGENT_PROMPT: &str = "You are an agent designed to interact with a SQL database. \
Given an input question, create a syntactically correct SQLite query to run, \
then look at the results of the query and return the answer. \
Never query for all the columns from a table, only ask for the relevant columns given the question. \
You can only read data; do not try to modify the database. \
If the question cannot be answered from the tables, say so.";

/// An agent with read-only access to the tables of one database
///
/// The table layout is described in the agent's prompt when it is built, so
/// the model can usually write its query without inspecting the schema first.
pub struct TableAgent {
    agent: Agent,
    db: SqliteDatabase,
}

impl TableAgent {
    /// Build an agent over every table currently in `db`
    pub async fn new(
        name: &str,
        db: SqliteDatabase,
        provider: Arc<dyn ModelProvider>,
    ) -> teller_core::Result<Self> {
        Self::with_instructions(name, db, provider, "").await
    }

    /// Like [`new`](Self::new) with extra domain instructions appended to the prompt
    pub async fn with_instructions(
        name: &str,
        db: SqliteDatabase,
        provider: Arc<dyn ModelProvider>,
        instructions: &str,
    ) -> teller_core::Result<Self> {
        let mut tables = Vec::new();
        for table in db.table_names().await? {
            tables.push(db.describe(&table).await?);
        }

        let agent = Agent::builder()
            .name(name)
            .shared_provider(provider)
            .add_tools(read_only_tools(&db))
            .with_system_prompt(table_prompt(&tables, instructions))
            .build()
            .await?;

        log::debug!("built table agent {} over {}", name, db.label());
        Ok(Self { agent, db })
    }

    /// Answer `question` from the tables
    pub async fn ask(&self, question: &str) -> Result<String, ToolError> {
        let response = self
            .agent
            .run(question)
            .await
            .map_err(|e| ToolError::Custom(format!("{} failed: {}", self.agent.name(), e)))?;
        Ok(response.text)
    }

    pub fn database(&self) -> &SqliteDatabase {
        &self.db
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}

fn table_prompt(tables: &[TableInfo], instructions: &str) -> String {
    let mut prompt = String::from(TABLE_AGENT_PROMPT);
    prompt.push_str("\n\nTables:\n");
    for table in tables {
        prompt.push_str(&format!("- {} ({} rows)\n", table.signature(), table.row_count));
    }
    if !instructions.is_empty() {
        prompt.push('\n');
        prompt.push_str(instructions);
    }
    prompt
}

#[async_trait]
impl PendingTransactions for TableAgent {
    async fn pending_tx(&self, query: &str) -> Result<String, ToolError> {
        self.ask(query).await
    }
}

#[async_trait]
impl CustomerDirectory for TableAgent {
    async fn customer_details(&self, query: &str) -> Result<String, ToolError> {
        self.ask(query).await
    }
}

impl std::fmt::Debug for TableAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableAgent")
            .field("agent", &self.agent.name())
            .field("db", &self.db)
            .finish()
    }
}
