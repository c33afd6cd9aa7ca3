//! Banking lookup tools
//!
//! Each tool forwards the model's free-text query to a collaborator and
//! returns the collaborator's answer unchanged. The collaborators are
//! traits so the assistant can be wired to the bundled table agents and
//! retriever, or to anything else that answers the same questions.
//!
//! The tool names are referenced by the worker and supervisor prompts and
//! must not change.

use std::sync::Arc;

use async_trait::async_trait;
use teller_core::tool::{box_tool, DynTool};

use crate::prelude::*;

/// Finds documents relevant to a query
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<String>, ToolError>;
}

/// Answers questions about pending transactions
#[async_trait]
pub trait PendingTransactions: Send + Sync {
    async fn pending_tx(&self, query: &str) -> Result<String, ToolError>;
}

/// Answers questions about customers
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn customer_details(&self, query: &str) -> Result<String, ToolError>;
}

/// Input shared by the banking tools
#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// The question to look up, in plain language
    pub query: String,
}

impl QueryInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Looks up interest rate documents
pub struct InterestRatesTool {
    retriever: Arc<dyn DocumentRetriever>,
}

impl InterestRatesTool {
    pub fn new(retriever: Arc<dyn DocumentRetriever>) -> Self {
        Self { retriever }
    }
}

impl Tool for InterestRatesTool {
    type Input = QueryInput;

    fn name(&self) -> &str {
        "get_interest_rates_from_vector_store"
    }

    fn description(&self) -> &str {
        "Retrieve interest rate information for savings accounts, ISAs and other products."
    }

    async fn execute(&self, input: Self::Input, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let documents = self.retriever.retrieve(&input.query).await?;
        Ok(ToolResult::json(documents)?)
    }
}

/// Looks up pending transactions
pub struct PendingTransactionsTool {
    source: Arc<dyn PendingTransactions>,
}

impl PendingTransactionsTool {
    pub fn new(source: Arc<dyn PendingTransactions>) -> Self {
        Self { source }
    }
}

impl Tool for PendingTransactionsTool {
    type Input = QueryInput;

    fn name(&self) -> &str {
        "get_pending_tx_details_from_pandas_agent"
    }

    fn description(&self) -> &str {
        "Answer questions about customers' pending transactions."
    }

    async fn execute(&self, input: Self::Input, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        Ok(self.source.pending_tx(&input.query).await?.into())
    }
}

/// Looks up customer details
pub struct CustomerDetailsTool {
    directory: Arc<dyn CustomerDirectory>,
}

impl CustomerDetailsTool {
    pub fn new(directory: Arc<dyn CustomerDirectory>) -> Self {
        Self { directory }
    }
}

impl Tool for CustomerDetailsTool {
    type Input = QueryInput;

    fn name(&self) -> &str {
        "get_customer_details_from_sql_agent"
    }

    fn description(&self) -> &str {
        "Answer questions about customer details such as names and account information."
    }

    async fn execute(&self, input: Self::Input, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        Ok(self.directory.customer_details(&input.query).await?.into())
    }
}

/// The three banking tools, one per collaborator
pub fn banking_tools(
    retriever: Arc<dyn DocumentRetriever>,
    pending: Arc<dyn PendingTransactions>,
    customers: Arc<dyn CustomerDirectory>,
) -> Vec<Box<dyn DynTool>> {
    vec![
        box_tool(InterestRatesTool::new(retriever)),
        box_tool(PendingTransactionsTool::new(pending)),
        box_tool(CustomerDetailsTool::new(customers)),
    ]
}
