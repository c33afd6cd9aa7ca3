//! Three single-tool experts behind a supervisor, sharing memory
//!
//! The experts' tools return fixed values. The script asks a question that
//! needs all three, then checks that the supervisor remembers the user's
//! name within the same thread.

use std::sync::Arc;

use teller_core::{Agent, App, Checkpointer, ModelProvider, Store, Supervisor, Workflow};
use teller_tools::memory::{memory_tools, MemoryNamespace};

use crate::assistant::MEMORY_NAMESPACE;
use crate::prelude::*;

pub const THREAD_ID: &str = "1";

pub const SUPERVISOR_PROMPT: &str = concat!(
    "You are a bank supervisor managing an interest rate expert, a balance expert, and a pending transaction expert. ",
    "For interest rate, use interest_rate_agent. ",
    "For customer balance, use balance_agent. ",
    "For pending transaction amount, use pending_tx_agent.",
);

/// Asked in order on [`THREAD_ID`]
pub const QUERIES: [&str; 3] = [
    "What is the current interest rate, customer account balance and pending transaction amount?",
    "my name is boo",
    "What is my name?",
];

/// The fixed tools take no arguments
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoInput {}

/// Get the current interest rate
pub struct InterestRateTool;

impl Tool for InterestRateTool {
    type Input = NoInput;

    fn name(&self) -> &str {
        "get_interest_rate"
    }

    fn description(&self) -> &str {
        "Get the current interest rate."
    }

    async fn execute(&self, _input: NoInput, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        println!("Getting interest rate...");
        Ok(ToolResult::json(0.025)?)
    }
}

/// Get the customer's balance
pub struct CustomerBalanceTool;

impl Tool for CustomerBalanceTool {
    type Input = NoInput;

    fn name(&self) -> &str {
        "get_customer_balance"
    }

    fn description(&self) -> &str {
        "Get the customer's balance."
    }

    async fn execute(&self, _input: NoInput, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        println!("Getting customer balance...");
        Ok(ToolResult::json(1000.0)?)
    }
}

/// Get the pending transaction amount
pub struct PendingTxTool;

impl Tool for PendingTxTool {
    type Input = NoInput;

    fn name(&self) -> &str {
        "get_pending_tx"
    }

    fn description(&self) -> &str {
        "Get the pending transaction amount."
    }

    async fn execute(&self, _input: NoInput, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        println!("Getting pending transaction amount...");
        Ok(ToolResult::json(500.0)?)
    }
}

async fn expert(
    name: &str,
    prompt: &str,
    provider: Arc<dyn ModelProvider>,
    tool: impl Tool + 'static,
) -> teller_core::Result<Agent> {
    Agent::builder()
        .name(name)
        .shared_provider(provider)
        .add_tool(tool)
        .add_tools(memory_tools(MemoryNamespace::new([MEMORY_NAMESPACE])))
        .with_system_prompt(prompt)
        .build()
        .await
}

/// Build the experts and supervisor on one model and compile them
pub async fn compile(
    provider: Arc<dyn ModelProvider>,
    store: Arc<dyn Store>,
    checkpointer: Arc<dyn Checkpointer>,
) -> teller_core::Result<App> {
    let experts = [
        expert(
            "interest_rate_expert",
            "You are an interest rate expert. Provide the current interest rate.",
            provider.clone(),
            InterestRateTool,
        )
        .await?,
        expert(
            "balance_expert",
            "You are a balance expert. Provide the customer's balance.",
            provider.clone(),
            CustomerBalanceTool,
        )
        .await?,
        expert(
            "pending_tx_expert",
            "You are a pending transaction expert. Provide the pending transaction amount.",
            provider.clone(),
            PendingTxTool,
        )
        .await?,
    ];

    let supervisor = Supervisor::builder()
        .add_workers(experts)
        .shared_provider(provider)
        .with_system_prompt(SUPERVISOR_PROMPT)
        .build()
        .await?;
    Ok(supervisor.compile(Some(store), Some(checkpointer)))
}

/// Ask [`QUERIES`] in order and return the answers
pub async fn run(app: &App) -> teller_core::Result<Vec<String>> {
    let mut answers = Vec::with_capacity(QUERIES.len());
    for query in QUERIES {
        answers.push(app.chat(query, THREAD_ID).await?);
    }
    Ok(answers)
}
