//! Handoff tools and the messages that record a handoff

use schemars::JsonSchema;
use serde::Deserialize;

use crate::context::ToolContext;
use crate::tool::{Tool, ToolError, ToolResult};
use crate::types::{Message, ToolResultBlock, ToolUseBlock};

/// Prefix of every handoff tool name
pub const HANDOFF_PREFIX: &str = "transfer_to_";

/// Tool name a worker uses to return control
pub const HANDOFF_BACK_TOOL: &str = "transfer_back_to_supervisor";

/// Name of the handoff tool for `agent`
pub fn handoff_tool_name(agent: &str) -> String {
    format!("{}{}", HANDOFF_PREFIX, agent)
}

/// Handoff tools take no arguments
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct HandoffInput {}

/// Tool the supervisor model calls to hand the conversation to a worker
///
/// Executing it only acknowledges the transfer; the supervisor runs the
/// worker once every tool call of the turn has a result.
#[derive(Debug, Clone)]
pub struct HandoffTool {
    agent: String,
    name: String,
    description: String,
}

impl HandoffTool {
    pub fn new(agent: impl Into<String>) -> Self {
        let agent = agent.into();
        Self {
            name: handoff_tool_name(&agent),
            description: format!("Ask agent '{}' for help", agent),
            agent,
        }
    }

    /// The worker this tool transfers to
    pub fn agent(&self) -> &str {
        &self.agent
    }
}

impl Tool for HandoffTool {
    type Input = HandoffInput;

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(
        &self,
        _input: HandoffInput,
        _ctx: ToolContext,
    ) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::text(format!(
            "Successfully transferred to {}",
            self.agent
        )))
    }

    fn format_input_plain(&self, _params: &serde_json::Value) -> String {
        format!("→ {}", self.agent)
    }

    fn format_input_ansi(&self, _params: &serde_json::Value) -> String {
        format!("\x1b[36m→ {}\x1b[0m", self.agent)
    }
}

/// The pair of messages recording that `worker` returned control
///
/// An assistant message authored by the worker calling
/// `transfer_back_to_supervisor`, then its result.
pub fn handoff_back_messages(worker: &str, supervisor: &str) -> [Message; 2] {
    let id = format!("call_{}", uuid::Uuid::new_v4().simple());
    let call = Message::assistant_with_tool_use(
        "Transferring back to supervisor",
        vec![ToolUseBlock {
            id: id.clone(),
            name: HANDOFF_BACK_TOOL.to_string(),
            input: serde_json::json!({}),
        }],
    )
    .with_name(worker);

    let result = Message::tool_results(vec![ToolResultBlock::success(
        id,
        format!("Successfully transferred back to {}", supervisor),
    )]);

    [call, result]
}
