//! Tool management and execution for Agent

use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde_json::Value;

use crate::context::RunContext;
use crate::events::AgentEvent;
use crate::tool::ToolResult;
use crate::types::{Message, ToolDefinition, ToolResultBlock, ToolUseBlock};

use super::types::{AgentError, ToolCallInfo, ToolInfo};
use super::Agent;

impl Agent {
    /// List all configured tools
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Tool definitions sent to the model
    pub(crate) fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    /// Format tool input parameters for terminal display
    ///
    /// Returns `None` when this agent has no tool with that name.
    pub fn format_tool_input(&self, tool_name: &str, params: &Value) -> Option<String> {
        let tool = self.tools.iter().find(|t| t.name() == tool_name)?;
        Some(tool.format_input_ansi(params))
    }

    /// Format tool output for terminal display
    pub fn format_tool_output(&self, tool_name: &str, result: &ToolResult) -> Option<String> {
        let tool = self.tools.iter().find(|t| t.name() == tool_name)?;
        Some(tool.format_output_ansi(result))
    }

    async fn execute_tool(
        &self,
        tool_use: &ToolUseBlock,
        ctx: &RunContext,
    ) -> Result<ToolResult, AgentError> {
        let tool_start = Instant::now();
        let tool_id = tool_use.id.clone();
        let tool_name = tool_use.name.clone();
        let input = tool_use.input.clone();

        // Fires exactly once per tool use
        self.emit_event(AgentEvent::ToolRequested {
            agent: self.name.clone(),
            tool_use_id: tool_id.clone(),
            name: tool_name.clone(),
            input: input.clone(),
        });

        if !input.is_object() {
            let type_name = match &input {
                Value::Null => "null",
                Value::Bool(_) => "boolean",
                Value::Number(_) => "number",
                Value::String(_) => "string",
                Value::Array(_) => "array",
                Value::Object(_) => "object",
            };
            let error_msg = format!("Tool input must be a JSON object, got: {}", type_name);
            self.emit_event(AgentEvent::ToolFailed {
                agent: self.name.clone(),
                tool_use_id: tool_id,
                name: tool_name,
                error: error_msg.clone(),
                duration: tool_start.elapsed(),
            });
            return Err(AgentError::InvalidToolInput(error_msg));
        }

        let Some(tool) = self.tools.iter().find(|t| t.name() == tool_use.name) else {
            log::warn!(
                "agent '{}': model called unknown tool '{}'",
                self.name,
                tool_name
            );
            self.emit_event(AgentEvent::ToolFailed {
                agent: self.name.clone(),
                tool_use_id: tool_id,
                name: tool_name.clone(),
                error: format!("Tool not found: {}", tool_name),
                duration: tool_start.elapsed(),
            });
            return Err(AgentError::ToolNotFound(tool_name));
        };

        self.emit_event(AgentEvent::ToolExecuting {
            agent: self.name.clone(),
            tool_use_id: tool_id.clone(),
            name: tool_name.clone(),
        });

        match tool
            .execute_raw(input, ctx.tool_context(Some(&self.name)))
            .await
        {
            Ok(result) => {
                self.emit_event(AgentEvent::ToolCompleted {
                    agent: self.name.clone(),
                    tool_use_id: tool_id,
                    name: tool_name,
                    output: result.clone(),
                    duration: tool_start.elapsed(),
                });
                Ok(result)
            }
            Err(e) => {
                self.emit_event(AgentEvent::ToolFailed {
                    agent: self.name.clone(),
                    tool_use_id: tool_id,
                    name: tool_name,
                    error: e.to_string(),
                    duration: tool_start.elapsed(),
                });
                Err(AgentError::Tool(e))
            }
        }
    }

    /// Process tool calls from a model response
    ///
    /// Executes all tool calls in parallel (up to max_concurrent_tools). Every
    /// call gets a result block, in the order the model requested them;
    /// failures become `"Error: ..."` results for the model to read.
    pub(crate) async fn process_tool_calls(
        &self,
        message: &Message,
        ctx: &RunContext,
        tool_call_infos: &mut Vec<ToolCallInfo>,
    ) -> Vec<ToolResultBlock> {
        let tool_use_blocks: Vec<ToolUseBlock> =
            message.tool_uses().into_iter().cloned().collect();

        let futures: Vec<_> = tool_use_blocks
            .into_iter()
            .enumerate()
            .map(|(idx, tool_use)| async move {
                let start = Instant::now();
                let result = self.execute_tool(&tool_use, ctx).await;
                (idx, tool_use, result, start.elapsed())
            })
            .collect();

        let mut results: Vec<_> = stream::iter(futures)
            .buffer_unordered(self.max_concurrent_tools)
            .collect()
            .await;
        results.sort_by_key(|(idx, ..)| *idx);

        results
            .into_iter()
            .map(|(_, tool_use, result, duration)| match result {
                Ok(tool_result) => {
                    tool_call_infos.push(ToolCallInfo {
                        agent: self.name.clone(),
                        name: tool_use.name.clone(),
                        input: tool_use.input.clone(),
                        output: tool_result.as_text(),
                        success: true,
                        duration,
                    });
                    ToolResultBlock::success(tool_use.id, tool_result)
                }
                Err(e) => {
                    let error_msg = format!("Error: {}", e);
                    tool_call_infos.push(ToolCallInfo {
                        agent: self.name.clone(),
                        name: tool_use.name.clone(),
                        input: tool_use.input.clone(),
                        output: error_msg.clone(),
                        success: false,
                        duration,
                    });
                    ToolResultBlock::error(tool_use.id, error_msg)
                }
            })
            .collect()
    }
}
