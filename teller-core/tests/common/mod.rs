//! Common test utilities shared across test files.
//!
//! This module provides mock implementations and test helpers.
//! Items here may not be used by all test files, hence the module-level allow.
#![allow(dead_code)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use teller_core::{
    namespace, AgentEvent, AgentHook, Message, ModelProvider, ModelResponse, ProviderError,
    StopReason, Tool, ToolContext, ToolDefinition, ToolError, ToolResult, ToolUseBlock,
};

// ===== Test Tools =====

/// Input for the expert test tools
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CustomerInput {
    pub customer_id: String,
}

/// Returns a fixed interest rate
pub struct InterestRateTool;

impl Tool for InterestRateTool {
    type Input = CustomerInput;

    fn name(&self) -> &str {
        "get_interest_rate"
    }

    fn description(&self) -> &str {
        "Get the interest rate for a customer"
    }

    async fn execute(&self, _input: Self::Input, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::text("0.025"))
    }
}

/// Returns a fixed balance
pub struct BalanceTool;

impl Tool for BalanceTool {
    type Input = CustomerInput;

    fn name(&self) -> &str {
        "check_balance"
    }

    fn description(&self) -> &str {
        "Get the account balance for a customer"
    }

    async fn execute(&self, _input: Self::Input, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::text("1000.0"))
    }
}

/// A tool that always errors for testing error handling
pub struct ErrorTool;

impl Tool for ErrorTool {
    type Input = CustomerInput;

    fn name(&self) -> &str {
        "error_tool"
    }

    fn description(&self) -> &str {
        "A tool that errors"
    }

    async fn execute(&self, _input: Self::Input, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        Err(ToolError::Custom("Intentional error".to_string()))
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct NoteInput {
    pub note: String,
}

/// Writes its input to the store under ("notes", <thread id>)
pub struct NoteTool;

impl Tool for NoteTool {
    type Input = NoteInput;

    fn name(&self) -> &str {
        "save_note"
    }

    fn description(&self) -> &str {
        "Save a note"
    }

    async fn execute(&self, input: Self::Input, ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let store = ctx
            .store
            .ok_or_else(|| ToolError::Custom("no store".to_string()))?;
        let thread = ctx.thread_id.unwrap_or_else(|| "none".to_string());
        store
            .put(
                &namespace(["notes", thread.as_str()]),
                "latest",
                serde_json::json!({"content": input.note, "agent": ctx.agent_name}),
            )
            .await
            .map_err(|e| ToolError::Custom(e.to_string()))?;
        Ok(ToolResult::text("saved"))
    }
}

// ===== Event Collectors for Hook Testing =====

/// Collects event types as strings for simple verification
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl AgentHook for EventCollector {
    fn on_event(&self, event: &AgentEvent) {
        let event_type = match event {
            AgentEvent::RunStarted { agent, .. } => format!("run_started:{}", agent),
            AgentEvent::RunCompleted { agent, .. } => format!("run_completed:{}", agent),
            AgentEvent::RunFailed { agent, .. } => format!("run_failed:{}", agent),
            AgentEvent::ModelCallStarted { .. } => "model_call_started".to_string(),
            AgentEvent::ModelCallCompleted { .. } => "model_call_completed".to_string(),
            AgentEvent::ToolRequested { .. } => "tool_requested".to_string(),
            AgentEvent::ToolExecuting { .. } => "tool_executing".to_string(),
            AgentEvent::ToolCompleted { .. } => "tool_completed".to_string(),
            AgentEvent::ToolFailed { .. } => "tool_failed".to_string(),
            AgentEvent::Handoff { to, .. } => format!("handoff:{}", to),
            AgentEvent::HandoffBack { from, .. } => format!("handoff_back:{}", from),
            AgentEvent::CheckpointLoaded { .. } => "checkpoint_loaded".to_string(),
            AgentEvent::CheckpointSaved { .. } => "checkpoint_saved".to_string(),
        };
        self.events.lock().unwrap().push(event_type);
    }
}

// ===== Mock Provider =====

/// A mock provider for testing that returns pre-programmed responses
/// and records the conversation it was sent each time
#[derive(Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<ModelResponse>>>,
    seen: Arc<Mutex<Vec<(Vec<Message>, Vec<String>, Option<String>)>>>,
}

impl MockProvider {
    /// Create a new mock provider with no responses
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a text response
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(ModelResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: None,
        });
        self
    }

    /// Add a tool use response
    pub fn with_tool_use(self, tool_name: impl Into<String>, tool_input: serde_json::Value) -> Self {
        let tool_use = ToolUseBlock {
            id: format!("tool_{}", uuid::Uuid::new_v4()),
            name: tool_name.into(),
            input: tool_input,
        };

        self.responses.lock().unwrap().push(ModelResponse {
            message: Message::assistant_with_tool_use("", vec![tool_use]),
            stop_reason: StopReason::ToolUse,
            usage: None,
        });
        self
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Messages sent on call `i`
    pub fn messages(&self, i: usize) -> Vec<Message> {
        self.seen.lock().unwrap()[i].0.clone()
    }

    /// Tool names offered on call `i`
    pub fn tools(&self, i: usize) -> Vec<String> {
        self.seen.lock().unwrap()[i].1.clone()
    }

    /// System prompt sent on call `i`
    pub fn system_prompt(&self, i: usize) -> Option<String> {
        self.seen.lock().unwrap()[i].2.clone()
    }
}

#[async_trait::async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "MockProvider"
    }

    fn max_context_tokens(&self) -> usize {
        128_000
    }

    fn max_output_tokens(&self) -> usize {
        16_384
    }

    async fn generate(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        system_prompt: Option<String>,
    ) -> Result<ModelResponse, ProviderError> {
        self.seen.lock().unwrap().push((
            messages,
            tools.into_iter().map(|t| t.name).collect(),
            system_prompt,
        ));

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ProviderError::Other(
                "No more responses configured".to_string(),
            ));
        }

        Ok(responses.remove(0))
    }
}
