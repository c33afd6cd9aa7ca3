//! Test utilities for teller-core.
//!
//! Mock implementations for testing agents, supervisors and apps without
//! real provider credentials. Enable with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! teller-core = { path = "../teller-core", features = ["test-utils"] }
//! ```
//!
//! ```rust
//! use teller_core::{Agent, test_utils::MockProvider};
//!
//! # async fn example() -> teller_core::Result<()> {
//! let provider = MockProvider::new().with_text("Hello from mock!");
//!
//! let agent = Agent::builder().provider(provider).build().await?;
//!
//! let response = agent.run("Hi").await?;
//! assert_eq!(response.text(), "Hello from mock!");
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex};

use crate::events::{AgentEvent, TokenUsage};
use crate::model::ModelResponse;
use crate::provider::{ModelProvider, ProviderError};
use crate::types::{Message, StopReason, ToolDefinition, ToolUseBlock};

/// A request received by [`MockProvider`]
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub system_prompt: Option<String>,
}

impl CapturedRequest {
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// A mock model provider for testing.
///
/// Returns pre-programmed responses in order and records every request.
/// Clones share the queue and the recorded requests.
///
/// ```rust
/// use teller_core::test_utils::MockProvider;
/// use serde_json::json;
///
/// let provider = MockProvider::new()
///     .with_tool_use("get_interest_rates_from_vector_store", json!({"query": "Cash ISA"}))
///     .with_text("The rate is 4.5%");
/// ```
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Result<ModelResponse, ProviderError>>>>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an arbitrary response
    pub fn with_response(self, response: ModelResponse) -> Self {
        self.responses.lock().unwrap().push(Ok(response));
        self
    }

    /// Queue a text response with `StopReason::EndTurn`.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(ModelResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: Some(TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            }),
        })
    }

    /// Queue a single tool call with `StopReason::ToolUse`.
    pub fn with_tool_use(self, tool_name: impl Into<String>, tool_input: serde_json::Value) -> Self {
        self.with_tool_uses(vec![(tool_name.into(), tool_input)])
    }

    /// Queue several tool calls in one turn.
    pub fn with_tool_uses(self, calls: Vec<(String, serde_json::Value)>) -> Self {
        let tool_uses = calls
            .into_iter()
            .map(|(name, input)| ToolUseBlock {
                id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                name,
                input,
            })
            .collect();

        self.with_response(ModelResponse {
            message: Message::assistant_with_tool_use("", tool_uses),
            stop_reason: StopReason::ToolUse,
            usage: None,
        })
    }

    /// Queue an error.
    pub fn with_error(self, error: ProviderError) -> Self {
        self.responses.lock().unwrap().push(Err(error));
        self
    }

    /// Number of times `generate` was called.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Responses not consumed yet.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "MockProvider"
    }

    fn max_context_tokens(&self) -> usize {
        200_000
    }

    fn max_output_tokens(&self) -> usize {
        8_192
    }

    async fn generate(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        system_prompt: Option<String>,
    ) -> Result<ModelResponse, ProviderError> {
        self.requests.lock().unwrap().push(CapturedRequest {
            messages,
            tools,
            system_prompt,
        });

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ProviderError::Other(
                "MockProvider: No more responses configured".to_string(),
            ));
        }

        responses.remove(0)
    }
}

/// Collects agent events for verification in tests.
///
/// ```rust
/// use teller_core::{Agent, test_utils::{MockProvider, EventCollector}};
///
/// # async fn example() -> teller_core::Result<()> {
/// let collector = EventCollector::new();
/// let agent = Agent::builder()
///     .provider(MockProvider::new().with_text("Hello!"))
///     .build()
///     .await?;
///
/// agent.add_hook(collector.clone());
/// agent.run("Hi").await?;
///
/// assert!(collector.has_event("run_started"));
/// assert!(collector.has_event("run_completed"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<AgentEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected events.
    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Get all collected event type names.
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| Self::event_type_name(e).to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Check if a specific event type was collected.
    pub fn has_event(&self, event_type: &str) -> bool {
        self.count_event(event_type) > 0
    }

    /// Count occurrences of a specific event type.
    pub fn count_event(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| Self::event_type_name(e) == event_type)
            .count()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    /// `(from, to)` of every handoff, in order
    pub fn handoffs(&self) -> Vec<(String, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                AgentEvent::Handoff { from, to } => Some((from.clone(), to.clone())),
                _ => None,
            })
            .collect()
    }

    fn event_type_name(event: &AgentEvent) -> &'static str {
        match event {
            AgentEvent::RunStarted { .. } => "run_started",
            AgentEvent::RunCompleted { .. } => "run_completed",
            AgentEvent::RunFailed { .. } => "run_failed",
            AgentEvent::ModelCallStarted { .. } => "model_call_started",
            AgentEvent::ModelCallCompleted { .. } => "model_call_completed",
            AgentEvent::ToolRequested { .. } => "tool_requested",
            AgentEvent::ToolExecuting { .. } => "tool_executing",
            AgentEvent::ToolCompleted { .. } => "tool_completed",
            AgentEvent::ToolFailed { .. } => "tool_failed",
            AgentEvent::Handoff { .. } => "handoff",
            AgentEvent::HandoffBack { .. } => "handoff_back",
            AgentEvent::CheckpointLoaded { .. } => "checkpoint_loaded",
            AgentEvent::CheckpointSaved { .. } => "checkpoint_saved",
        }
    }
}

impl crate::events::AgentHook for EventCollector {
    fn on_event(&self, event: &AgentEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
