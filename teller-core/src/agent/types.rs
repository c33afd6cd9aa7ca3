//! Agent-related types

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::provider::ProviderError;
use crate::store::StoreError;
use crate::tool::ToolError;
use crate::types::Message;

/// Errors that can occur during agent execution
#[derive(Debug, Error)]
pub enum AgentError {
    /// Model provider errors (API calls, authentication, rate limits)
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Tool execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Memory store errors (e.g. reading an instruction record)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Conversation persistence errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Model returned no text response
    #[error("Model returned no text response")]
    NoResponse,

    /// Model returned empty response with no content
    #[error("Model returned empty response with no text or tool use")]
    EmptyResponse,

    /// Response exceeded maximum token limit
    #[error("Response exceeded maximum token limit. Try asking the model to be more concise or break the task into smaller steps.")]
    MaxTokensExceeded,

    /// Response was filtered by content moderation
    #[error("Response was filtered by content moderation")]
    ContentFiltered,

    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid tool input from model
    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    /// Too many model calls within one invocation
    #[error("Recursion limit of {0} model calls reached")]
    RecursionLimit(usize),

    /// Unexpected stop reason from model
    #[error("Unexpected stop reason: {0}")]
    UnexpectedStopReason(String),

    /// Invalid agent or supervisor configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Information about a tool for display purposes
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Default maximum concurrent tool executions
pub const DEFAULT_MAX_CONCURRENT_TOOLS: usize = 12;

/// Result of [`Agent::invoke`](super::Agent::invoke)
///
/// `messages` is the whole conversation: the input followed by everything
/// this run appended.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub messages: Vec<Message>,
    /// Index of the first message produced by this run
    pub new_start: usize,
    /// All tool calls made during this run
    pub tool_calls: Vec<ToolCallInfo>,
    /// Total token usage across all model calls (if available)
    pub token_usage: Option<TokenUsageStats>,
    pub duration: Duration,
    /// Number of model calls made
    pub model_calls: usize,
}

impl AgentRun {
    /// Messages appended by this run
    pub fn new_messages(&self) -> &[Message] {
        &self.messages[self.new_start.min(self.messages.len())..]
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Text of the last message, empty if there is none
    pub fn text(&self) -> String {
        self.last_message().map(Message::text).unwrap_or_default()
    }
}

/// Response from Agent.run() containing the result and execution statistics
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The final text response from the agent
    pub text: String,
    /// All tool calls made during this run
    pub tool_calls: Vec<ToolCallInfo>,
    /// Total token usage across all model calls (if available)
    pub token_usage: Option<TokenUsageStats>,
    /// Total execution time
    pub duration: Duration,
    /// Number of model calls made (includes calls after tool use)
    pub model_calls: usize,
}

impl AgentResponse {
    /// Get just the text response
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for AgentResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<AgentResponse> for String {
    fn from(response: AgentResponse) -> Self {
        response.text
    }
}

impl PartialEq<&str> for AgentResponse {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

/// Information about a tool call made during agent execution
#[derive(Debug, Clone)]
pub struct ToolCallInfo {
    /// Agent that made the call
    pub agent: String,
    pub name: String,
    /// Input parameters (as JSON)
    pub input: Value,
    /// Output from the tool
    pub output: String,
    pub success: bool,
    pub duration: Duration,
}

/// Cumulative token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsageStats {
    /// Total input tokens across all model calls
    pub input_tokens: usize,
    /// Total output tokens across all model calls
    pub output_tokens: usize,
}

impl TokenUsageStats {
    /// Total tokens (input + output)
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }

    /// Combine two optional totals; `None` only when both are `None`
    pub fn merge(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (None, None) => None,
            (a, b) => {
                let (a, b) = (a.unwrap_or_default(), b.unwrap_or_default());
                Some(Self {
                    input_tokens: a.input_tokens + b.input_tokens,
                    output_tokens: a.output_tokens + b.output_tokens,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_stats() {
        let stats = TokenUsageStats {
            input_tokens: 100,
            output_tokens: 50,
        };
        assert_eq!(stats.total(), 150);
    }

    #[test]
    fn test_token_usage_merge() {
        let a = TokenUsageStats {
            input_tokens: 10,
            output_tokens: 5,
        };
        assert_eq!(TokenUsageStats::merge(None, None), None);
        assert_eq!(TokenUsageStats::merge(Some(a), None), Some(a));
        assert_eq!(
            TokenUsageStats::merge(Some(a), Some(a)).map(|t| t.total()),
            Some(30)
        );
    }

    #[test]
    fn test_agent_response() {
        let response = AgentResponse {
            text: "Hello".to_string(),
            tool_calls: vec![],
            token_usage: None,
            duration: Duration::from_secs(1),
            model_calls: 1,
        };
        assert_eq!(response.text(), "Hello");
        assert_eq!(format!("{}", response), "Hello");
        assert!(response == "Hello");
    }

    #[test]
    fn test_agent_run_new_messages() {
        let run = AgentRun {
            messages: vec![
                Message::user("What is my name?"),
                Message::assistant("Boo").with_name("balance_expert"),
            ],
            new_start: 1,
            tool_calls: vec![],
            token_usage: None,
            duration: Duration::ZERO,
            model_calls: 1,
        };
        assert_eq!(run.new_messages().len(), 1);
        assert_eq!(run.text(), "Boo");
    }
}
