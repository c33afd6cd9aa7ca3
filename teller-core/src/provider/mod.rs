//! Model providers
//!
//! Every model the assistant talks to sits behind [`ModelProvider`]. The one
//! HTTP implementation, [`OpenAiCompatProvider`], speaks the chat-completions
//! wire format, which both OpenAI and Gemini's compatibility endpoint accept.

pub mod openai;
pub mod retry;

use std::sync::Arc;

use crate::types::{Message, ToolDefinition};

pub use openai::OpenAiCompatProvider;
pub use retry::{RetryCallback, RetryConfig, RetryInfo};

pub use crate::model::ModelResponse;

/// Why a model call failed
///
/// The variants drive retry decisions (see [`retry::is_retryable_error`]) and
/// map one-to-one onto the top-level [`crate::Error`] categories.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Missing or rejected API key (HTTP 401/403)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// HTTP 429
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The request never got a response
    #[error("Network error: {0}")]
    Network(String),

    /// The model refused or the reply could not be understood
    #[error("Model error: {0}")]
    Model(String),

    /// HTTP 5xx
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Bad model id, unknown vendor, unusable base URL
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("{0}")]
    Other(String),
}

/// A chat model that can call tools
///
/// Agents, supervisors, table agents and the prompt optimizer all hold an
/// `Arc<dyn ModelProvider>`, so one provider is usually shared by several of
/// them.
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    /// Display name, e.g. "o3-mini"
    fn name(&self) -> &str;

    /// Input window in tokens; context policies trim history to fit
    fn max_context_tokens(&self) -> usize;

    /// Completion limit sent with each request
    fn max_output_tokens(&self) -> usize;

    /// Rough token count, four bytes per token
    fn estimate_token_count(&self, text: &str) -> usize {
        text.len().div_ceil(4)
    }

    /// Rough token count for a message list
    fn estimate_message_tokens(&self, messages: &[Message]) -> usize {
        messages
            .iter()
            .map(|message| {
                // per-message role overhead
                4 + message
                    .content
                    .iter()
                    .map(|block| self.estimate_token_count(&format!("{:?}", block)))
                    .sum::<usize>()
            })
            .sum()
    }

    /// One completion over `messages`, offering `tools`
    async fn generate(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        system_prompt: Option<String>,
    ) -> Result<ModelResponse, ProviderError>;
}

#[async_trait::async_trait]
impl<P: ModelProvider + ?Sized> ModelProvider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn max_context_tokens(&self) -> usize {
        (**self).max_context_tokens()
    }

    fn max_output_tokens(&self) -> usize {
        (**self).max_output_tokens()
    }

    fn estimate_token_count(&self, text: &str) -> usize {
        (**self).estimate_token_count(text)
    }

    fn estimate_message_tokens(&self, messages: &[Message]) -> usize {
        (**self).estimate_message_tokens(messages)
    }

    async fn generate(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        system_prompt: Option<String>,
    ) -> Result<ModelResponse, ProviderError> {
        (**self).generate(messages, tools, system_prompt).await
    }
}
