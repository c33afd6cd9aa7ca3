//! Model traits and types
//!
//! - `Model` trait for model metadata (name, API id, vendor, token limits)
//! - `Vendor` for the API family serving a model
//! - `ModelSpec` for models chosen at runtime from a `"vendor:model"` string
//!
//! Models are plain values; all API interaction goes through a provider.

use std::fmt;
use std::str::FromStr;

use crate::events::TokenUsage;
use crate::provider::ProviderError;
use crate::types::{ContentBlock, Message, StopReason};

/// Response from a model completion
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// The assistant's response message
    pub message: Message,
    /// Why the model stopped generating
    pub stop_reason: StopReason,
    /// Token usage statistics (if provided by the model)
    pub usage: Option<TokenUsage>,
}

/// API family that serves a model.
///
/// Both vendors are reached through the OpenAI chat-completions wire format;
/// Google exposes Gemini through an OpenAI-compatible endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    OpenAi,
    Google,
}

impl Vendor {
    /// Base URL of the chat-completions compatible API
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Vendor::OpenAi => "https://api.openai.com/v1",
            Vendor::Google => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Vendor::OpenAi => "OPENAI_API_KEY",
            Vendor::Google => "GOOGLE_API_KEY",
        }
    }

    /// Environment variable overriding the base URL
    pub fn base_url_env(&self) -> &'static str {
        match self {
            Vendor::OpenAi => "OPENAI_BASE_URL",
            Vendor::Google => "GOOGLE_BASE_URL",
        }
    }

    /// Infer the vendor from a bare model id (`gpt-4o`, `o3-mini`, `gemini-...`).
    pub fn infer(model_id: &str) -> Option<Self> {
        let id = model_id.to_ascii_lowercase();
        if id.starts_with("gemini") {
            Some(Vendor::Google)
        } else if id.starts_with("gpt-")
            || id.starts_with("o1")
            || id.starts_with("o3")
            || id.starts_with("o4")
            || id.starts_with("chatgpt")
        {
            Some(Vendor::OpenAi)
        } else {
            None
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::OpenAi => write!(f, "openai"),
            Vendor::Google => write!(f, "google_genai"),
        }
    }
}

impl FromStr for Vendor {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Vendor::OpenAi),
            "google" | "google_genai" | "gemini" => Ok(Vendor::Google),
            other => Err(ProviderError::Configuration(format!(
                "unsupported model provider '{}'",
                other
            ))),
        }
    }
}

/// Core model metadata trait
pub trait Model: Send + Sync {
    /// Human-readable model name (e.g., "GPT-4o mini")
    fn name(&self) -> &str;

    /// Identifier sent to the API (e.g., "gpt-4o-mini")
    fn api_id(&self) -> &str;

    /// API family serving this model
    fn vendor(&self) -> Vendor;

    /// Maximum input context tokens
    fn max_context_tokens(&self) -> usize;

    /// Maximum output tokens the model can generate
    fn max_output_tokens(&self) -> usize;

    /// Estimate token count for text (~4 characters per token)
    fn estimate_token_count(&self, text: &str) -> usize {
        text.len().div_ceil(4)
    }

    /// Estimate tokens for a conversation
    fn estimate_message_tokens(&self, messages: &[Message]) -> usize {
        let mut total = 0;
        for message in messages {
            // Role overhead
            total += 4;
            for block in &message.content {
                total += self.estimate_content_block_tokens(block);
            }
        }
        total
    }

    /// Estimate tokens for a single content block
    fn estimate_content_block_tokens(&self, block: &ContentBlock) -> usize {
        match block {
            ContentBlock::Text(text) => self.estimate_token_count(text),
            ContentBlock::ToolUse(tool_use) => {
                self.estimate_token_count(&tool_use.name)
                    + self.estimate_token_count(&tool_use.id)
                    + self.estimate_token_count(&tool_use.input.to_string())
                    + 10
            }
            ContentBlock::ToolResult(result) => {
                self.estimate_token_count(&result.tool_use_id)
                    + self.estimate_token_count(&result.content.as_text())
                    + 10
            }
        }
    }
}

/// Limits used for models that are not one of the presets
const DEFAULT_CONTEXT_TOKENS: usize = 128_000;
const DEFAULT_OUTPUT_TOKENS: usize = 16_384;

/// A model selected at runtime by string.
///
/// Accepts `"<vendor>:<model>"` (`"openai:gpt-4o-mini"`,
/// `"google_genai:gemini-2.0-flash-001"`) or a bare model id whose vendor can
/// be inferred (`"o3-mini"`). Known ids pick up the preset's token limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    vendor: Vendor,
    id: String,
    context_tokens: usize,
    output_tokens: usize,
}

impl ModelSpec {
    pub fn new(vendor: Vendor, id: impl Into<String>) -> Self {
        let id = id.into();
        let (context_tokens, output_tokens) = crate::models::known_limits(&id)
            .unwrap_or((DEFAULT_CONTEXT_TOKENS, DEFAULT_OUTPUT_TOKENS));
        Self {
            vendor,
            id,
            context_tokens,
            output_tokens,
        }
    }

    pub fn parse(spec: &str) -> Result<Self, ProviderError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(ProviderError::Configuration(
                "model spec is empty".to_string(),
            ));
        }

        match spec.split_once(':') {
            Some((vendor, id)) => {
                let id = id.trim();
                if id.is_empty() {
                    return Err(ProviderError::Configuration(format!(
                        "model spec '{}' has no model id",
                        spec
                    )));
                }
                Ok(Self::new(vendor.trim().parse()?, id))
            }
            None => match Vendor::infer(spec) {
                Some(vendor) => Ok(Self::new(vendor, spec)),
                None => Err(ProviderError::Configuration(format!(
                    "cannot infer provider for model '{}'; use '<provider>:<model>'",
                    spec
                ))),
            },
        }
    }
}

impl FromStr for ModelSpec {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vendor, self.id)
    }
}

impl Model for ModelSpec {
    fn name(&self) -> &str {
        &self.id
    }

    fn api_id(&self) -> &str {
        &self.id
    }

    fn vendor(&self) -> Vendor {
        self.vendor
    }

    fn max_context_tokens(&self) -> usize {
        self.context_tokens
    }

    fn max_output_tokens(&self) -> usize {
        self.output_tokens
    }
}
