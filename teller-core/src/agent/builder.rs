//! AgentBuilder for fluent agent construction
//!
//! The builder collects configuration and defers provider creation to
//! `.build().await`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::conversation::{BoxedContextPolicy, ContextPolicy, SlidingWindow};
use crate::error::{Error, Result};
use crate::events::AgentHook;
use crate::model::Model;
use crate::provider::{ModelProvider, OpenAiCompatProvider};
use crate::store::Namespace;
use crate::tool::{box_tool, DynTool, Tool};

use super::prompt::Prompt;
use super::types::DEFAULT_MAX_CONCURRENT_TOOLS;
use super::Agent;

/// Factory function that creates a provider asynchronously
type ProviderFactory =
    Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = Result<Arc<dyn ModelProvider>>> + Send>> + Send>;

const DEFAULT_AGENT_NAME: &str = "agent";

/// Builder for creating an Agent with fluent configuration
///
/// ```ignore
/// let agent = Agent::builder()
///     .name("email_assistant")
///     .model_from_env(Gpt4oMini)
///     .with_stored_prompt(namespace(["instructions"]), "email_agent")
///     .add_tool(DraftEmail)
///     .build()
///     .await?;
/// ```
pub struct AgentBuilder {
    name: Option<String>,
    provider_factory: Option<ProviderFactory>,
    tools: Vec<Box<dyn DynTool>>,
    prompt: Prompt,
    max_concurrent_tools: usize,
    context_policy: Option<BoxedContextPolicy>,
    hooks: Vec<Arc<dyn AgentHook>>,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            provider_factory: None,
            tools: Vec::new(),
            prompt: Prompt::None,
            max_concurrent_tools: DEFAULT_MAX_CONCURRENT_TOOLS,
            context_policy: None,
            hooks: Vec::new(),
        }
    }

    /// Routing name; must be unique among a supervisor's workers
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Use an OpenAI-compatible provider for `model`, reading the vendor's
    /// API key and base URL from the environment at build time
    ///
    /// A missing key does not fail the build; the first model call does.
    pub fn model_from_env(mut self, model: impl Model + 'static) -> Self {
        self.provider_factory = Some(Box::new(move || {
            Box::pin(async move {
                let provider = OpenAiCompatProvider::from_env(model)?;
                Ok(Arc::new(provider) as Arc<dyn ModelProvider>)
            })
        }));
        self
    }

    /// Use a pre-configured provider
    ///
    /// Use this for custom provider configuration (temperature, retry
    /// settings, base URL) or a custom provider implementation.
    pub fn provider(self, provider: impl ModelProvider + 'static) -> Self {
        let provider = Arc::new(provider) as Arc<dyn ModelProvider>;
        self.shared_provider(provider)
    }

    /// Use a provider shared with other agents
    pub fn shared_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.provider_factory = Some(Box::new(move || Box::pin(async move { Ok(provider) })));
        self
    }

    /// Add a tool to the agent
    pub fn add_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(box_tool(tool));
        self
    }

    /// Add multiple tools to the agent
    ///
    /// Accepts pre-boxed dynamic tools, typically from `box_tools!` or tool
    /// group helper functions.
    pub fn add_tools(mut self, tools: impl IntoIterator<Item = Box<dyn DynTool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Set a fixed system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Prompt::Static(prompt.into());
        self
    }

    /// Read the system prompt from instruction record `key` on every invocation
    pub fn with_stored_prompt(mut self, namespace: Namespace, key: impl Into<String>) -> Self {
        self.prompt = Prompt::stored(namespace, key);
        self
    }

    pub fn with_prompt(mut self, prompt: Prompt) -> Self {
        self.prompt = prompt;
        self
    }

    /// Set the maximum number of tools that can execute concurrently
    pub fn with_max_concurrent_tools(mut self, max: usize) -> Self {
        self.max_concurrent_tools = max.max(1);
        self
    }

    /// Choose which part of the conversation is sent on each model call
    ///
    /// Default: [`SlidingWindow`]
    pub fn with_context_policy(mut self, policy: impl ContextPolicy + 'static) -> Self {
        self.context_policy = Some(Box::new(policy));
        self
    }

    pub fn with_hook(mut self, hook: impl AgentHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Build the agent
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no provider was configured, or the
    /// provider factory's error.
    pub async fn build(self) -> Result<Agent> {
        let factory = self.provider_factory.ok_or_else(|| {
            Error::Config(
                "No provider configured. Call .model_from_env() or .provider() before .build()"
                    .to_string(),
            )
        })?;
        let provider = factory().await?;

        let name = self.name.unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string());

        let mut seen = std::collections::HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name().to_string()) {
                log::warn!(
                    "agent '{}': tool '{}' is registered more than once",
                    name,
                    tool.name()
                );
            }
        }

        Ok(Agent {
            name,
            provider,
            prompt: self.prompt,
            max_concurrent_tools: self.max_concurrent_tools,
            tools: self.tools,
            hooks: Arc::new(parking_lot::RwLock::new(self.hooks)),
            context_policy: self
                .context_policy
                .unwrap_or_else(|| Box::new(SlidingWindow::new())),
        })
    }
}

impl Agent {
    /// Create a new AgentBuilder
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }
}
