//! Agent module for orchestrating LLM interactions with tools
//!
//! An [`Agent`] is a worker: a model, a fixed tool list and a prompt. It runs
//! the tool loop over a conversation it is handed and returns the extended
//! conversation. Conversations are owned by the caller (the app's
//! checkpointer), not by the agent.

mod builder;
mod prompt;
mod run;
mod tools;
mod types;

pub use builder::AgentBuilder;
pub use prompt::Prompt;
pub(crate) use run::check_final;
pub use types::{
    AgentError, AgentResponse, AgentRun, TokenUsageStats, ToolCallInfo, ToolInfo,
    DEFAULT_MAX_CONCURRENT_TOOLS,
};

use std::sync::Arc;

use crate::conversation::{BoxedContextPolicy, ContextLimits, ContextUsage};
use crate::events::{AgentEvent, AgentHook};
use crate::provider::ModelProvider;
use crate::tool::DynTool;
use crate::types::Message;

/// Agent that orchestrates interactions between a language model and tools
///
/// ```ignore
/// use teller_core::{Agent, Gemini2Flash, Result};
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let agent = Agent::builder()
///         .name("interest_rate_agent")
///         .model_from_env(Gemini2Flash)
///         .with_system_prompt("You are an interest rate agent.")
///         .add_tool(interest_rate_tool)
///         .build()
///         .await?;
///
///     let response = agent.run("What is the Cash ISA rate?").await?;
///     println!("{}", response);
///     Ok(())
/// }
/// ```
pub struct Agent {
    pub(super) name: String,
    pub(super) provider: Arc<dyn ModelProvider>,
    pub(super) prompt: Prompt,
    pub(super) max_concurrent_tools: usize,
    pub(super) tools: Vec<Box<dyn DynTool>>,
    pub(super) hooks: Arc<parking_lot::RwLock<Vec<Arc<dyn AgentHook>>>>,
    pub(super) context_policy: BoxedContextPolicy,
}

impl Agent {
    /// Routing name of this agent; also stamped on its assistant messages
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the model name for display
    pub fn model_name(&self) -> &str {
        self.provider.name()
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// Add an event hook to observe agent execution
    pub fn add_hook(&self, hook: impl AgentHook + 'static) {
        self.add_shared_hook(Arc::new(hook));
    }

    /// Add a hook that is also registered elsewhere (e.g. on sibling workers)
    pub fn add_shared_hook(&self, hook: Arc<dyn AgentHook>) {
        self.hooks.write().push(hook);
    }

    /// Emit an event to all registered hooks
    pub(crate) fn emit_event(&self, event: AgentEvent) {
        let hooks = self.hooks.read();
        for hook in hooks.iter() {
            hook.on_event(&event);
        }
    }

    /// Context usage if `messages` were sent to the model now
    pub fn context_usage(&self, messages: &[Message]) -> ContextUsage {
        let limits = ContextLimits::new(self.provider.max_context_tokens());
        let provider = &self.provider;
        let estimate_tokens = |msgs: &[Message]| provider.estimate_message_tokens(msgs);

        self.context_policy
            .context_usage(messages, limits, &estimate_tokens)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.provider.name())
            .field("prompt", &self.prompt)
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
