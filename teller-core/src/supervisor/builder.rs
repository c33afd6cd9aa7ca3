//! SupervisorBuilder

use std::collections::HashSet;
use std::sync::Arc;

use crate::agent::{Agent, AgentBuilder};
use crate::error::{Error, Result};
use crate::events::AgentHook;
use crate::model::Model;
use crate::provider::ModelProvider;
use crate::tool::Tool;

use super::handoff::HandoffTool;
use super::{OutputMode, Supervisor, DEFAULT_SUPERVISOR_NAME};

/// Builder for a [`Supervisor`]
///
/// ```ignore
/// let supervisor = Supervisor::builder()
///     .add_workers([interest_rate_agent, pending_tx_agent, customer_details_agent])
///     .model_from_env(O3Mini)
///     .with_system_prompt(SUPERVISOR_PROMPT)
///     .build()
///     .await?;
/// ```
pub struct SupervisorBuilder {
    name: String,
    agent: AgentBuilder,
    workers: Vec<Arc<Agent>>,
    output_mode: OutputMode,
    handoff_back_messages: bool,
}

impl Default for SupervisorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Names become tool names, which providers restrict to `[A-Za-z0-9_-]`
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Config("agent name cannot be empty".to_string()));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::Config(format!(
            "agent name '{}' may only contain letters, digits, '_' and '-'",
            name
        )));
    }
    Ok(())
}

impl SupervisorBuilder {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_SUPERVISOR_NAME.to_string(),
            agent: AgentBuilder::new(),
            workers: Vec::new(),
            output_mode: OutputMode::default(),
            handoff_back_messages: true,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a worker; its name is its routing name
    pub fn add_worker(mut self, worker: Agent) -> Self {
        self.workers.push(Arc::new(worker));
        self
    }

    pub fn add_workers(mut self, workers: impl IntoIterator<Item = Agent>) -> Self {
        self.workers.extend(workers.into_iter().map(Arc::new));
        self
    }

    /// The supervisor's model, with key and base URL from the environment
    pub fn model_from_env(mut self, model: impl Model + 'static) -> Self {
        self.agent = self.agent.model_from_env(model);
        self
    }

    pub fn provider(mut self, provider: impl ModelProvider + 'static) -> Self {
        self.agent = self.agent.provider(provider);
        self
    }

    pub fn shared_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.agent = self.agent.shared_provider(provider);
        self
    }

    /// The routing prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.agent = self.agent.with_system_prompt(prompt);
        self
    }

    /// A tool the supervisor calls itself, besides the handoff tools
    pub fn add_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.agent = self.agent.add_tool(tool);
        self
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Whether to append the transfer-back message pair after each worker
    ///
    /// Default: true
    pub fn with_handoff_back_messages(mut self, enabled: bool) -> Self {
        self.handoff_back_messages = enabled;
        self
    }

    pub fn with_hook(mut self, hook: impl AgentHook + 'static) -> Self {
        self.agent = self.agent.with_hook(hook);
        self
    }

    /// Build the supervisor
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when there are no workers, a name is invalid, two
    /// workers share a name, or no provider is configured.
    pub async fn build(self) -> Result<Supervisor> {
        validate_name(&self.name)?;
        if self.workers.is_empty() {
            return Err(Error::Config(
                "a supervisor needs at least one worker".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for worker in &self.workers {
            validate_name(worker.name())?;
            if !seen.insert(worker.name().to_string()) {
                return Err(Error::Config(format!(
                    "duplicate worker name '{}'",
                    worker.name()
                )));
            }
        }

        let mut agent = self.agent.name(self.name);
        for worker in &self.workers {
            agent = agent.add_tool(HandoffTool::new(worker.name()));
        }

        Ok(Supervisor {
            agent: agent.build().await?,
            workers: self.workers,
            output_mode: self.output_mode,
            handoff_back_messages: self.handoff_back_messages,
        })
    }
}
