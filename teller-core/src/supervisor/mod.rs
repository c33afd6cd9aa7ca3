//! Supervisor: an agent that routes a conversation between worker agents
//!
//! Each worker is exposed to the supervisor's model as a handoff tool
//! (`transfer_to_<name>`). Routing is entirely the model's choice, guided by
//! the supervisor prompt. When the model calls a handoff tool the worker runs
//! on the full conversation, its output is appended and control returns to
//! the supervisor, which decides what to do next.

mod builder;
mod handoff;

pub use builder::SupervisorBuilder;
pub use handoff::{
    handoff_back_messages, handoff_tool_name, HandoffTool, HANDOFF_BACK_TOOL, HANDOFF_PREFIX,
};

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::agent::{check_final, Agent, AgentError, AgentRun, TokenUsageStats, ToolCallInfo};
use crate::context::RunContext;
use crate::events::{AgentEvent, AgentHook};
use crate::tool::ToolResult;
use crate::types::{Message, StopReason};

/// Default routing name of a supervisor
pub const DEFAULT_SUPERVISOR_NAME: &str = "supervisor";

/// What a worker contributes to the conversation after a handoff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Only the worker's final message
    #[default]
    LastMessage,
    /// Every message the worker produced, including its tool calls
    FullHistory,
}

/// Routes between worker agents through model-chosen handoffs
pub struct Supervisor {
    agent: Agent,
    workers: Vec<Arc<Agent>>,
    output_mode: OutputMode,
    handoff_back_messages: bool,
}

impl Supervisor {
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    pub fn name(&self) -> &str {
        self.agent.name()
    }

    /// The supervisor's own agent (model, prompt, handoff tools)
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn workers(&self) -> &[Arc<Agent>] {
        &self.workers
    }

    pub fn worker(&self, name: &str) -> Option<&Arc<Agent>> {
        self.workers.iter().find(|w| w.name() == name)
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Register a hook on the supervisor and every worker
    pub fn add_hook(&self, hook: impl AgentHook + 'static) {
        self.add_shared_hook(Arc::new(hook));
    }

    pub fn add_shared_hook(&self, hook: Arc<dyn AgentHook>) {
        self.agent.add_shared_hook(hook.clone());
        for worker in &self.workers {
            worker.add_shared_hook(hook.clone());
        }
    }

    fn worker_for_tool(&self, tool_name: &str) -> Option<&Arc<Agent>> {
        let name = tool_name.strip_prefix(HANDOFF_PREFIX)?;
        self.worker(name)
    }

    /// Format a tool call made by the supervisor or any worker
    pub fn format_tool_input(&self, tool_name: &str, params: &Value) -> Option<String> {
        self.agent
            .format_tool_input(tool_name, params)
            .or_else(|| {
                self.workers
                    .iter()
                    .find_map(|w| w.format_tool_input(tool_name, params))
            })
    }

    pub fn format_tool_output(&self, tool_name: &str, result: &ToolResult) -> Option<String> {
        self.agent
            .format_tool_output(tool_name, result)
            .or_else(|| {
                self.workers
                    .iter()
                    .find_map(|w| w.format_tool_output(tool_name, result))
            })
    }

    /// Run the supervisor over `messages`
    ///
    /// Workers share `ctx`, so their model calls count against the same
    /// recursion limit as the supervisor's.
    pub async fn invoke(
        &self,
        messages: &[Message],
        ctx: &RunContext,
    ) -> Result<AgentRun, AgentError> {
        let run_start = Instant::now();
        self.agent.emit_event(AgentEvent::RunStarted {
            agent: self.name().to_string(),
            input: messages
                .iter()
                .rev()
                .find(|m| !m.is_tool_result())
                .map(Message::text)
                .unwrap_or_default(),
            timestamp: run_start,
        });

        match self.run_loop(messages, ctx, run_start).await {
            Ok(run) => {
                self.agent.emit_event(AgentEvent::RunCompleted {
                    agent: self.name().to_string(),
                    output: run.text(),
                    duration: run.duration,
                });
                Ok(run)
            }
            Err(e) => {
                self.agent.emit_event(AgentEvent::RunFailed {
                    agent: self.name().to_string(),
                    error: e.to_string(),
                    duration: run_start.elapsed(),
                });
                Err(e)
            }
        }
    }

    async fn run_loop(
        &self,
        messages: &[Message],
        ctx: &RunContext,
        run_start: Instant,
    ) -> Result<AgentRun, AgentError> {
        let system_prompt = self.agent.prompt().resolve(ctx.store()).await?;
        let tool_defs = self.agent.tool_definitions();

        let mut conversation = messages.to_vec();
        let new_start = conversation.len();
        let mut tool_calls: Vec<ToolCallInfo> = Vec::new();
        let mut token_usage: Option<TokenUsageStats> = None;
        let mut model_calls = 0;

        loop {
            ctx.step()?;
            let response = self
                .agent
                .call_model(&conversation, tool_defs.clone(), system_prompt.clone())
                .await?;

            model_calls += 1;
            token_usage = TokenUsageStats::merge(
                token_usage,
                response.usage.map(|u| TokenUsageStats {
                    input_tokens: u.input_tokens,
                    output_tokens: u.output_tokens,
                }),
            );

            let message = response.message.with_name(self.name());
            conversation.push(message.clone());

            if response.stop_reason != StopReason::ToolUse || message.tool_uses().is_empty() {
                check_final(response.stop_reason, &message)?;
                return Ok(AgentRun {
                    messages: conversation,
                    new_start,
                    tool_calls,
                    token_usage,
                    duration: run_start.elapsed(),
                    model_calls,
                });
            }

            // Every call of the turn gets its result before any worker runs
            let results = self
                .agent
                .process_tool_calls(&message, ctx, &mut tool_calls)
                .await;
            conversation.push(Message::tool_results(results));

            for tool_use in message.tool_uses() {
                let Some(worker) = self.worker_for_tool(&tool_use.name) else {
                    continue;
                };

                log::debug!("{} handing off to {}", self.name(), worker.name());
                self.agent.emit_event(AgentEvent::Handoff {
                    from: self.name().to_string(),
                    to: worker.name().to_string(),
                });

                let run = worker.invoke(&conversation, ctx).await?;
                model_calls += run.model_calls;
                token_usage = TokenUsageStats::merge(token_usage, run.token_usage);
                tool_calls.extend(run.tool_calls.iter().cloned());

                match self.output_mode {
                    OutputMode::LastMessage => conversation.extend(run.new_messages().last().cloned()),
                    OutputMode::FullHistory => conversation.extend_from_slice(run.new_messages()),
                }

                if self.handoff_back_messages {
                    conversation.extend(handoff_back_messages(worker.name(), self.name()));
                }
                self.agent.emit_event(AgentEvent::HandoffBack {
                    from: worker.name().to_string(),
                    to: self.name().to_string(),
                });
            }
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("agent", &self.agent)
            .field(
                "workers",
                &self.workers.iter().map(|w| w.name()).collect::<Vec<_>>(),
            )
            .field("output_mode", &self.output_mode)
            .finish()
    }
}
