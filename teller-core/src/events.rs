use std::time::{Duration, Instant};

use serde_json::Value;

use crate::tool::ToolResult;
use crate::types::StopReason;

/// Events emitted while an app, supervisor or agent runs
///
/// Every agent-scoped event carries the name of the agent that emitted it so
/// observers can tell supervisor and worker activity apart.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    // ===== Agent Lifecycle =====
    /// Agent invocation started
    RunStarted {
        agent: String,
        /// Text of the latest user message
        input: String,
        timestamp: Instant,
    },

    /// Agent invocation completed
    RunCompleted {
        agent: String,
        /// Final response text
        output: String,
        duration: Duration,
    },

    /// Agent invocation failed with error
    RunFailed {
        agent: String,
        error: String,
        duration: Duration,
    },

    // ===== Model API Lifecycle =====
    /// Model API call started
    ModelCallStarted {
        agent: String,
        /// Messages being sent to model
        message_count: usize,
        /// Number of tools available to model
        tool_count: usize,
        timestamp: Instant,
    },

    /// Model API call completed
    ModelCallCompleted {
        agent: String,
        response_content: String,
        tokens: Option<TokenUsage>,
        duration: Duration,
        stop_reason: Option<StopReason>,
    },

    // ===== Tool Lifecycle =====
    /// Model requested a tool (fires exactly once per tool use)
    ToolRequested {
        agent: String,
        tool_use_id: String,
        name: String,
        input: Value,
    },

    /// Tool execution starting
    ToolExecuting {
        agent: String,
        tool_use_id: String,
        name: String,
    },

    /// Tool execution completed successfully
    ToolCompleted {
        agent: String,
        tool_use_id: String,
        name: String,
        output: ToolResult,
        duration: Duration,
    },

    /// Tool execution failed
    ToolFailed {
        agent: String,
        tool_use_id: String,
        name: String,
        error: String,
        duration: Duration,
    },

    // ===== Supervisor =====
    /// Supervisor handed control to a worker
    Handoff { from: String, to: String },

    /// Worker returned control to the supervisor
    HandoffBack { from: String, to: String },

    // ===== Checkpoints =====
    /// Conversation state loaded before an invocation
    CheckpointLoaded {
        thread_id: String,
        message_count: usize,
    },

    /// Conversation state persisted after an invocation
    CheckpointSaved {
        thread_id: String,
        step: u64,
        message_count: usize,
    },
}

/// Token usage statistics from model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}

/// Hook for observing agent events
///
/// # Example
/// ```
/// use teller_core::events::{AgentEvent, AgentHook};
///
/// struct Printer;
///
/// impl AgentHook for Printer {
///     fn on_event(&self, event: &AgentEvent) {
///         if let AgentEvent::Handoff { from, to } = event {
///             println!("{} -> {}", from, to);
///         }
///     }
/// }
/// ```
pub trait AgentHook: Send + Sync {
    /// Called when an event occurs
    fn on_event(&self, event: &AgentEvent);
}

/// Blanket implementation for closures
impl<F> AgentHook for F
where
    F: Fn(&AgentEvent) + Send + Sync,
{
    fn on_event(&self, event: &AgentEvent) {
        self(event)
    }
}

/// Forwards events to the `log` facade.
///
/// Lifecycle and handoffs log at `debug`, tool failures at `warn`, and
/// checkpoint saves at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHook;

impl AgentHook for LogHook {
    fn on_event(&self, event: &AgentEvent) {
        match event {
            AgentEvent::RunStarted { agent, input, .. } => {
                log::debug!("[{}] run started: {}", agent, truncate(input, 120));
            }
            AgentEvent::RunCompleted {
                agent, duration, ..
            } => {
                log::debug!("[{}] run completed in {:?}", agent, duration);
            }
            AgentEvent::RunFailed {
                agent,
                error,
                duration,
            } => {
                log::warn!("[{}] run failed after {:?}: {}", agent, duration, error);
            }
            AgentEvent::ModelCallStarted {
                agent,
                message_count,
                tool_count,
                ..
            } => {
                log::debug!(
                    "[{}] model call with {} messages, {} tools",
                    agent,
                    message_count,
                    tool_count
                );
            }
            AgentEvent::ModelCallCompleted {
                agent,
                tokens,
                duration,
                stop_reason,
                ..
            } => {
                let total = tokens.map(|t| t.total()).unwrap_or(0);
                log::debug!(
                    "[{}] model call finished in {:?} ({:?}, {} tokens)",
                    agent,
                    duration,
                    stop_reason,
                    total
                );
            }
            AgentEvent::ToolRequested {
                agent, name, input, ..
            } => {
                log::debug!("[{}] tool requested: {} {}", agent, name, input);
            }
            AgentEvent::ToolExecuting { .. } => {}
            AgentEvent::ToolCompleted {
                agent,
                name,
                duration,
                ..
            } => {
                log::debug!("[{}] tool {} completed in {:?}", agent, name, duration);
            }
            AgentEvent::ToolFailed {
                agent, name, error, ..
            } => {
                log::warn!("[{}] tool {} failed: {}", agent, name, error);
            }
            AgentEvent::Handoff { from, to } => {
                log::debug!("handoff {} -> {}", from, to);
            }
            AgentEvent::HandoffBack { from, to } => {
                log::debug!("handoff back {} -> {}", from, to);
            }
            AgentEvent::CheckpointLoaded {
                thread_id,
                message_count,
            } => {
                log::debug!(
                    "loaded thread {} with {} messages",
                    thread_id,
                    message_count
                );
            }
            AgentEvent::CheckpointSaved {
                thread_id,
                step,
                message_count,
            } => {
                log::info!(
                    "saved thread {} at step {} ({} messages)",
                    thread_id,
                    step,
                    message_count
                );
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_total() {
        let cases = [(100, 50, 150), (0, 0, 0), (1, 0, 1), (0, 1, 1)];

        for (input, output, expected) in cases {
            let usage = TokenUsage {
                input_tokens: input,
                output_tokens: output,
            };
            assert_eq!(
                usage.total(),
                expected,
                "Failed for input={}, output={}",
                input,
                output
            );
        }
    }

    #[test]
    fn test_closure_hook() {
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hook = move |event: &AgentEvent| {
            if let AgentEvent::Handoff { to, .. } = event {
                sink.lock().push(to.clone());
            }
        };

        hook.on_event(&AgentEvent::Handoff {
            from: "supervisor".into(),
            to: "loan_agent".into(),
        });
        LogHook.on_event(&AgentEvent::HandoffBack {
            from: "loan_agent".into(),
            to: "supervisor".into(),
        });

        assert_eq!(*seen.lock(), vec!["loan_agent".to_string()]);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
