//! The agentic loop - core execution logic for Agent

use std::time::Instant;

use crate::context::RunContext;
use crate::conversation::ContextLimits;
use crate::events::AgentEvent;
use crate::model::ModelResponse;
use crate::types::{ContentBlock, Message, Role, StopReason, ToolDefinition};

use super::types::{AgentError, AgentResponse, AgentRun, TokenUsageStats, ToolCallInfo};
use super::Agent;

/// Extract the first text content from a message
fn extract_text_response(message: &Message) -> Option<String> {
    message.content.iter().find_map(|c| match c {
        ContentBlock::Text(t) if !t.is_empty() => Some(t.clone()),
        _ => None,
    })
}

/// Decide whether a turn without tool calls ends the run successfully
pub(crate) fn check_final(stop_reason: StopReason, message: &Message) -> Result<(), AgentError> {
    match stop_reason {
        StopReason::ToolUse | StopReason::EndTurn | StopReason::StopSequence => {
            if message.content.is_empty() {
                Err(AgentError::EmptyResponse)
            } else {
                Ok(())
            }
        }
        StopReason::MaxTokens => Err(AgentError::MaxTokensExceeded),
        StopReason::ContentFiltered => Err(AgentError::ContentFiltered),
        StopReason::Unknown => Err(AgentError::UnexpectedStopReason("Unknown".to_string())),
    }
}

/// Text of the latest user message, for the RunStarted event
fn latest_user_input(messages: &[Message]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User && !m.is_tool_result())
        .map(Message::text)
        .unwrap_or_default()
}

impl Agent {
    /// Run the agent on a single user message with a fresh context
    ///
    /// Convenience for agents used as standalone collaborators. Returns the
    /// text of the final assistant message.
    pub async fn run(&self, user_message: &str) -> Result<AgentResponse, AgentError> {
        let run = self
            .invoke(&[Message::user(user_message)], &RunContext::new())
            .await?;

        let text = run
            .last_message()
            .and_then(extract_text_response)
            .ok_or(AgentError::NoResponse)?;

        Ok(AgentResponse {
            text,
            tool_calls: run.tool_calls,
            token_usage: run.token_usage,
            duration: run.duration,
            model_calls: run.model_calls,
        })
    }

    /// Run the tool loop over `messages`
    ///
    /// Calls the model, executes any tools it requests, feeds the results
    /// back and repeats until the model answers without tool calls. The
    /// returned conversation is `messages` followed by every message this
    /// run produced; assistant messages carry this agent's name.
    ///
    /// # Errors
    ///
    /// - `Provider` - API errors (authentication, rate limits, network issues)
    /// - `Store` / `Config` - the instruction record could not be read
    /// - `RecursionLimit` - the shared step budget in `ctx` ran out
    /// - `EmptyResponse`, `MaxTokensExceeded`, `ContentFiltered`,
    ///   `UnexpectedStopReason` - the model stopped badly
    pub async fn invoke(
        &self,
        messages: &[Message],
        ctx: &RunContext,
    ) -> Result<AgentRun, AgentError> {
        let run_start = Instant::now();
        self.emit_event(AgentEvent::RunStarted {
            agent: self.name.clone(),
            input: latest_user_input(messages),
            timestamp: run_start,
        });

        match self.run_loop(messages, ctx, run_start).await {
            Ok(run) => {
                self.emit_event(AgentEvent::RunCompleted {
                    agent: self.name.clone(),
                    output: run.text(),
                    duration: run.duration,
                });
                Ok(run)
            }
            Err(e) => {
                self.emit_event(AgentEvent::RunFailed {
                    agent: self.name.clone(),
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
        // Read on every invocation so stored instructions take effect immediately
        let system_prompt = self.prompt.resolve(ctx.store()).await?;
        let tool_defs = self.tool_definitions();

        let mut conversation = messages.to_vec();
        let new_start = conversation.len();
        let mut tool_call_infos: Vec<ToolCallInfo> = Vec::new();
        let mut token_usage: Option<TokenUsageStats> = None;
        let mut model_calls = 0;

        loop {
            ctx.step()?;
            let response = self
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

            let message = response.message.with_name(self.name.clone());
            conversation.push(message.clone());

            if response.stop_reason == StopReason::ToolUse && !message.tool_uses().is_empty() {
                let results = self
                    .process_tool_calls(&message, ctx, &mut tool_call_infos)
                    .await;
                conversation.push(Message::tool_results(results));
                continue;
            }

            check_final(response.stop_reason, &message)?;
            return Ok(AgentRun {
                messages: conversation,
                new_start,
                tool_calls: tool_call_infos,
                token_usage,
                duration: run_start.elapsed(),
                model_calls,
            });
        }
    }

    /// One model call over the context window of `conversation`
    pub(crate) async fn call_model(
        &self,
        conversation: &[Message],
        tool_defs: Vec<ToolDefinition>,
        system_prompt: Option<String>,
    ) -> Result<ModelResponse, AgentError> {
        let limits = ContextLimits::new(self.provider.max_context_tokens());
        let provider = &self.provider;
        let estimate_tokens = |msgs: &[Message]| provider.estimate_message_tokens(msgs);
        let context_messages = self
            .context_policy
            .select(conversation, limits, &estimate_tokens);

        let model_call_start = Instant::now();
        self.emit_event(AgentEvent::ModelCallStarted {
            agent: self.name.clone(),
            message_count: context_messages.len(),
            tool_count: tool_defs.len(),
            timestamp: model_call_start,
        });
        log::debug!(
            "agent '{}' calling {} with {} messages",
            self.name,
            self.provider.name(),
            context_messages.len()
        );

        let response = self
            .provider
            .generate(context_messages, tool_defs, system_prompt)
            .await?;

        self.emit_event(AgentEvent::ModelCallCompleted {
            agent: self.name.clone(),
            response_content: response.message.text(),
            tokens: response.usage,
            duration: model_call_start.elapsed(),
            stop_reason: Some(response.stop_reason),
        });

        Ok(response)
    }
}
