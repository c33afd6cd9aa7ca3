//! Context selection for model calls
//!
//! The conversation itself is owned by the checkpointer and passed into each
//! agent invocation; a [`ContextPolicy`] only decides which suffix of it is
//! sent to the model.
//!
//! - [`SlidingWindow`] - Default. Token-aware, keeps the most recent
//!   messages that fit within the context window.
//! - [`LastN`] - Keeps the last N messages.
//! - [`NoOp`] - Pass-through, no truncation.

use crate::types::{Message, Role};

/// Context limits for message selection
#[derive(Debug, Clone, Copy)]
pub struct ContextLimits {
    /// Maximum tokens available for context
    pub max_context_tokens: usize,
}

impl ContextLimits {
    pub fn new(max_context_tokens: usize) -> Self {
        Self { max_context_tokens }
    }
}

/// Information about context usage
#[derive(Debug, Clone)]
pub struct ContextUsage {
    /// Estimated token count for messages that will be sent
    pub context_tokens: usize,
    /// Total messages in the conversation
    pub total_messages: usize,
    /// Messages that will be sent to the model
    pub context_messages: usize,
    /// Maximum context tokens for the model
    pub max_context_tokens: usize,
    /// Fraction of context used (0.0 - 1.0)
    pub usage_percentage: f32,
}

/// Token estimator function type
pub type TokenEstimator<'a> = &'a dyn Fn(&[Message]) -> usize;

/// Strategy for choosing the messages sent on each model call
pub trait ContextPolicy: Send + Sync {
    /// Select the messages to send, in chronological order
    fn select(
        &self,
        messages: &[Message],
        limits: ContextLimits,
        estimate_tokens: TokenEstimator<'_>,
    ) -> Vec<Message>;

    /// Context usage statistics for `messages`
    fn context_usage(
        &self,
        messages: &[Message],
        limits: ContextLimits,
        estimate_tokens: TokenEstimator<'_>,
    ) -> ContextUsage {
        let selected = self.select(messages, limits, estimate_tokens);
        let context_tokens = estimate_tokens(&selected);
        let max_context_tokens = limits.max_context_tokens;

        ContextUsage {
            context_tokens,
            total_messages: messages.len(),
            context_messages: selected.len(),
            max_context_tokens,
            usage_percentage: if max_context_tokens > 0 {
                context_tokens as f32 / max_context_tokens as f32
            } else {
                0.0
            },
        }
    }
}

pub type BoxedContextPolicy = Box<dyn ContextPolicy>;

/// Sliding window policy (default)
///
/// Keeps as many recent messages as fit in the window after reserving room
/// for the system prompt and the response. Never fails on overflow.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    /// Fraction of context to reserve for system prompt (0.0 - 0.5)
    system_prompt_reserve: f32,
    /// Fraction of context to reserve for model response (0.0 - 0.5)
    response_reserve: f32,
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl SlidingWindow {
    /// 10% reserved for the system prompt, 20% for the response
    pub fn new() -> Self {
        Self {
            system_prompt_reserve: 0.10,
            response_reserve: 0.20,
        }
    }

    pub fn with_reserve(system_prompt_reserve: f32, response_reserve: f32) -> Self {
        Self {
            system_prompt_reserve: system_prompt_reserve.clamp(0.0, 0.5),
            response_reserve: response_reserve.clamp(0.0, 0.5),
        }
    }

    fn available_tokens(&self, limits: ContextLimits) -> usize {
        let max = limits.max_context_tokens;
        let reserved = (max as f32 * (self.system_prompt_reserve + self.response_reserve)) as usize;
        max.saturating_sub(reserved)
    }
}

impl ContextPolicy for SlidingWindow {
    fn select(
        &self,
        messages: &[Message],
        limits: ContextLimits,
        estimate_tokens: TokenEstimator<'_>,
    ) -> Vec<Message> {
        let available = self.available_tokens(limits);

        let mut total_tokens = 0;
        let mut start = messages.len();
        for (idx, message) in messages.iter().enumerate().rev() {
            let msg_tokens = estimate_tokens(std::slice::from_ref(message));
            if total_tokens + msg_tokens > available {
                break;
            }
            total_tokens += msg_tokens;
            start = idx;
        }

        drop_orphaned_tool_results(&messages[start..])
    }
}

/// Keeps the last `n` messages
#[derive(Debug, Clone, Copy)]
pub struct LastN(pub usize);

impl ContextPolicy for LastN {
    fn select(
        &self,
        messages: &[Message],
        _limits: ContextLimits,
        _estimate_tokens: TokenEstimator<'_>,
    ) -> Vec<Message> {
        let start = messages.len().saturating_sub(self.0);
        drop_orphaned_tool_results(&messages[start..])
    }
}

/// Sends the whole conversation
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOp;

impl ContextPolicy for NoOp {
    fn select(
        &self,
        messages: &[Message],
        _limits: ContextLimits,
        _estimate_tokens: TokenEstimator<'_>,
    ) -> Vec<Message> {
        messages.to_vec()
    }
}

/// Drop leading messages until the window starts on a message that does not
/// answer a tool call cut off by truncation.
fn drop_orphaned_tool_results(window: &[Message]) -> Vec<Message> {
    let start = window
        .iter()
        .position(|m| !(m.role == Role::User && m.is_tool_result()))
        .unwrap_or(window.len());
    window[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ToolResultBlock, ToolUseBlock};

    fn estimate(messages: &[Message]) -> usize {
        messages.iter().map(|m| m.text().len()).sum()
    }

    fn conversation(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("u{:03}", i))
                } else {
                    Message::assistant(format!("a{:03}", i))
                }
            })
            .collect()
    }

    #[test]
    fn test_sliding_window_keeps_recent_messages() {
        let messages = conversation(10);
        let selected = SlidingWindow::new().select(&messages, ContextLimits::new(20), &estimate);

        // 20 * 0.7 = 14 tokens -> 3 messages
        assert_eq!(selected.len(), 3);
        assert_eq!(selected.last().unwrap().text(), "a009");
        assert_eq!(selected[0].text(), "a007");
    }

    #[test]
    fn test_sliding_window_everything_fits() {
        let messages = conversation(4);
        let selected = SlidingWindow::new().select(&messages, ContextLimits::new(1000), &estimate);
        assert_eq!(selected, messages);
    }

    #[test]
    fn test_with_reserve_clamps() {
        let policy = SlidingWindow::with_reserve(0.9, 0.9);
        assert_eq!(policy.available_tokens(ContextLimits::new(100)), 0);
    }

    #[test]
    fn test_window_never_starts_on_tool_result() {
        let messages = vec![
            Message::user("question"),
            Message::assistant_with_tool_use(
                "",
                vec![ToolUseBlock {
                    id: "1".into(),
                    name: "lookup".into(),
                    input: serde_json::json!({}),
                }],
            ),
            Message::tool_results(vec![ToolResultBlock::success("1", "r")]),
            Message::assistant("answer"),
        ];

        let selected = LastN(2).select(&messages, ContextLimits::new(0), &estimate);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].text(), "answer");
    }

    #[test]
    fn test_last_n_and_noop() {
        let messages = conversation(6);
        assert_eq!(
            LastN(10).select(&messages, ContextLimits::new(0), &estimate).len(),
            6
        );
        assert_eq!(
            NoOp.select(&messages, ContextLimits::new(0), &estimate).len(),
            6
        );
    }

    #[test]
    fn test_context_usage() {
        let messages = conversation(10);
        let usage = LastN(5).context_usage(&messages, ContextLimits::new(40), &estimate);
        assert_eq!(usage.total_messages, 10);
        assert_eq!(usage.context_messages, 5);
        assert_eq!(usage.context_tokens, 20);
        assert!((usage.usage_percentage - 0.5).abs() < f32::EPSILON);
    }
}
