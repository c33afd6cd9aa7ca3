//! Prompt optimization from conversation trajectories
//!
//! [`MultiPromptOptimizer`] looks at finished conversations (with optional
//! feedback) and the prompts that steered them, asks the model which prompts
//! need to change, then rewrites each selected prompt. Prompts are returned in
//! input order; unselected prompts come back unchanged.

use std::sync::Arc;

use futures::future::try_join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::presentation::format_message;
use crate::provider::{ModelProvider, ProviderError};
use crate::types::{Message, ToolDefinition};

const SELECT_TOOL: &str = "select_prompts_to_update";
const UPDATE_TOOL: &str = "update_prompt";

const SELECT_SYSTEM_PROMPT: &str = "You review conversations handled by a team of agents. \
Each agent is steered by a named prompt. Decide which prompts should change, based on the \
conversations and any feedback. Only select a prompt when its update condition is met. \
Call the select_prompts_to_update tool with your decision; select nothing if no prompt needs \
to change.";

const UPDATE_SYSTEM_PROMPT: &str = "You are a prompt engineer. Improve the given prompt so that \
the agent it steers does better on conversations like the ones shown, taking any feedback \
into account. Keep what already works and make targeted changes. Call the update_prompt tool \
with your analysis and the full updated prompt.";

/// Errors from prompt optimization
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    /// The model call failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The model called a tool with arguments that do not match its schema
    #[error("malformed optimizer response: {0}")]
    MalformedResponse(String),

    /// Two prompts share a name
    #[error("duplicate prompt name: {0}")]
    DuplicatePrompt(String),
}

/// A prompt that may be updated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSpec {
    pub name: String,
    pub prompt: String,
    /// When the prompt should be updated, in natural language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_to_update: Option<String>,
    /// Guidance for how to update it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_instructions: Option<String>,
}

impl PromptSpec {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            when_to_update: None,
            update_instructions: None,
        }
    }

    pub fn when_to_update(mut self, condition: impl Into<String>) -> Self {
        self.when_to_update = Some(condition.into());
        self
    }

    pub fn update_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.update_instructions = Some(instructions.into());
        self
    }
}

/// A finished conversation and optional feedback on it
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub messages: Vec<Message>,
    pub feedback: Option<Value>,
}

impl Trajectory {
    pub fn new(messages: Vec<Message>, feedback: Option<Value>) -> Self {
        Self { messages, feedback }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SelectPrompts {
    /// Why these prompts need to change
    #[allow(dead_code)]
    #[serde(default)]
    reasoning: String,
    /// Names of the prompts to update
    which: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UpdatePrompt {
    /// What went wrong and what to change
    #[allow(dead_code)]
    #[serde(default)]
    analysis: String,
    /// The complete new prompt
    updated_prompt: String,
}

fn tool_definition<T: JsonSchema>(name: &str, description: &str) -> ToolDefinition {
    let schema = schemars::schema_for!(T);
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: serde_json::to_value(&schema)
            .unwrap_or_else(|_| serde_json::json!({"type": "object"})),
    }
}

fn format_trajectories(trajectories: &[Trajectory]) -> String {
    trajectories
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let transcript = t
                .messages
                .iter()
                .map(format_message)
                .collect::<Vec<_>>()
                .join("\n\n");
            let feedback = t
                .feedback
                .as_ref()
                .map(|f| format!("\n\n<feedback>\n{}\n</feedback>", f))
                .unwrap_or_default();
            format!(
                "<trajectory index=\"{}\">\n{}{}\n</trajectory>",
                i, transcript, feedback
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn describe_prompt(prompt: &PromptSpec) -> String {
    let mut out = format!("<prompt name=\"{}\">\n{}\n</prompt>", prompt.name, prompt.prompt);
    if let Some(when) = &prompt.when_to_update {
        out.push_str(&format!("\nUpdate when: {}", when));
    }
    if let Some(how) = &prompt.update_instructions {
        out.push_str(&format!("\nUpdate instructions: {}", how));
    }
    out
}

/// Selects and rewrites prompts with a model
pub struct MultiPromptOptimizer {
    provider: Arc<dyn ModelProvider>,
}

impl MultiPromptOptimizer {
    pub fn new(provider: impl ModelProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    pub fn from_shared(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    /// Return `prompts` with the ones that need it rewritten
    pub async fn optimize(
        &self,
        trajectories: &[Trajectory],
        prompts: &[PromptSpec],
    ) -> Result<Vec<PromptSpec>, OptimizerError> {
        let mut names = std::collections::HashSet::new();
        for prompt in prompts {
            if !names.insert(prompt.name.as_str()) {
                return Err(OptimizerError::DuplicatePrompt(prompt.name.clone()));
            }
        }

        let selected: Vec<String> = match prompts {
            [] => return Ok(Vec::new()),
            [only] => vec![only.name.clone()],
            _ => self.select_prompts(trajectories, prompts).await?,
        };
        log::debug!("optimizer selected prompts {:?}", selected);

        let updates = try_join_all(prompts.iter().map(|prompt| {
            let selected = selected.contains(&prompt.name);
            async move {
                if !selected {
                    return Ok(prompt.clone());
                }
                let updated = self.update_prompt(trajectories, prompt).await?;
                Ok::<_, OptimizerError>(PromptSpec {
                    prompt: updated,
                    ..prompt.clone()
                })
            }
        }))
        .await?;

        Ok(updates)
    }

    /// Names of the prompts the model wants to update, in input order
    async fn select_prompts(
        &self,
        trajectories: &[Trajectory],
        prompts: &[PromptSpec],
    ) -> Result<Vec<String>, OptimizerError> {
        let request = format!(
            "{}\n\n<prompts>\n{}\n</prompts>",
            format_trajectories(trajectories),
            prompts
                .iter()
                .map(describe_prompt)
                .collect::<Vec<_>>()
                .join("\n\n")
        );
        let tool = tool_definition::<SelectPrompts>(
            SELECT_TOOL,
            "Choose which prompts should be updated",
        );

        let response = self
            .provider
            .generate(
                vec![Message::user(request)],
                vec![tool],
                Some(SELECT_SYSTEM_PROMPT.to_string()),
            )
            .await?;

        let Some(call) = response
            .message
            .tool_uses()
            .into_iter()
            .find(|u| u.name == SELECT_TOOL)
        else {
            return Ok(Vec::new());
        };

        let selection: SelectPrompts = serde_json::from_value(call.input.clone())
            .map_err(|e| OptimizerError::MalformedResponse(e.to_string()))?;

        Ok(prompts
            .iter()
            .filter(|p| selection.which.contains(&p.name))
            .map(|p| p.name.clone())
            .collect())
    }

    async fn update_prompt(
        &self,
        trajectories: &[Trajectory],
        prompt: &PromptSpec,
    ) -> Result<String, OptimizerError> {
        let request = format!(
            "{}\n\nThe prompt to improve:\n{}",
            format_trajectories(trajectories),
            describe_prompt(prompt)
        );
        let tool = tool_definition::<UpdatePrompt>(UPDATE_TOOL, "Submit the improved prompt");

        let response = self
            .provider
            .generate(
                vec![Message::user(request)],
                vec![tool],
                Some(UPDATE_SYSTEM_PROMPT.to_string()),
            )
            .await?;

        let Some(call) = response
            .message
            .tool_uses()
            .into_iter()
            .find(|u| u.name == UPDATE_TOOL)
        else {
            log::warn!(
                "optimizer did not submit an update for '{}', keeping it",
                prompt.name
            );
            return Ok(prompt.prompt.clone());
        };

        let update: UpdatePrompt = serde_json::from_value(call.input.clone())
            .map_err(|e| OptimizerError::MalformedResponse(e.to_string()))?;
        Ok(update.updated_prompt)
    }
}
