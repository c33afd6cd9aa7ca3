//! Conversion between teller types and the chat-completions wire format

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::TokenUsage;
use crate::model::ModelResponse;
use crate::provider::ProviderError;
use crate::types::{
    ContentBlock, Message, Role, StopReason, ToolDefinition, ToolUseBlock,
};

// ===== Wire types =====

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl WireMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: WireFunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireFunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct WireTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: WireFunctionDef,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct WireFunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<WireChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireChoice {
    pub message: WireMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: usize,
    #[serde(default)]
    pub completion_tokens: usize,
}

// ===== Outbound =====

/// Convert a conversation into wire messages, system prompt first.
///
/// Tool results become one `tool` message each. `include_names` controls
/// whether assistant author names are sent (not every compatible endpoint
/// accepts the field).
pub(crate) fn to_wire_messages(
    messages: &[Message],
    system_prompt: Option<&str>,
    include_names: bool,
) -> Vec<WireMessage> {
    let mut wire = Vec::with_capacity(messages.len() + 1);

    if let Some(system) = system_prompt {
        wire.push(WireMessage::text("system", system));
    }

    for message in messages {
        match message.role {
            Role::User => {
                let mut text = String::new();
                for block in &message.content {
                    match block {
                        ContentBlock::Text(t) => text.push_str(t),
                        ContentBlock::ToolResult(result) => wire.push(WireMessage {
                            role: "tool".to_string(),
                            content: Some(result.content.as_text()),
                            name: None,
                            tool_calls: None,
                            tool_call_id: Some(result.tool_use_id.clone()),
                        }),
                        ContentBlock::ToolUse(_) => {}
                    }
                }
                if !text.is_empty() || !message.is_tool_result() {
                    wire.push(WireMessage::text("user", text));
                }
            }
            Role::Assistant => {
                let text = message.text();
                let tool_calls: Vec<WireToolCall> = message
                    .tool_uses()
                    .into_iter()
                    .map(|tool_use| WireToolCall {
                        id: tool_use.id.clone(),
                        kind: function_type(),
                        function: WireFunctionCall {
                            name: tool_use.name.clone(),
                            arguments: tool_use.input.to_string(),
                        },
                    })
                    .collect();

                let has_calls = !tool_calls.is_empty();
                wire.push(WireMessage {
                    role: "assistant".to_string(),
                    content: if text.is_empty() && has_calls {
                        None
                    } else {
                        Some(text)
                    },
                    name: if include_names {
                        message.name.clone()
                    } else {
                        None
                    },
                    tool_calls: has_calls.then_some(tool_calls),
                    tool_call_id: None,
                });
            }
        }
    }

    wire
}

/// Convert a tool definition, dropping schema metadata keys the APIs reject
pub(crate) fn to_wire_tool(tool: &ToolDefinition) -> WireTool {
    let mut parameters = tool.input_schema.clone();
    if let Some(obj) = parameters.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.entry("properties")
            .or_insert_with(|| Value::Object(Default::default()));
    }

    WireTool {
        kind: "function",
        function: WireFunctionDef {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters,
        },
    }
}

// ===== Inbound =====

pub(crate) fn from_wire_stop_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("stop") => StopReason::EndTurn,
        Some("tool_calls") | Some("function_call") => StopReason::ToolUse,
        Some("length") => StopReason::MaxTokens,
        Some("content_filter") => StopReason::ContentFiltered,
        _ => StopReason::Unknown,
    }
}

/// Convert the first choice of a response into a [`ModelResponse`].
///
/// A response that carries tool calls is always reported as
/// [`StopReason::ToolUse`], whatever the finish reason says.
pub(crate) fn from_wire_response(response: ChatResponse) -> Result<ModelResponse, ProviderError> {
    let usage = response.usage.map(|u| TokenUsage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
    });

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Model("response contained no choices".to_string()))?;

    let mut content = Vec::new();
    if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
        content.push(ContentBlock::Text(text));
    }

    let tool_calls = choice.message.tool_calls.unwrap_or_default();
    let has_calls = !tool_calls.is_empty();
    for call in tool_calls {
        let id = if call.id.is_empty() {
            format!("call_{}", uuid::Uuid::new_v4().simple())
        } else {
            call.id
        };
        let input = parse_arguments(&call.function.arguments);
        content.push(ContentBlock::ToolUse(ToolUseBlock {
            id,
            name: call.function.name,
            input,
        }));
    }

    let stop_reason = if has_calls {
        StopReason::ToolUse
    } else {
        from_wire_stop_reason(choice.finish_reason.as_deref())
    };

    Ok(ModelResponse {
        message: Message::assistant_with_content(content),
        stop_reason,
        usage,
    })
}

/// Arguments arrive as a JSON string; an empty string means no arguments.
/// Unparseable arguments are kept as a string so the agent can report them.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
