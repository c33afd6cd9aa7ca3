//! Provider-agnostic types for conversations and tools
//!
//! Agents, supervisors, checkpoints and providers all speak in these types.
//! Providers convert them to their wire format at the edge.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the conversation
///
/// Tool results travel on `User` messages as [`ContentBlock::ToolResult`]
/// blocks. `name` records which agent authored an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Create a new user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text(text.into())],
            name: None,
        }
    }

    /// Create a new assistant message with text content
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::Text(text.into())],
            name: None,
        }
    }

    /// Create a new user message with tool results
    pub fn tool_results(results: Vec<ToolResultBlock>) -> Self {
        Self {
            role: Role::User,
            content: results.into_iter().map(ContentBlock::ToolResult).collect(),
            name: None,
        }
    }

    /// Create an assistant message with text and tool use blocks
    ///
    /// Empty text is omitted so that pure tool-call turns carry no text block.
    pub fn assistant_with_tool_use(text: impl Into<String>, tool_uses: Vec<ToolUseBlock>) -> Self {
        let text = text.into();
        let mut content = Vec::with_capacity(tool_uses.len() + 1);
        if !text.is_empty() {
            content.push(ContentBlock::Text(text));
        }
        content.extend(tool_uses.into_iter().map(ContentBlock::ToolUse));
        Self {
            role: Role::Assistant,
            content,
            name: None,
        }
    }

    /// Create an assistant message with arbitrary content blocks
    pub fn assistant_with_content(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            name: None,
        }
    }

    /// Attach the name of the agent that produced this message
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Get all text content concatenated
    ///
    /// For tool-result messages the result text is returned, so that the
    /// "last message" of a conversation always has something to show.
    pub fn text(&self) -> String {
        let texts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|c| match c {
                ContentBlock::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        if !texts.is_empty() || !self.is_tool_result() {
            return texts.join("");
        }
        self.tool_results_iter()
            .map(|r| r.content.as_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Get all tool use blocks
    pub fn tool_uses(&self) -> Vec<&ToolUseBlock> {
        self.content
            .iter()
            .filter_map(|c| match c {
                ContentBlock::ToolUse(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    /// Iterate over tool result blocks
    pub fn tool_results_iter(&self) -> impl Iterator<Item = &ToolResultBlock> {
        self.content.iter().filter_map(|c| match c {
            ContentBlock::ToolResult(r) => Some(r),
            _ => None,
        })
    }

    /// True when this message carries tool results
    pub fn is_tool_result(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, ContentBlock::ToolResult(_)))
    }
}

/// Content block within a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text(String),
    /// Tool use request from assistant
    ToolUse(ToolUseBlock),
    /// Tool result sent back to the model
    ToolResult(ToolResultBlock),
}

/// A tool use request from the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseBlock {
    /// Unique ID for this tool use (used to match with result)
    pub id: String,
    /// Tool name
    pub name: String,
    /// Tool input parameters as JSON
    pub input: Value,
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultBlock {
    /// ID of the tool use this is a result for
    pub tool_use_id: String,
    /// Result content (text or structured)
    pub content: crate::tool::ToolResult,
    /// Whether the tool execution succeeded
    pub status: ToolResultStatus,
}

impl ToolResultBlock {
    pub fn success(tool_use_id: impl Into<String>, content: impl Into<crate::tool::ToolResult>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            status: ToolResultStatus::Success,
        }
    }

    pub fn error(tool_use_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: crate::tool::ToolResult::Text(message.into()),
            status: ToolResultStatus::Error,
        }
    }
}

/// Status of a tool result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResultStatus {
    Success,
    Error,
}

/// Definition of a tool available to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the tool's name() method)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema for input parameters
    pub input_schema: Value,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response
    EndTurn,
    /// Model wants to use a tool
    ToolUse,
    /// Hit max token limit
    MaxTokens,
    /// Content was filtered
    ContentFiltered,
    /// Stop sequence encountered
    StopSequence,
    /// Unknown/other reason
    #[default]
    Unknown,
}
