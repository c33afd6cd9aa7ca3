use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ToolContext;

/// Result types that tools can return.
///
/// Both variants are sent to the model as text; `Json` is serialized compactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolResult {
    /// Plain text response
    Text(String),

    /// Structured JSON data - use for list or record responses
    Json(Value),
}

impl ToolResult {
    /// Create a JSON result from any serializable type
    pub fn json<T: Serialize>(value: T) -> Result<Self, serde_json::Error> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Create a text result from a string
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Get the text content, serializing JSON results
    pub fn as_text(&self) -> String {
        match self {
            ToolResult::Text(s) => s.clone(),
            ToolResult::Json(v) => v.to_string(),
        }
    }

    /// Get a reference to the text content if this is a Text variant
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ToolResult::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for ToolResult {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for ToolResult {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Errors that can occur during tool execution
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl From<String> for ToolError {
    fn from(s: String) -> Self {
        Self::Custom(s)
    }
}

impl From<&str> for ToolError {
    fn from(s: &str) -> Self {
        Self::Custom(s.to_string())
    }
}

/// Trait for implementing tools that can be used by agents.
///
/// Tools define an input type with `#[derive(Deserialize, JsonSchema)]` so the
/// JSON schema sent to the model is generated from the Rust type.
///
/// Every call receives a [`ToolContext`] carrying the thread id, the calling
/// agent and the shared memory store (when one is configured).
///
/// ```rust
/// use teller_core::{Tool, ToolContext, ToolError, ToolResult};
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct BalanceInput {
///     /// Customer identifier
///     customer_id: String,
/// }
///
/// struct BalanceTool;
///
/// impl Tool for BalanceTool {
///     type Input = BalanceInput;
///
///     fn name(&self) -> &str { "get_customer_balance" }
///     fn description(&self) -> &str { "Look up a customer's balance" }
///
///     fn execute(
///         &self,
///         input: Self::Input,
///         _ctx: ToolContext,
///     ) -> impl std::future::Future<Output = Result<ToolResult, ToolError>> + Send {
///         async move { Ok(format!("{}: 1000.0", input.customer_id).into()) }
///     }
/// }
/// ```
pub trait Tool: Send + Sync {
    /// The input type for this tool. Must implement `Deserialize` and `JsonSchema`.
    type Input: DeserializeOwned + JsonSchema;

    /// The name of the tool (e.g., "get_customer_balance")
    fn name(&self) -> &str;

    /// A description of what the tool does
    fn description(&self) -> &str;

    /// Execute the tool with typed input
    fn execute(
        &self,
        input: Self::Input,
        ctx: ToolContext,
    ) -> impl std::future::Future<Output = Result<ToolResult, ToolError>> + Send;

    /// Get the JSON schema for this tool's input.
    fn input_schema(&self) -> Value {
        let schema = schemars::schema_for!(Self::Input);
        serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}))
    }

    /// Format tool input as plain text (logs, transcripts).
    fn format_input_plain(&self, params: &Value) -> String {
        format_params_plain(self.name(), params)
    }

    /// Format tool input with ANSI colors (terminal display).
    fn format_input_ansi(&self, params: &Value) -> String {
        format_params_ansi(self.name(), params)
    }

    /// Format tool output as plain text.
    fn format_output_plain(&self, result: &ToolResult) -> String {
        format_result_plain(result)
    }

    /// Format tool output with ANSI colors.
    fn format_output_ansi(&self, result: &ToolResult) -> String {
        format_result_ansi(result)
    }
}

/// Object-safe trait for dynamic tool dispatch (used internally by the agent).
///
/// Implement `Tool` instead and use `box_tool()` to convert.
pub trait DynTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> Value;
    fn execute_raw(
        &self,
        input: Value,
        ctx: ToolContext,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ToolResult, ToolError>> + Send + '_>,
    >;

    fn format_input_plain(&self, params: &Value) -> String;
    fn format_input_ansi(&self, params: &Value) -> String;
    fn format_output_plain(&self, result: &ToolResult) -> String;
    fn format_output_ansi(&self, result: &ToolResult) -> String;
}

/// Convert a `Tool` into a type-erased `Box<dyn DynTool>` for storage in collections.
pub fn box_tool<T: Tool + 'static>(tool: T) -> Box<dyn DynTool> {
    Box::new(ToolWrapper(tool))
}

/// Create a `Vec<Box<dyn DynTool>>` from heterogeneous tool types.
///
/// ```ignore
/// let agent = Agent::builder()
///     .provider(provider)
///     .add_tools(box_tools![InterestRateTool::new(retriever), manage, search])
///     .build()
///     .await?;
/// ```
#[macro_export]
macro_rules! box_tools {
    ($($tool:expr),* $(,)?) => {
        vec![$($crate::tool::box_tool($tool)),*]
    };
}

struct ToolWrapper<T>(T);

impl<T: Tool + 'static> DynTool for ToolWrapper<T> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn description(&self) -> &str {
        self.0.description()
    }

    fn input_schema(&self) -> Value {
        self.0.input_schema()
    }

    fn execute_raw(
        &self,
        input: Value,
        ctx: ToolContext,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ToolResult, ToolError>> + Send + '_>,
    > {
        Box::pin(async move {
            let typed_input: T::Input = serde_json::from_value(input)
                .map_err(|e| ToolError::Custom(format!("Failed to deserialize input: {}", e)))?;

            self.0.execute(typed_input, ctx).await
        })
    }

    fn format_input_plain(&self, params: &Value) -> String {
        self.0.format_input_plain(params)
    }

    fn format_input_ansi(&self, params: &Value) -> String {
        self.0.format_input_ansi(params)
    }

    fn format_output_plain(&self, result: &ToolResult) -> String {
        self.0.format_output_plain(result)
    }

    fn format_output_ansi(&self, result: &ToolResult) -> String {
        self.0.format_output_ansi(result)
    }
}

// ============================================================================
// Default formatting helpers
// ============================================================================

const MAX_PARAMS: usize = 10;
const MAX_VALUE_LEN: usize = 80;
const MAX_OUTPUT_LINES: usize = 12;

fn truncate_chars(s: &str, max: usize) -> Option<&str> {
    s.char_indices().nth(max).map(|(idx, _)| &s[..idx])
}

fn format_value_preview(value: &Value) -> String {
    match value {
        Value::String(s) => match truncate_chars(s, MAX_VALUE_LEN) {
            Some(head) => format!("\"{}…\"", head),
            None => format!("\"{}\"", s),
        },
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} keys}}", obj.len()),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    }
}

/// Format tool parameters as plain text
pub fn format_params_plain(tool_name: &str, params: &Value) -> String {
    let mut output = tool_name.to_string();

    if let Some(obj) = params.as_object() {
        for (key, value) in obj.iter().take(MAX_PARAMS) {
            output.push_str(&format!("\n  {}: {}", key, format_value_preview(value)));
        }
        if obj.len() > MAX_PARAMS {
            output.push_str(&format!("\n  … +{} more", obj.len() - MAX_PARAMS));
        }
    }

    output
}

/// Format tool parameters with ANSI colors
pub fn format_params_ansi(tool_name: &str, params: &Value) -> String {
    let mut output = format!("\x1b[1m{}\x1b[0m", tool_name);

    if let Some(obj) = params.as_object() {
        for (key, value) in obj.iter().take(MAX_PARAMS) {
            output.push_str(&format!(
                "\n  \x1b[2m{}:\x1b[0m {}",
                key,
                format_value_preview(value)
            ));
        }
        if obj.len() > MAX_PARAMS {
            output.push_str(&format!(
                "\n  \x1b[2m… +{} more\x1b[0m",
                obj.len() - MAX_PARAMS
            ));
        }
    }

    output
}

fn result_to_text(result: &ToolResult) -> String {
    match result {
        ToolResult::Text(s) => s.clone(),
        ToolResult::Json(v) => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
    }
}

/// Truncate text to max lines, returning (truncated_text, remaining_lines)
fn truncate_lines(text: &str, max_lines: usize) -> (String, usize) {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines {
        (text.to_string(), 0)
    } else {
        let truncated = lines[..max_lines].join("\n");
        (truncated, lines.len() - max_lines)
    }
}

/// Format tool result as plain text
pub fn format_result_plain(result: &ToolResult) -> String {
    let text = result_to_text(result);
    let (truncated, remaining) = truncate_lines(&text, MAX_OUTPUT_LINES);

    if remaining > 0 {
        format!("{}\n… +{} more lines", truncated, remaining)
    } else {
        truncated
    }
}

/// Format tool result with ANSI colors
pub fn format_result_ansi(result: &ToolResult) -> String {
    let text = result_to_text(result);
    let (truncated, remaining) = truncate_lines(&text, MAX_OUTPUT_LINES);

    if remaining > 0 {
        format!(
            "\x1b[32m✓\x1b[0m\n{}\n\x1b[2m… +{} more lines\x1b[0m",
            truncated, remaining
        )
    } else {
        format!("\x1b[32m✓\x1b[0m\n{}", truncated)
    }
}
