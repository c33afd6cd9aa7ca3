//! Long-term memory tools
//!
//! [`ManageMemoryTool`] creates, updates and deletes memories and
//! [`SearchMemoryTool`] searches them. Both work on the store handed to the
//! tool call through its [`ToolContext`], under a namespace fixed when the
//! tool is built.
//!
//! A namespace segment written as `{thread_id}` or `{agent}` is filled in per
//! call from the context, so memories can be scoped to a conversation or to
//! an agent:
//!
//! ```rust
//! use teller_tools::memory::{memory_tools, MemoryNamespace};
//!
//! let shared = memory_tools(MemoryNamespace::new(["agent_memories"]));
//! let per_thread = memory_tools(MemoryNamespace::new(["memories", "{thread_id}"]));
//! assert_eq!(shared.len(), 2);
//! ```

use std::sync::Arc;

use teller_core::tool::{box_tool, DynTool};
use teller_core::{Namespace, Store};

use crate::prelude::*;

const THREAD_PLACEHOLDER: &str = "{thread_id}";
const AGENT_PLACEHOLDER: &str = "{agent}";

/// Namespace template for memory tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNamespace(Vec<String>);

impl MemoryNamespace {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// The concrete namespace for one tool call
    pub fn resolve(&self, ctx: &ToolContext) -> Result<Namespace, ToolError> {
        self.0
            .iter()
            .map(|part| match part.as_str() {
                THREAD_PLACEHOLDER => ctx.thread_id.clone().ok_or_else(|| {
                    ToolError::Custom("memory namespace needs a thread_id".to_string())
                }),
                AGENT_PLACEHOLDER => ctx.agent_name.clone().ok_or_else(|| {
                    ToolError::Custom("memory namespace needs an agent name".to_string())
                }),
                _ => Ok(part.clone()),
            })
            .collect()
    }
}

impl Default for MemoryNamespace {
    fn default() -> Self {
        Self::new(["memories"])
    }
}

fn store_of(ctx: &ToolContext) -> Result<Arc<dyn Store>, ToolError> {
    ctx.store.clone().ok_or_else(|| {
        ToolError::Custom(
            "no memory store is configured; compile the workflow with a store".to_string(),
        )
    })
}

fn store_error(err: teller_core::StoreError) -> ToolError {
    ToolError::Custom(err.to_string())
}

/// What [`ManageMemoryTool`] should do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemoryAction {
    #[default]
    Create,
    Update,
    Delete,
}

/// Input for managing a memory
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ManageMemoryInput {
    /// The memory text. Required for create and update.
    #[serde(default)]
    pub content: Option<String>,

    /// create (default), update or delete
    #[serde(default)]
    pub action: MemoryAction,

    /// Id of an existing memory. Required for update and delete; omit when creating.
    #[serde(default)]
    pub id: Option<String>,
}

/// Tool that creates, updates or deletes one memory
#[derive(Debug, Clone)]
pub struct ManageMemoryTool {
    namespace: MemoryNamespace,
}

impl ManageMemoryTool {
    pub fn new(namespace: MemoryNamespace) -> Self {
        Self { namespace }
    }
}

impl Tool for ManageMemoryTool {
    type Input = ManageMemoryInput;

    fn name(&self) -> &str {
        "manage_memory"
    }

    fn description(&self) -> &str {
        "Create, update, or delete a memory to persist across conversations. \
         Include the memory id when updating or deleting a memory; omit it when creating one. \
         Call this proactively when the user shares preferences or facts worth remembering, \
         asks you to remember something, or corrects something you remembered."
    }

    async fn execute(&self, input: Self::Input, ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let namespace = self.namespace.resolve(&ctx)?;
        let store = store_of(&ctx)?;

        match input.action {
            MemoryAction::Create => {
                if input.id.is_some() {
                    return Err(ToolError::Custom(
                        "You cannot provide a memory id when creating a memory. \
                         Try again without the id argument."
                            .to_string(),
                    ));
                }
                let content = input
                    .content
                    .ok_or_else(|| ToolError::Custom("content is required to create a memory".to_string()))?;
                let id = uuid::Uuid::new_v4().to_string();
                store
                    .put(&namespace, &id, serde_json::json!({"content": content}))
                    .await
                    .map_err(store_error)?;
                log::debug!("created memory {} in {:?}", id, namespace);
                Ok(ToolResult::text(format!("created memory {}", id)))
            }
            MemoryAction::Update => {
                let id = input
                    .id
                    .ok_or_else(|| ToolError::Custom("id is required to update a memory".to_string()))?;
                let content = input
                    .content
                    .ok_or_else(|| ToolError::Custom("content is required to update a memory".to_string()))?;
                store
                    .put(&namespace, &id, serde_json::json!({"content": content}))
                    .await
                    .map_err(store_error)?;
                Ok(ToolResult::text(format!("updated memory {}", id)))
            }
            MemoryAction::Delete => {
                let id = input
                    .id
                    .ok_or_else(|| ToolError::Custom("id is required to delete a memory".to_string()))?;
                if !store.delete(&namespace, &id).await.map_err(store_error)? {
                    return Err(ToolError::Custom(format!("no memory with id {}", id)));
                }
                Ok(ToolResult::text(format!("Deleted memory {}", id)))
            }
        }
    }
}

fn default_limit() -> usize {
    10
}

/// Input for searching memories
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchMemoryInput {
    /// What to look for
    pub query: String,

    /// Maximum number of memories to return (default: 10)
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Number of results to skip (default: 0)
    #[serde(default)]
    pub offset: usize,
}

/// Tool that searches memories, best matches first
#[derive(Debug, Clone)]
pub struct SearchMemoryTool {
    namespace: MemoryNamespace,
}

impl SearchMemoryTool {
    pub fn new(namespace: MemoryNamespace) -> Self {
        Self { namespace }
    }
}

impl Tool for SearchMemoryTool {
    type Input = SearchMemoryInput;

    fn name(&self) -> &str {
        "search_memory"
    }

    fn description(&self) -> &str {
        "Search your long-term memories for information relevant to the current conversation."
    }

    async fn execute(&self, input: Self::Input, ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let namespace = self.namespace.resolve(&ctx)?;
        let store = store_of(&ctx)?;

        let hits = store
            .search(&namespace, Some(&input.query), input.limit, input.offset)
            .await
            .map_err(store_error)?;

        Ok(ToolResult::json(hits)?)
    }
}

/// Both memory tools over one namespace
pub fn memory_tools(namespace: MemoryNamespace) -> Vec<Box<dyn DynTool>> {
    vec![
        box_tool(ManageMemoryTool::new(namespace.clone())),
        box_tool(SearchMemoryTool::new(namespace)),
    ]
}
