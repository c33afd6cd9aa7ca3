//! # Teller core
//!
//! Building blocks for supervised multi-agent assistants: worker agents with
//! tools, a supervisor that routes between them, a long-term memory store and
//! per-thread conversation checkpoints.
//!
//! ## Quick Start
//!
//! ```ignore
//! use teller_core::{Agent, Gpt4o, InMemoryCheckpointer, Supervisor, Workflow};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> teller_core::Result<()> {
//!     let balance_expert = Agent::builder()
//!         .name("balance_expert")
//!         .model_from_env(Gpt4o)
//!         .add_tool(CheckBalance)
//!         .with_system_prompt("You are a balance expert.")
//!         .build()
//!         .await?;
//!
//!     let app = Supervisor::builder()
//!         .add_worker(balance_expert)
//!         .model_from_env(Gpt4o)
//!         .with_system_prompt("You are a bank supervisor.")
//!         .build()
//!         .await?
//!         .compile(None, Some(Arc::new(InMemoryCheckpointer::new())));
//!
//!     let answer = app.chat("What is my balance?", "1").await?;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```
//!
//! ## Memory
//!
//! A [`Store`] holds JSON records under hierarchical namespaces and, when
//! configured with an [`IndexConfig`], answers semantic searches. Tools reach
//! it through their [`ToolContext`]; agents can also read their prompt from
//! it with [`AgentBuilder::with_stored_prompt`].
//!
//! ## Checkpoints
//!
//! A [`Checkpointer`] keeps one conversation per thread id. [`App::invoke`]
//! loads it, appends the new input, runs the workflow and saves the result.
//!
//! ## Feature Flags
//!
//! - `test-utils` - [`test_utils::MockProvider`] and [`test_utils::EventCollector`]

pub mod agent;
pub mod app;
pub mod checkpoint;
pub mod context;
pub mod conversation;
pub mod embed;
pub mod error;
pub mod events;
pub mod model;
pub mod models;
pub mod optimizer;
pub mod presentation;
pub mod provider;
pub mod store;
pub mod supervisor;
pub mod tool;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use agent::{
    Agent, AgentBuilder, AgentError, AgentResponse, AgentRun, Prompt, TokenUsageStats,
    ToolCallInfo, ToolInfo, DEFAULT_MAX_CONCURRENT_TOOLS,
};
pub use app::{App, InvokeConfig, State, Workflow};
pub use checkpoint::{Checkpoint, CheckpointError, Checkpointer, InMemoryCheckpointer};
pub use context::{RunContext, ToolContext, DEFAULT_RECURSION_LIMIT};
pub use conversation::{
    BoxedContextPolicy, ContextLimits, ContextPolicy, ContextUsage, LastN, NoOp, SlidingWindow,
};
pub use embed::{cosine_similarity, EmbedError, Embedder, HashEmbedder, OpenAiEmbedder};
pub use error::{Error, Result};
pub use events::{AgentEvent, AgentHook, LogHook, TokenUsage};
pub use model::{Model, ModelResponse, ModelSpec, Vendor};
pub use optimizer::{MultiPromptOptimizer, OptimizerError, PromptSpec, Trajectory};
pub use presentation::{format_message, pretty_print, print_conversation};
pub use provider::{ModelProvider, OpenAiCompatProvider, ProviderError, RetryConfig, RetryInfo};
pub use store::{namespace, IndexConfig, InMemoryStore, Item, Namespace, SearchHit, Store, StoreError};
pub use supervisor::{OutputMode, Supervisor, SupervisorBuilder};
pub use tool::{box_tool, DynTool, Tool, ToolError, ToolResult};
pub use types::{ContentBlock, Message, Role, StopReason, ToolDefinition, ToolResultBlock, ToolUseBlock};

// Models (organized by vendor)
pub use models::{
    // Google
    Gemini2Flash,
    // OpenAI
    Gpt4o,
    Gpt4oMini,
    O3Mini,
};
