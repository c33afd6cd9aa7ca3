//! Per-invocation context passed down from the app to agents and tools.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::agent::AgentError;
use crate::store::Store;

/// Default number of model calls allowed within one invocation
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Context handed to every tool call.
#[derive(Clone, Default)]
pub struct ToolContext {
    /// Conversation thread the call belongs to
    pub thread_id: Option<String>,
    /// Name of the agent that requested the call
    pub agent_name: Option<String>,
    /// Shared long-term memory store
    pub store: Option<Arc<dyn Store>>,
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("thread_id", &self.thread_id)
            .field("agent_name", &self.agent_name)
            .field("store", &self.store.is_some())
            .finish()
    }
}

/// State shared by every agent taking part in one invocation.
///
/// Cloning is cheap and clones share the step counter, so a supervisor and the
/// workers it hands off to draw from the same recursion budget.
#[derive(Clone)]
pub struct RunContext {
    thread_id: Option<String>,
    store: Option<Arc<dyn Store>>,
    recursion_limit: usize,
    steps: Arc<AtomicUsize>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            thread_id: None,
            store: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            steps: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn store(&self) -> Option<&Arc<dyn Store>> {
        self.store.as_ref()
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Number of model calls made so far
    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }

    /// Record one model call, failing once the limit is exceeded.
    pub fn step(&self) -> Result<usize, AgentError> {
        let taken = self.steps.fetch_add(1, Ordering::SeqCst) + 1;
        if taken > self.recursion_limit {
            return Err(AgentError::RecursionLimit(self.recursion_limit));
        }
        Ok(taken)
    }

    /// Build the context for a tool call made by `agent_name`.
    pub fn tool_context(&self, agent_name: Option<&str>) -> ToolContext {
        ToolContext {
            thread_id: self.thread_id.clone(),
            agent_name: agent_name.map(str::to_string),
            store: self.store.clone(),
        }
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("thread_id", &self.thread_id)
            .field("store", &self.store.is_some())
            .field("recursion_limit", &self.recursion_limit)
            .field("steps", &self.steps())
            .finish()
    }
}
