//! Compiled application: a workflow bound to its store and checkpointer
//!
//! ```ignore
//! let app = supervisor.compile(Some(store), Some(checkpointer));
//! let answer = app.chat("What is the account balance of Holly Owen?", "thread-1").await?;
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::{Agent, AgentError, AgentRun};
use crate::checkpoint::{Checkpoint, Checkpointer};
use crate::context::{RunContext, DEFAULT_RECURSION_LIMIT};
use crate::error::{Error, Result};
use crate::events::{AgentEvent, AgentHook};
use crate::store::Store;
use crate::supervisor::Supervisor;
use crate::tool::ToolResult;
use crate::types::Message;

/// Something that can be compiled into an [`App`]: an agent or a supervisor
#[async_trait::async_trait]
pub trait Workflow: Send + Sync {
    fn name(&self) -> &str;

    /// Run over the whole conversation and return it extended
    async fn run(&self, messages: &[Message], ctx: &RunContext) -> std::result::Result<AgentRun, AgentError>;

    /// Register a hook on every agent taking part
    fn add_shared_hook(&self, hook: Arc<dyn AgentHook>);

    /// Terminal rendering of a tool call, if some agent owns the tool
    fn format_tool_input(&self, tool_name: &str, params: &Value) -> Option<String>;

    fn format_tool_output(&self, tool_name: &str, result: &ToolResult) -> Option<String>;

    /// Bind the workflow to a memory store and a checkpointer
    fn compile(
        self,
        store: Option<Arc<dyn Store>>,
        checkpointer: Option<Arc<dyn Checkpointer>>,
    ) -> App
    where
        Self: Sized + 'static,
    {
        App::new(Arc::new(self), store, checkpointer)
    }
}

#[async_trait::async_trait]
impl Workflow for Agent {
    fn name(&self) -> &str {
        Agent::name(self)
    }

    async fn run(&self, messages: &[Message], ctx: &RunContext) -> std::result::Result<AgentRun, AgentError> {
        self.invoke(messages, ctx).await
    }

    fn add_shared_hook(&self, hook: Arc<dyn AgentHook>) {
        Agent::add_shared_hook(self, hook);
    }

    fn format_tool_input(&self, tool_name: &str, params: &Value) -> Option<String> {
        Agent::format_tool_input(self, tool_name, params)
    }

    fn format_tool_output(&self, tool_name: &str, result: &ToolResult) -> Option<String> {
        Agent::format_tool_output(self, tool_name, result)
    }
}

#[async_trait::async_trait]
impl Workflow for Supervisor {
    fn name(&self) -> &str {
        Supervisor::name(self)
    }

    async fn run(&self, messages: &[Message], ctx: &RunContext) -> std::result::Result<AgentRun, AgentError> {
        self.invoke(messages, ctx).await
    }

    fn add_shared_hook(&self, hook: Arc<dyn AgentHook>) {
        Supervisor::add_shared_hook(self, hook);
    }

    fn format_tool_input(&self, tool_name: &str, params: &Value) -> Option<String> {
        Supervisor::format_tool_input(self, tool_name, params)
    }

    fn format_tool_output(&self, tool_name: &str, result: &ToolResult) -> Option<String> {
        Supervisor::format_tool_output(self, tool_name, result)
    }
}

/// Per-invocation configuration
#[derive(Debug, Clone, Default)]
pub struct InvokeConfig {
    /// Conversation thread; required when the app has a checkpointer
    pub thread_id: Option<String>,
    /// Overrides the app's recursion limit for this call
    pub recursion_limit: Option<usize>,
}

impl InvokeConfig {
    pub fn thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            recursion_limit: None,
        }
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = Some(limit);
        self
    }
}

/// Final state of an invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub messages: Vec<Message>,
}

impl State {
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Text of the last message, the user-visible answer
    pub fn text(&self) -> String {
        self.last_message().map(Message::text).unwrap_or_default()
    }
}

/// A compiled workflow
pub struct App {
    workflow: Arc<dyn Workflow>,
    store: Option<Arc<dyn Store>>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    recursion_limit: usize,
    hooks: Arc<parking_lot::RwLock<Vec<Arc<dyn AgentHook>>>>,
}

impl App {
    pub fn new(
        workflow: Arc<dyn Workflow>,
        store: Option<Arc<dyn Store>>,
        checkpointer: Option<Arc<dyn Checkpointer>>,
    ) -> Self {
        Self {
            workflow,
            store,
            checkpointer,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            hooks: Arc::new(parking_lot::RwLock::new(Vec::new())),
        }
    }

    /// Maximum model calls per invocation (default 25)
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn workflow(&self) -> &Arc<dyn Workflow> {
        &self.workflow
    }

    pub fn store(&self) -> Option<&Arc<dyn Store>> {
        self.store.as_ref()
    }

    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer>> {
        self.checkpointer.as_ref()
    }

    /// Observe the app's checkpoint events and every agent's events
    pub fn add_hook(&self, hook: impl AgentHook + 'static) {
        let hook: Arc<dyn AgentHook> = Arc::new(hook);
        self.hooks.write().push(hook.clone());
        self.workflow.add_shared_hook(hook);
    }

    fn emit_event(&self, event: AgentEvent) {
        for hook in self.hooks.read().iter() {
            hook.on_event(&event);
        }
    }

    /// Run one turn
    ///
    /// Loads the thread's conversation, appends `input`, runs the workflow
    /// and saves the result. Without a checkpointer every call starts from
    /// `input` alone.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when a checkpointer is configured but no thread id
    /// was given; otherwise whatever the workflow or persistence fails with.
    pub async fn invoke(&self, input: Vec<Message>, config: &InvokeConfig) -> Result<State> {
        let thread_id = config.thread_id.as_deref().filter(|t| !t.is_empty());

        let checkpoint = match (&self.checkpointer, thread_id) {
            (Some(_), None) => {
                return Err(Error::Config(
                    "a thread_id is required when the app has a checkpointer".to_string(),
                ))
            }
            (Some(checkpointer), Some(thread_id)) => {
                let checkpoint = checkpointer
                    .load(thread_id)
                    .await?
                    .unwrap_or_else(|| Checkpoint::new(thread_id));
                self.emit_event(AgentEvent::CheckpointLoaded {
                    thread_id: thread_id.to_string(),
                    message_count: checkpoint.messages.len(),
                });
                Some(checkpoint)
            }
            (None, _) => None,
        };

        let mut messages = checkpoint
            .as_ref()
            .map(|c| c.messages.clone())
            .unwrap_or_default();
        messages.extend(input);

        let mut ctx = RunContext::new()
            .with_recursion_limit(config.recursion_limit.unwrap_or(self.recursion_limit));
        if let Some(thread_id) = thread_id {
            ctx = ctx.with_thread_id(thread_id);
        }
        if let Some(store) = &self.store {
            ctx = ctx.with_store(store.clone());
        }

        let run = self.workflow.run(&messages, &ctx).await?;

        if let (Some(checkpointer), Some(checkpoint)) = (&self.checkpointer, checkpoint) {
            let next = checkpoint.advance(run.messages.clone());
            checkpointer.save(&next).await?;
            log::info!(
                "saved thread '{}' at step {} ({} messages)",
                next.thread_id,
                next.step,
                next.messages.len()
            );
            self.emit_event(AgentEvent::CheckpointSaved {
                thread_id: next.thread_id.clone(),
                step: next.step,
                message_count: next.messages.len(),
            });
        }

        Ok(State {
            messages: run.messages,
        })
    }

    /// Send one user message on `thread_id` and return the answer text
    pub async fn chat(&self, query: &str, thread_id: &str) -> Result<String> {
        let state = self
            .invoke(vec![Message::user(query)], &InvokeConfig::thread(thread_id))
            .await?;
        Ok(state.text())
    }

    /// Persisted state of a thread, if any
    pub async fn state(&self, thread_id: &str) -> Result<Option<State>> {
        let Some(checkpointer) = &self.checkpointer else {
            return Ok(None);
        };
        Ok(checkpointer.load(thread_id).await?.map(|c| State {
            messages: c.messages,
        }))
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("workflow", &self.workflow.name())
            .field("store", &self.store.is_some())
            .field("checkpointer", &self.checkpointer.is_some())
            .field("recursion_limit", &self.recursion_limit)
            .finish()
    }
}
