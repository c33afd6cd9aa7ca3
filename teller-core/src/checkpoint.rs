//! Per-thread conversation persistence
//!
//! A [`Checkpointer`] keeps the latest message history of every conversation
//! thread. The app loads it before an invocation and saves the extended history
//! afterwards, so repeated calls with the same thread id continue one
//! conversation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::types::Message;

/// Errors from checkpoint operations
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("thread_id required")]
    ThreadIdRequired,
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for CheckpointError {
    fn from(e: serde_json::Error) -> Self {
        CheckpointError::Serialization(e.to_string())
    }
}

/// Saved state of one conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    /// Full message history, oldest first
    pub messages: Vec<Message>,
    /// Number of completed invocations on this thread
    pub step: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// An empty thread at step 0
    pub fn new(thread_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            step: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// The checkpoint after one more invocation that produced `messages`
    pub fn advance(&self, messages: Vec<Message>) -> Self {
        Self {
            thread_id: self.thread_id.clone(),
            messages,
            step: self.step + 1,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }
}

/// Loads and saves thread checkpoints
#[async_trait::async_trait]
pub trait Checkpointer: Send + Sync {
    /// Latest checkpoint for `thread_id`, if the thread exists
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError>;

    /// Replace the thread's checkpoint
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;

    /// Ids of all saved threads, most recently updated first
    async fn list_threads(&self) -> Result<Vec<String>, CheckpointError>;

    /// Remove a thread; returns whether it existed
    async fn delete(&self, thread_id: &str) -> Result<bool, CheckpointError>;
}

/// In-process [`Checkpointer`]. State is lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointer {
    threads: Arc<RwLock<HashMap<String, Checkpoint>>>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        if thread_id.is_empty() {
            return Err(CheckpointError::ThreadIdRequired);
        }
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        if checkpoint.thread_id.is_empty() {
            return Err(CheckpointError::ThreadIdRequired);
        }
        self.threads
            .write()
            .await
            .insert(checkpoint.thread_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn list_threads(&self) -> Result<Vec<String>, CheckpointError> {
        let threads = self.threads.read().await;
        let mut entries: Vec<&Checkpoint> = threads.values().collect();
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entries.into_iter().map(|c| c.thread_id.clone()).collect())
    }

    async fn delete(&self, thread_id: &str) -> Result<bool, CheckpointError> {
        Ok(self.threads.write().await.remove(thread_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_thread() {
        let saver = InMemoryCheckpointer::new();
        assert!(saver.load("thread-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let saver = InMemoryCheckpointer::new();
        let checkpoint = Checkpoint::new("thread-1")
            .advance(vec![Message::user("hi"), Message::assistant("hello")]);
        saver.save(&checkpoint).await.unwrap();

        let loaded = saver.load("thread-1").await.unwrap().unwrap();
        assert_eq!(loaded.step, 1);
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded, checkpoint);
    }

    #[tokio::test]
    async fn test_threads_are_isolated() {
        let saver = InMemoryCheckpointer::new();
        saver
            .save(&Checkpoint::new("a").advance(vec![Message::user("one")]))
            .await
            .unwrap();
        saver
            .save(&Checkpoint::new("b").advance(vec![Message::user("two")]))
            .await
            .unwrap();

        assert_eq!(saver.load("a").await.unwrap().unwrap().messages[0].text(), "one");
        assert_eq!(saver.load("b").await.unwrap().unwrap().messages[0].text(), "two");
        assert_eq!(saver.list_threads().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_thread_id_rejected() {
        let saver = InMemoryCheckpointer::new();
        assert!(matches!(
            saver.load("").await,
            Err(CheckpointError::ThreadIdRequired)
        ));
        assert!(matches!(
            saver.save(&Checkpoint::new("")).await,
            Err(CheckpointError::ThreadIdRequired)
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let saver = InMemoryCheckpointer::new();
        saver.save(&Checkpoint::new("t")).await.unwrap();
        assert!(saver.delete("t").await.unwrap());
        assert!(!saver.delete("t").await.unwrap());
    }

    #[test]
    fn test_advance_keeps_created_at() {
        let first = Checkpoint::new("t");
        let second = first.advance(vec![Message::user("x")]);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.step, 1);
        assert_eq!(second.advance(Vec::new()).step, 2);
    }
}
