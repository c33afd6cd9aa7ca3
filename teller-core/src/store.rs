//! Long-term memory store
//!
//! A namespaced key-value store shared by every agent of an app. Agents read
//! instruction records from it and the memory tools write to and search it.
//! [`InMemoryStore`] optionally embeds values so `search` ranks by semantic
//! similarity.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::embed::{cosine_similarity, EmbedError, Embedder};

/// Hierarchical namespace, e.g. `["instructions"]` or `["memories", "thread-1"]`
pub type Namespace = Vec<String>;

/// Build a namespace from string parts
pub fn namespace<I, S>(parts: I) -> Namespace
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}

/// Errors from store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Value could not be (de)serialized
    #[error("serialization: {0}")]
    Serialization(String),

    /// Backend failure
    #[error("storage: {0}")]
    Storage(String),

    /// Namespace is empty or has an empty segment
    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),

    /// Embedding the value or query failed
    #[error("embedding: {0}")]
    Embedding(#[from] EmbedError),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// A stored value with its location and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub namespace: Namespace,
    pub key: String,
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of [`Store::search`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub item: Item,
    /// Similarity to the query when ranked semantically
    pub score: Option<f32>,
}

/// Namespaced key-value store with search
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Insert or replace the value at `namespace`/`key`
    async fn put(&self, namespace: &[String], key: &str, value: Value) -> Result<(), StoreError>;

    /// Fetch the item at `namespace`/`key`
    async fn get(&self, namespace: &[String], key: &str) -> Result<Option<Item>, StoreError>;

    /// Remove the item at `namespace`/`key`; returns whether it existed
    async fn delete(&self, namespace: &[String], key: &str) -> Result<bool, StoreError>;

    /// All items whose namespace starts with `namespace_prefix`
    async fn list(&self, namespace_prefix: &[String]) -> Result<Vec<Item>, StoreError>;

    /// Search items under `namespace_prefix`.
    ///
    /// With a query, an indexed store ranks by similarity; otherwise items
    /// are filtered by case-insensitive substring match. Without a query,
    /// items are returned most recently updated first.
    async fn search(
        &self,
        namespace_prefix: &[String],
        query: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>, StoreError>;
}

/// Embedding configuration for [`InMemoryStore`]
#[derive(Clone)]
pub struct IndexConfig {
    /// Expected vector length
    pub dims: usize,
    pub embedder: Arc<dyn Embedder>,
    /// JSON fields to embed; `None` embeds the whole value
    pub fields: Option<Vec<String>>,
}

impl IndexConfig {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            dims: embedder.dimensions(),
            embedder,
            fields: None,
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    fn text_for(&self, value: &Value) -> String {
        match &self.fields {
            Some(fields) => fields
                .iter()
                .filter_map(|f| value.get(f))
                .map(value_text)
                .collect::<Vec<_>>()
                .join("\n"),
            None => value_text(value),
        }
    }
}

impl std::fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexConfig")
            .field("dims", &self.dims)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Text of a value for embedding and substring search.
///
/// Memory values written by the memory tools are `{"content": ...}` and
/// document chunks are `{"text": ...}`; those fields are used directly.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(obj) => ["content", "text"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

fn validate_namespace(namespace: &[String]) -> Result<(), StoreError> {
    if namespace.is_empty() {
        return Err(StoreError::InvalidNamespace(
            "namespace cannot be empty".to_string(),
        ));
    }
    if namespace.iter().any(|part| part.is_empty()) {
        return Err(StoreError::InvalidNamespace(format!(
            "namespace {:?} has an empty segment",
            namespace
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct Entry {
    item: Item,
    vector: Option<Vec<f32>>,
}

type EntryKey = (Namespace, String);

/// In-process [`Store`]. Not persistent.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<BTreeMap<EntryKey, Entry>>>,
    index: Option<IndexConfig>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that embeds values on `put` for semantic search
    pub fn with_index(index: IndexConfig) -> Self {
        Self {
            entries: Arc::default(),
            index: Some(index),
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    async fn embed_value(&self, value: &Value) -> Result<Option<Vec<f32>>, StoreError> {
        let Some(index) = &self.index else {
            return Ok(None);
        };
        let text = index.text_for(value);
        let mut vectors = index.embedder.embed_documents(&[text]).await?;
        let vector = vectors.pop().ok_or(EmbedError::CountMismatch {
            expected: 1,
            actual: 0,
        })?;
        if vector.len() != index.dims {
            return Err(EmbedError::DimensionMismatch {
                expected: index.dims,
                actual: vector.len(),
            }
            .into());
        }
        Ok(Some(vector))
    }
}

#[async_trait::async_trait]
impl Store for InMemoryStore {
    async fn put(&self, namespace: &[String], key: &str, value: Value) -> Result<(), StoreError> {
        validate_namespace(namespace)?;
        let vector = self.embed_value(&value).await?;

        let now = Utc::now();
        let map_key = (namespace.to_vec(), key.to_string());
        let mut entries = self.entries.write().await;
        let created_at = entries
            .get(&map_key)
            .map(|e| e.item.created_at)
            .unwrap_or(now);

        entries.insert(
            map_key,
            Entry {
                item: Item {
                    namespace: namespace.to_vec(),
                    key: key.to_string(),
                    value,
                    created_at,
                    updated_at: now,
                },
                vector,
            },
        );
        Ok(())
    }

    async fn get(&self, namespace: &[String], key: &str) -> Result<Option<Item>, StoreError> {
        validate_namespace(namespace)?;
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(namespace.to_vec(), key.to_string()))
            .map(|e| e.item.clone()))
    }

    async fn delete(&self, namespace: &[String], key: &str) -> Result<bool, StoreError> {
        validate_namespace(namespace)?;
        let mut entries = self.entries.write().await;
        Ok(entries
            .remove(&(namespace.to_vec(), key.to_string()))
            .is_some())
    }

    async fn list(&self, namespace_prefix: &[String]) -> Result<Vec<Item>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|e| e.item.namespace.starts_with(namespace_prefix))
            .map(|e| e.item.clone())
            .collect())
    }

    async fn search(
        &self,
        namespace_prefix: &[String],
        query: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        let query_vector = match (query, &self.index) {
            (Some(q), Some(index)) => Some(index.embedder.embed_query(q).await?),
            _ => None,
        };

        let entries = self.entries.read().await;
        let candidates = entries
            .values()
            .filter(|e| e.item.namespace.starts_with(namespace_prefix));

        let mut hits: Vec<SearchHit> = match (query, query_vector) {
            (_, Some(qv)) => {
                let mut scored: Vec<SearchHit> = candidates
                    .filter_map(|e| {
                        e.vector.as_ref().map(|v| SearchHit {
                            item: e.item.clone(),
                            score: Some(cosine_similarity(&qv, v)),
                        })
                    })
                    .collect();
                scored.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                scored
            }
            (Some(q), None) => {
                let needle = q.to_lowercase();
                candidates
                    .filter(|e| {
                        e.item.key.to_lowercase().contains(&needle)
                            || value_text(&e.item.value).to_lowercase().contains(&needle)
                    })
                    .map(|e| SearchHit {
                        item: e.item.clone(),
                        score: None,
                    })
                    .collect()
            }
            (None, None) => {
                let mut all: Vec<SearchHit> = candidates
                    .map(|e| SearchHit {
                        item: e.item.clone(),
                        score: None,
                    })
                    .collect();
                all.sort_by(|a, b| b.item.updated_at.cmp(&a.item.updated_at));
                all
            }
        };

        Ok(hits.drain(..).skip(offset).take(limit).collect())
    }
}
