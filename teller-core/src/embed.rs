//! Text embeddings for semantic search over the memory store
//!
//! - [`OpenAiEmbedder`] - calls the `/embeddings` endpoint
//!   (`text-embedding-3-small`, 1536 dimensions by default)
//! - [`HashEmbedder`] - deterministic bag-of-words feature hashing, for
//!   offline runs and tests

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::provider::openai::post_json;
use crate::provider::retry::{retry_with_backoff, RetryCallback, RetryConfig};
use crate::provider::ProviderError;

/// Errors from embedding text
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// The embeddings API call failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The API returned a different number of vectors than inputs
    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// A vector had the wrong number of dimensions
    #[error("expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Turns text into vectors
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder returns
    fn dimensions(&self) -> usize;

    /// Embed a batch of documents, one vector per input in input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embed a search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbedError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }
}

/// Cosine similarity of two vectors; 0.0 when either is all zeros
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

// ===== OpenAI =====

const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_EMBEDDING_DIMS: usize = 1536;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Embedder backed by the OpenAI embeddings API
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    dimensions: usize,
    retry_config: RetryConfig,
    on_retry: Option<RetryCallback>,
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl OpenAiEmbedder {
    pub fn new(api_key: Option<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: crate::model::Vendor::OpenAi.default_base_url().to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMS,
            retry_config: RetryConfig::default(),
            on_retry: None,
        })
    }

    /// Read `OPENAI_API_KEY` and `OPENAI_BASE_URL` from the environment
    pub fn from_env() -> Result<Self, ProviderError> {
        let embedder = Self::new(std::env::var("OPENAI_API_KEY").ok())?;
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => embedder.with_base_url(url),
            _ => embedder,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a different embedding model and vector size
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::Authentication("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: (self.dimensions != DEFAULT_EMBEDDING_DIMS).then_some(self.dimensions),
        };
        let url = format!("{}/embeddings", self.base_url);

        let mut response: EmbeddingResponse = retry_with_backoff(
            || post_json(&self.client, &url, api_key, &request),
            &self.retry_config,
            &self.on_retry,
        )
        .await?;

        if response.data.len() != texts.len() {
            return Err(EmbedError::CountMismatch {
                expected: texts.len(),
                actual: response.data.len(),
            });
        }

        response.data.sort_by_key(|d| d.index);
        let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dimensions,
                actual: bad.len(),
            });
        }
        Ok(vectors)
    }
}

// ===== Hashing =====

/// Deterministic bag-of-words embedder
///
/// Lowercased alphanumeric tokens are hashed (FNV-1a) into `dimensions`
/// buckets and the result is L2-normalized, so texts sharing words score
/// higher under cosine similarity.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(&token.to_lowercase());
            vector[(hash % self.dimensions as u64) as usize] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[async_trait::async_trait]
impl Embedder for HashEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}
