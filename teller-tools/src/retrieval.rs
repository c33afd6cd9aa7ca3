//! Document retrieval over the memory store
//!
//! [`StoreRetriever`] splits documents into paragraph chunks, puts them in a
//! [`Store`] namespace and answers [`DocumentRetriever::retrieve`] with the
//! best matching chunks. Ranking is whatever the store's `search` does, so
//! the store should be built with an embedding index for semantic matches.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use teller_core::{Namespace, Store, StoreError, ToolError};
use thiserror::Error;

use crate::banking::DocumentRetriever;

/// Chunks returned per query
pub const DEFAULT_TOP_K: usize = 4;

/// Paragraphs are merged into chunks up to this many characters
pub const DEFAULT_CHUNK_CHARS: usize = 1000;

const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RetrievalError> for ToolError {
    fn from(err: RetrievalError) -> Self {
        ToolError::Custom(err.to_string())
    }
}

impl From<RetrievalError> for teller_core::Error {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::Store(e) => e.into(),
            other => ToolError::from(other).into(),
        }
    }
}

/// Retriever backed by a store namespace
#[derive(Clone)]
pub struct StoreRetriever {
    store: Arc<dyn Store>,
    namespace: Namespace,
    top_k: usize,
    chunk_chars: usize,
}

impl StoreRetriever {
    pub fn new(store: Arc<dyn Store>, namespace: Namespace) -> Self {
        Self {
            store,
            namespace,
            top_k: DEFAULT_TOP_K,
            chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }

    /// Chunk `text` and store the chunks under keys `{source}#{n}`
    ///
    /// Returns the number of chunks stored.
    pub async fn add_document(&self, source: &str, text: &str) -> Result<usize, RetrievalError> {
        let chunks = split_paragraphs(text, self.chunk_chars);
        for (i, chunk) in chunks.iter().enumerate() {
            self.store
                .put(
                    &self.namespace,
                    &format!("{}#{}", source, i),
                    json!({"text": chunk, "source": source}),
                )
                .await?;
        }
        Ok(chunks.len())
    }

    /// Add every `.txt` and `.md` file in `dir`, in file name order
    ///
    /// Returns the number of chunks stored.
    pub async fn add_dir(&self, dir: impl AsRef<Path>) -> Result<usize, RetrievalError> {
        let dir = dir.as_ref();
        let io_error = |source| RetrievalError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            let is_document = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| DOCUMENT_EXTENSIONS.contains(&e));
            if is_document {
                paths.push(path);
            }
        }
        paths.sort();

        let mut total = 0;
        for path in paths {
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| RetrievalError::Io {
                    path: path.clone(),
                    source,
                })?;
            let source = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            total += self.add_document(&source, &text).await?;
        }
        log::info!("indexed {} chunks from {}", total, dir.display());
        Ok(total)
    }

    /// Best matching chunk texts for `query`
    pub async fn search(&self, query: &str) -> Result<Vec<String>, RetrievalError> {
        let hits = self
            .store
            .search(&self.namespace, Some(query), self.top_k, 0)
            .await?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| hit.item.value["text"].as_str().map(str::to_string))
            .collect())
    }
}

#[async_trait]
impl DocumentRetriever for StoreRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<String>, ToolError> {
        Ok(self.search(query).await?)
    }
}

impl std::fmt::Debug for StoreRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRetriever")
            .field("namespace", &self.namespace)
            .field("top_k", &self.top_k)
            .finish()
    }
}

/// Split on blank lines, then merge neighbouring paragraphs up to `max_chars`
///
/// Lengths are counted in characters. A paragraph longer than `max_chars` is
/// first broken at whitespace, and a single word longer than that is cut.
fn split_paragraphs(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    let pieces = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .flat_map(|p| split_long_paragraph(p, max_chars));
    for piece in pieces {
        let len = piece.chars().count();
        if current_len > 0 && current_len + 2 + len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push_str("\n\n");
            current_len += 2;
        }
        current.push_str(&piece);
        current_len += len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_long_paragraph(paragraph: &str, max_chars: usize) -> Vec<String> {
    if paragraph.chars().count() <= max_chars {
        return vec![paragraph.to_string()];
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_len = 0;
    for word in paragraph.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for part in chars.chunks(max_chars) {
            if piece_len > 0 && piece_len + 1 + part.len() > max_chars {
                pieces.push(std::mem::take(&mut piece));
                piece_len = 0;
            }
            if piece_len > 0 {
                piece.push(' ');
                piece_len += 1;
            }
            piece.extend(part);
            piece_len += part.len();
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use teller_core::{namespace, HashEmbedder, IndexConfig, InMemoryStore};

    fn indexed_store() -> Arc<dyn Store> {
        Arc::new(InMemoryStore::with_index(
            IndexConfig::new(Arc::new(HashEmbedder::new(256))).with_fields(["text"]),
        ))
    }

    #[test]
    fn test_split_paragraphs() {
        let text = "Cash ISA\n\nRate 4.5%\n\n\n\nFixed saver\n\n";
        assert_eq!(
            split_paragraphs(text, 1000),
            vec!["Cash ISA\n\nRate 4.5%\n\nFixed saver"]
        );
        assert_eq!(
            split_paragraphs(text, 11),
            vec!["Cash ISA", "Rate 4.5%", "Fixed saver"]
        );
        assert!(split_paragraphs("  \n\n ", 10).is_empty());
    }

    #[test]
    fn test_split_long_paragraph() {
        let text = "Cash ISA Saver pays 4.25% AER on balances\n\nFixed";
        let chunks = split_paragraphs(text, 16);
        assert_eq!(
            chunks,
            vec!["Cash ISA Saver", "pays 4.25% AER", "on balances", "Fixed"]
        );
        assert!(chunks.iter().all(|c| c.chars().count() <= 16));

        // counted in characters, and a word past the limit is cut
        assert_eq!(split_paragraphs("££££££", 4), vec!["££££", "££"]);
    }

    #[tokio::test]
    async fn test_retrieve_ranks_relevant_chunk_first() {
        let retriever = StoreRetriever::new(indexed_store(), namespace(["documents"]))
            .with_chunk_chars(60)
            .with_top_k(1);
        let added = retriever
            .add_document(
                "rates.md",
                "The Cash ISA pays 4.5% AER variable.\n\n\
                 The easy access saver pays 3.1% AER.\n\n\
                 Mortgage rates start at 5.2%.",
            )
            .await
            .unwrap();
        assert_eq!(added, 3);

        let docs = retriever.retrieve("What does the Cash ISA pay").await.unwrap();
        assert_eq!(docs, vec!["The Cash ISA pays 4.5% AER variable."]);
    }

    #[tokio::test]
    async fn test_add_dir_reads_documents_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_isa.txt"), "Cash ISA 4.5%").unwrap();
        std::fs::write(dir.path().join("b_saver.md"), "Saver 3.1%\n\nBonus 0.5%").unwrap();
        std::fs::write(dir.path().join("notes.csv"), "ignored,1").unwrap();

        let store = indexed_store();
        let retriever = StoreRetriever::new(store.clone(), namespace(["documents"]));
        assert_eq!(retriever.add_dir(dir.path()).await.unwrap(), 2);

        let item = store
            .get(&namespace(["documents"]), "a_isa.txt#0")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.value["source"], "a_isa.txt");
        assert_eq!(store.list(&namespace(["documents"])).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_dir_missing() {
        let retriever = StoreRetriever::new(indexed_store(), namespace(["documents"]));
        let err = retriever.add_dir("/nonexistent/rates").await.unwrap_err();
        assert!(matches!(err, RetrievalError::Io { .. }));
    }
}
