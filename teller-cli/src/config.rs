//! Settings read from the environment

use std::path::PathBuf;

/// Default location of the bundled CSVs and documents
pub const DEFAULT_DATA_DIR: &str = "data";

/// Which embedder backs semantic search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// OpenAI `text-embedding-3-small`
    OpenAi,
    /// Local hashing embedder, no network
    Hash,
}

/// Process settings
///
/// API keys are not validated here; a missing key shows up as an
/// authentication error on the first model call.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub google_base_url: Option<String>,
    pub openai_base_url: Option<String>,
    /// Directory holding `customers.csv`, `pending_transactions.csv` and `interest_rates/`
    pub data_dir: PathBuf,
    /// SQLite file for conversation checkpoints; in memory when unset
    pub checkpoint_db: Option<PathBuf>,
    pub embeddings: EmbeddingBackend,
}

impl Settings {
    /// Load `.env` (if present) and read the environment
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => log::warn!("ignoring .env: {}", e),
        }
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = get("OPENAI_API_KEY");
        let embeddings = match get("TELLER_EMBEDDINGS").as_deref() {
            Some("hash") => EmbeddingBackend::Hash,
            Some("openai") => EmbeddingBackend::OpenAi,
            Some(other) => {
                log::warn!("unknown TELLER_EMBEDDINGS value '{}', using openai", other);
                EmbeddingBackend::OpenAi
            }
            None if openai_api_key.is_none() => {
                log::warn!("OPENAI_API_KEY is not set; using local hashing embeddings");
                EmbeddingBackend::Hash
            }
            None => EmbeddingBackend::OpenAi,
        };

        Self {
            google_api_key: get("GOOGLE_API_KEY"),
            openai_api_key,
            google_base_url: get("GOOGLE_BASE_URL"),
            openai_base_url: get("OPENAI_BASE_URL"),
            data_dir: get("TELLER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            checkpoint_db: get("TELLER_CHECKPOINT_DB").map(PathBuf::from),
            embeddings,
        }
    }

    /// Where the shell keeps its input history
    pub fn history_path() -> PathBuf {
        dirs::cache_dir()
            .map(|p| p.join("teller/history.txt"))
            .unwrap_or_else(|| ".teller/history.txt".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]);
        assert_eq!(s.data_dir, PathBuf::from("data"));
        assert_eq!(s.checkpoint_db, None);
        assert_eq!(s.google_api_key, None);
        assert_eq!(s.embeddings, EmbeddingBackend::Hash);
    }

    #[test]
    fn test_reads_keys_and_paths() {
        let s = settings(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("OPENAI_API_KEY", "o-key"),
            ("TELLER_DATA_DIR", "/srv/bank"),
            ("TELLER_CHECKPOINT_DB", "/tmp/threads.db"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
        ]);
        assert_eq!(s.google_api_key.as_deref(), Some("g-key"));
        assert_eq!(s.openai_api_key.as_deref(), Some("o-key"));
        assert_eq!(s.data_dir, PathBuf::from("/srv/bank"));
        assert_eq!(s.checkpoint_db, Some(PathBuf::from("/tmp/threads.db")));
        assert_eq!(s.openai_base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(s.embeddings, EmbeddingBackend::OpenAi);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let s = settings(&[("GOOGLE_API_KEY", "  "), ("TELLER_CHECKPOINT_DB", "")]);
        assert_eq!(s.google_api_key, None);
        assert_eq!(s.checkpoint_db, None);
    }

    #[test]
    fn test_embedding_override() {
        let s = settings(&[("OPENAI_API_KEY", "o-key"), ("TELLER_EMBEDDINGS", "hash")]);
        assert_eq!(s.embeddings, EmbeddingBackend::Hash);
    }
}
