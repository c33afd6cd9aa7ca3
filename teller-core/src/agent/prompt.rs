//! System prompt sources for agents

use std::sync::Arc;

use crate::store::{Namespace, Store};

use super::types::AgentError;

/// Where an agent's system prompt comes from
#[derive(Debug, Clone, Default)]
pub enum Prompt {
    /// No system prompt
    #[default]
    None,
    /// Fixed text
    Static(String),
    /// Instruction record read from the store on every invocation
    ///
    /// The record value is `{"prompt": "..."}`. It is rendered as
    /// `"## Instructions\n\n{prompt}"`. `fallback` is used when the record
    /// does not exist.
    Stored {
        namespace: Namespace,
        key: String,
        fallback: Option<String>,
    },
}

impl Prompt {
    /// Instruction record `key` in `namespace`
    pub fn stored(namespace: Namespace, key: impl Into<String>) -> Self {
        Prompt::Stored {
            namespace,
            key: key.into(),
            fallback: None,
        }
    }

    /// Set the text used when the instruction record is missing
    pub fn or_else(self, fallback: impl Into<String>) -> Self {
        match self {
            Prompt::Stored { namespace, key, .. } => Prompt::Stored {
                namespace,
                key,
                fallback: Some(fallback.into()),
            },
            other => other,
        }
    }

    /// Produce the system prompt for one invocation
    pub(crate) async fn resolve(
        &self,
        store: Option<&Arc<dyn Store>>,
    ) -> Result<Option<String>, AgentError> {
        match self {
            Prompt::None => Ok(None),
            Prompt::Static(text) => Ok(Some(text.clone())),
            Prompt::Stored {
                namespace,
                key,
                fallback,
            } => {
                let stored = match store {
                    Some(store) => store.get(namespace, key).await?,
                    None => None,
                };

                let instructions = stored
                    .as_ref()
                    .and_then(|item| item.value.get("prompt"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .or_else(|| fallback.clone());

                match instructions {
                    Some(text) => Ok(Some(format!("## Instructions\n\n{}", text))),
                    None if store.is_none() => Err(AgentError::Config(format!(
                        "prompt '{}' is stored but no store was provided",
                        key
                    ))),
                    None => Err(AgentError::Config(format!(
                        "no instruction record '{}' in namespace {:?}",
                        key, namespace
                    ))),
                }
            }
        }
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Prompt::Static(text.to_string())
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Prompt::Static(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{namespace, InMemoryStore};
    use serde_json::json;

    async fn store_with(prompt: &str) -> Arc<dyn Store> {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        store
            .put(&namespace(["instructions"]), "email_agent", json!({ "prompt": prompt }))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_static_and_none() {
        assert_eq!(Prompt::None.resolve(None).await.unwrap(), None);
        assert_eq!(
            Prompt::from("You are a bank supervisor").resolve(None).await.unwrap(),
            Some("You are a bank supervisor".to_string())
        );
    }

    #[tokio::test]
    async fn test_stored_prompt_is_read_each_time() {
        let store = store_with("Write good emails.").await;
        let prompt = Prompt::stored(namespace(["instructions"]), "email_agent");

        assert_eq!(
            prompt.resolve(Some(&store)).await.unwrap().unwrap(),
            "## Instructions\n\nWrite good emails."
        );

        store
            .put(
                &namespace(["instructions"]),
                "email_agent",
                json!({"prompt": "Sign off as William."}),
            )
            .await
            .unwrap();
        assert_eq!(
            prompt.resolve(Some(&store)).await.unwrap().unwrap(),
            "## Instructions\n\nSign off as William."
        );
    }

    #[tokio::test]
    async fn test_missing_record_uses_fallback_or_fails() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let prompt = Prompt::stored(namespace(["instructions"]), "twitter_agent");
        assert!(matches!(
            prompt.resolve(Some(&store)).await,
            Err(AgentError::Config(_))
        ));
        assert!(matches!(prompt.resolve(None).await, Err(AgentError::Config(_))));

        let prompt = prompt.or_else("Write fire tweets.");
        assert_eq!(
            prompt.resolve(Some(&store)).await.unwrap().unwrap(),
            "## Instructions\n\nWrite fire tweets."
        );
    }
}
