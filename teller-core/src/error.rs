//! Top-level error types for teller
//!
//! This module flattens the per-layer error hierarchy into the categories a
//! caller acts on.

use thiserror::Error;

use crate::agent::AgentError;
use crate::checkpoint::CheckpointError;
use crate::embed::EmbedError;
use crate::optimizer::OptimizerError;
use crate::provider::ProviderError;
use crate::store::StoreError;
use crate::tool::ToolError;

/// Top-level error type for teller operations
///
/// - [`Error::Auth`] - Fix credentials and retry
/// - [`Error::RateLimited`] - Back off and retry
/// - [`Error::Network`] - Check connectivity, retry
/// - [`Error::Unavailable`] - Service is down, wait and retry
/// - [`Error::Model`] - Model-side issues (content filtered, recursion limit)
/// - [`Error::Tool`] - Tool execution failed
/// - [`Error::Store`] - Memory store failure
/// - [`Error::Checkpoint`] - Conversation persistence failure
/// - [`Error::Config`] - Fix configuration (missing thread id, bad model spec)
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication failed (missing, invalid or expired credentials)
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rate limited - slow down requests
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Network connectivity issue
    #[error("network error: {0}")]
    Network(String),

    /// Service temporarily unavailable
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Model error (content filtered, empty response, recursion limit, etc.)
    #[error("model error: {0}")]
    Model(String),

    /// Tool execution failed
    #[error("tool error: {0}")]
    Tool(String),

    /// Memory store error
    #[error("store error: {0}")]
    Store(String),

    /// Checkpoint error
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns true if this is an authentication error
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Returns true if this is a rate limiting error
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Returns true if this is a network error
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Returns true if the service is unavailable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Returns true if this is a model error
    pub fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    /// Returns true if this is a tool error
    pub fn is_tool(&self) -> bool {
        matches!(self, Self::Tool(_))
    }

    /// Returns true if this is a store error
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns true if this is a checkpoint error
    pub fn is_checkpoint(&self) -> bool {
        matches!(self, Self::Checkpoint(_))
    }

    /// Returns true if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this error is potentially retryable
    ///
    /// Authentication and configuration errors are not retryable without
    /// user intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::Network(_) | Self::Unavailable(_)
        )
    }
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Authentication(msg) => Self::Auth(msg),
            ProviderError::RateLimited(msg) => Self::RateLimited(msg),
            ProviderError::Network(msg) => Self::Network(msg),
            ProviderError::ServiceUnavailable(msg) => Self::Unavailable(msg),
            ProviderError::Model(msg) => Self::Model(msg),
            ProviderError::Configuration(msg) => Self::Config(msg),
            ProviderError::Other(msg) => Self::Other(msg),
        }
    }
}

impl From<ToolError> for Error {
    fn from(err: ToolError) -> Self {
        Self::Tool(err.to_string())
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<CheckpointError> for Error {
    fn from(err: CheckpointError) -> Self {
        Self::Checkpoint(err.to_string())
    }
}

impl From<EmbedError> for Error {
    fn from(err: EmbedError) -> Self {
        match err {
            EmbedError::Provider(e) => e.into(),
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<OptimizerError> for Error {
    fn from(err: OptimizerError) -> Self {
        match err {
            OptimizerError::Provider(e) => e.into(),
            other => Self::Model(other.to_string()),
        }
    }
}

impl From<AgentError> for Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Provider(e) => e.into(),
            AgentError::Tool(e) => e.into(),
            AgentError::Store(e) => e.into(),
            AgentError::Checkpoint(e) => e.into(),
            AgentError::NoResponse => Self::Model("model returned no response".to_string()),
            AgentError::EmptyResponse => Self::Model("model returned empty response".to_string()),
            AgentError::MaxTokensExceeded => Self::Model(
                "response exceeded maximum token limit - try asking the model to be more concise"
                    .to_string(),
            ),
            AgentError::ContentFiltered => {
                Self::Model("response was filtered by content moderation".to_string())
            }
            AgentError::ToolNotFound(name) => Self::Tool(format!("not found: {}", name)),
            AgentError::InvalidToolInput(msg) => Self::Tool(format!("invalid input: {}", msg)),
            AgentError::RecursionLimit(limit) => {
                Self::Model(format!("recursion limit of {} model calls reached", limit))
            }
            AgentError::UnexpectedStopReason(reason) => {
                Self::Model(format!("unexpected stop reason: {}", reason))
            }
            AgentError::Config(msg) => Self::Config(msg),
        }
    }
}

/// Result type for teller operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(Error::RateLimited("slow down".into()).is_retryable());
        assert!(Error::Network("connection refused".into()).is_retryable());
        assert!(Error::Unavailable("503".into()).is_retryable());

        assert!(!Error::Auth("invalid key".into()).is_retryable());
        assert!(!Error::Config("missing thread id".into()).is_retryable());
        assert!(!Error::Store("empty namespace".into()).is_retryable());
    }

    #[test]
    fn test_from_provider_error() {
        let err: Error = ProviderError::Authentication("OPENAI_API_KEY is not set".into()).into();
        assert!(err.is_auth());

        let err: Error = ProviderError::RateLimited("throttled".into()).into();
        assert!(err.is_rate_limited());

        let err: Error = ProviderError::Configuration("unknown model".into()).into();
        assert!(err.is_config());

        let err: Error = ProviderError::ServiceUnavailable("502 Bad Gateway".into()).into();
        assert!(err.is_unavailable());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_agent_error() {
        let err: Error = AgentError::RecursionLimit(25).into();
        assert!(err.is_model());
        assert!(err.to_string().contains("25"));

        let err: Error = AgentError::ToolNotFound("transfer_to_nobody".into()).into();
        assert!(err.is_tool());

        let err: Error = AgentError::Provider(ProviderError::Network("reset".into())).into();
        assert!(err.is_network());

        let err: Error = AgentError::Store(StoreError::InvalidNamespace("empty".into())).into();
        assert!(err.is_store());

        let err: Error = AgentError::Config("no prompt".into()).into();
        assert!(err.is_config());
    }

    #[test]
    fn test_from_checkpoint_error() {
        let err: Error = CheckpointError::Storage("disk full".into()).into();
        assert!(err.is_checkpoint());
    }
}
