//! Chat-completions provider for OpenAI and OpenAI-compatible endpoints
//!
//! Google Gemini models are served through Google's OpenAI-compatible
//! endpoint, so a single provider covers both vendors.

mod conversion;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::retry::{retry_with_backoff, RetryCallback, RetryConfig, RetryInfo};
use super::{ModelProvider, ProviderError};
use crate::model::{Model, ModelResponse, Vendor};
use crate::types::{Message, ToolDefinition};
use conversion::{from_wire_response, to_wire_messages, to_wire_tool, ChatRequest, ChatResponse};

/// Default HTTP timeout for a single request
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat-completions model provider
///
/// ```ignore
/// use teller_core::{Gemini2Flash, O3Mini, OpenAiCompatProvider};
///
/// let worker_llm = OpenAiCompatProvider::from_env(Gemini2Flash)?;
/// let supervisor_llm = OpenAiCompatProvider::from_env(O3Mini)?.with_temperature(1.0);
/// ```
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    vendor: Vendor,
    model_id: String,
    model_name: String,
    max_context_tokens: usize,
    max_output_tokens: usize,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    retry_config: RetryConfig,
    on_retry: Option<RetryCallback>,
}

impl std::fmt::Debug for OpenAiCompatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatProvider")
            .field("model_id", &self.model_id)
            .field("vendor", &self.vendor)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("temperature", &self.temperature)
            .field("retry_config", &self.retry_config)
            .finish()
    }
}

impl OpenAiCompatProvider {
    /// Create a provider with an explicit (possibly absent) API key
    ///
    /// A missing key is not an error here: the first request fails with
    /// [`ProviderError::Authentication`].
    pub fn new(model: impl Model, api_key: Option<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let vendor = model.vendor();
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: vendor.default_base_url().to_string(),
            vendor,
            model_id: model.api_id().to_string(),
            model_name: model.name().to_string(),
            max_context_tokens: model.max_context_tokens(),
            max_output_tokens: model.max_output_tokens(),
            max_tokens: None,
            temperature: None,
            retry_config: RetryConfig::default(),
            on_retry: None,
        })
    }

    /// Create a provider reading the vendor's API key and base URL from the environment
    ///
    /// Uses `OPENAI_API_KEY`/`OPENAI_BASE_URL` or `GOOGLE_API_KEY`/`GOOGLE_BASE_URL`.
    pub fn from_env(model: impl Model) -> Result<Self, ProviderError> {
        let vendor = model.vendor();
        let api_key = std::env::var(vendor.api_key_env()).ok();
        let provider = Self::new(model, api_key)?;
        Ok(match std::env::var(vendor.base_url_env()) {
            Ok(url) if !url.trim().is_empty() => provider.with_base_url(url),
            _ => provider,
        })
    }

    /// Override the API base URL (e.g. a proxy or a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set or replace the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap the number of tokens generated per request
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Configure retry behavior for transient errors
    ///
    /// Default: 8 attempts with exponential backoff starting at 500ms, capped at 30s
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Set the maximum number of attempts for transient errors
    pub fn with_max_retries(mut self, attempts: usize) -> Self {
        self.retry_config.max_attempts = attempts;
        self
    }

    /// Set a callback to be notified when retries occur
    pub fn with_retry_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(RetryInfo) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        system_prompt: Option<&str>,
    ) -> ChatRequest {
        // Google's compatibility layer rejects `name` on messages and expects `max_tokens`
        let is_openai = self.vendor == Vendor::OpenAi;
        ChatRequest {
            model: self.model_id.clone(),
            messages: to_wire_messages(messages, system_prompt, is_openai),
            tools: tools.iter().map(to_wire_tool).collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens.filter(|_| !is_openai),
            max_completion_tokens: self.max_tokens.filter(|_| is_openai),
        }
    }
}

#[async_trait::async_trait]
impl ModelProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn max_context_tokens(&self) -> usize {
        self.max_context_tokens
    }

    fn max_output_tokens(&self) -> usize {
        self.max_output_tokens
    }

    async fn generate(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        system_prompt: Option<String>,
    ) -> Result<ModelResponse, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::Authentication(format!(
                "{} environment variable not set",
                self.vendor.api_key_env()
            ))
        })?;

        let request = self.build_request(&messages, &tools, system_prompt.as_deref());
        let url = format!("{}/chat/completions", self.base_url);

        let response: ChatResponse = retry_with_backoff(
            || post_json(&self.client, &url, api_key, &request),
            &self.retry_config,
            &self.on_retry,
        )
        .await?;

        from_wire_response(response)
    }
}

// ===== HTTP helpers shared with the embeddings client =====

/// POST a JSON body with bearer auth and decode the JSON response
pub(crate) async fn post_json<B, T>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &B,
) -> Result<T, ProviderError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await
        .map_err(classify_reqwest_error)?;

    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Other(format!("Invalid response: {}", e)));
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status.as_u16(), &body))
}

pub(crate) fn classify_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Network(format!("Request timed out: {}", err))
    } else if err.is_connect() {
        ProviderError::Network(format!("Connection failed: {}", err))
    } else if err.is_request() {
        ProviderError::Network(format!("Request failed: {}", err))
    } else if let Some(status) = err.status() {
        classify_status(status.as_u16(), &err.to_string())
    } else {
        ProviderError::Other(err.to_string())
    }
}

/// Map an HTTP error status and body to a [`ProviderError`]
pub(crate) fn classify_status(status: u16, body: &str) -> ProviderError {
    let detail = error_message(body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            body.trim().to_string()
        }
    });

    match status {
        401 | 403 => ProviderError::Authentication(detail),
        429 => ProviderError::RateLimited(detail),
        500..=599 => ProviderError::ServiceUnavailable(detail),
        400 if detail.to_lowercase().contains("context") => ProviderError::Model(detail),
        400 | 404 | 422 => ProviderError::Configuration(detail),
        _ => ProviderError::Other(format!("HTTP {}: {}", status, detail)),
    }
}

/// Extract `error.message` from an error body.
///
/// OpenAI returns `{"error": {...}}`; Google's compatibility layer sometimes
/// wraps the same object in an array.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = match &value {
        serde_json::Value::Array(items) => items.first()?.get("error")?,
        other => other.get("error")?,
    };
    match error {
        serde_json::Value::String(s) => Some(s.clone()),
        other => other
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
    }
}
