//! Retry with exponential backoff for model and embedding calls
//!
//! Transient failures (rate limiting, 5xx, network) are retried; everything
//! else is returned to the caller on the first failure.

use super::ProviderError;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Configuration for retry behavior on transient errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts including the first (default: 8)
    pub max_attempts: usize,
    /// Base delay in milliseconds for exponential backoff (default: 500ms)
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds (default: 30000ms)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryConfig {
    /// A single attempt with no retries
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Information about a retry attempt
#[derive(Debug, Clone)]
pub struct RetryInfo {
    /// Which attempt just failed (1-based)
    pub attempt: usize,
    /// Maximum attempts configured
    pub max_attempts: usize,
    /// How long we'll wait before retrying
    pub delay: Duration,
    /// The error that triggered the retry
    pub error: String,
}

/// Callback type for retry events
pub type RetryCallback = Arc<dyn Fn(RetryInfo) + Send + Sync>;

/// Determine if an error is transient and should be retried
pub fn is_retryable_error(err: &ProviderError) -> bool {
    matches!(
        err,
        ProviderError::RateLimited(_)
            | ProviderError::ServiceUnavailable(_)
            | ProviderError::Network(_)
    )
}

/// Backoff delay for a given attempt: `base * 2^(attempt-1)`, capped, ±20% jitter
pub fn backoff_delay(attempt: usize, config: &RetryConfig) -> Duration {
    let shift = (attempt.saturating_sub(1)).min(10) as u32;
    let exp = 1_u64.checked_shl(shift).unwrap_or(u64::MAX);
    let capped = config
        .base_delay_ms
        .saturating_mul(exp)
        .min(config.max_delay_ms);
    Duration::from_millis(jitter_ms(capped))
}

fn jitter_ms(base_ms: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as i64;
    let jitter_pct = (nanos % 41) - 20;
    let base = base_ms as i64;
    (base + (base * jitter_pct / 100)).max(0) as u64
}

/// Retry an async operation with exponential backoff
///
/// ```ignore
/// let body = retry_with_backoff(
///     || async { self.send(&request).await },
///     &self.retry_config,
///     &self.on_retry,
/// )
/// .await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T>(
    mut op: F,
    config: &RetryConfig,
    on_retry: &Option<RetryCallback>,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let err = match op().await {
            Ok(result) => return Ok(result),
            Err(err) => err,
        };

        if attempt >= config.max_attempts || !is_retryable_error(&err) {
            return Err(err);
        }

        let delay = backoff_delay(attempt, config);
        log::debug!(
            "attempt {}/{} failed, retrying in {:?}: {}",
            attempt,
            config.max_attempts,
            delay,
            err
        );
        if let Some(callback) = on_retry {
            callback(RetryInfo {
                attempt,
                max_attempts: config.max_attempts,
                delay,
                error: err.to_string(),
            });
        }

        tokio::time::sleep(delay).await;
    }
}
