use insight_core::{CoreError, CrawlSettings, ErrorExt};
use std::time::Duration;
use tracing::debug;

/// Configuration for the search block retry.
///
/// Only the first page of a keyword's search is retried, and only after a
/// block response. Later pages give up immediately so a server that has
/// started rejecting us is not hit again.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries allowed on the first page after a block response
    pub max_block_retries: u32,
    /// Fixed wait before a retry
    pub block_retry_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_block_retries: 1,
            block_retry_delay: Duration::from_secs(5),
        }
    }
}

impl From<&CrawlSettings> for RetryConfig {
    fn from(settings: &CrawlSettings) -> Self {
        Self {
            block_retry_delay: Duration::from_millis(settings.block_retry_delay_ms),
            ..Self::default()
        }
    }
}

/// Retry strategy based on error type
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Wait, then issue the same request again
    RetryWithDelay(Duration),
    /// Give up on this request
    NoRetry,
}

/// Determine retry strategy based on error type alone
pub fn get_retry_strategy(error: &CoreError) -> RetryStrategy {
    if error.is_retryable() {
        RetryStrategy::RetryWithDelay(error.retry_after().unwrap_or(Duration::from_secs(5)))
    } else {
        RetryStrategy::NoRetry
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockRetryPolicy {
    config: RetryConfig,
}

impl BlockRetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Decide what to do after `error` on search page `page` (1-based),
    /// given how many retries this keyword has already used.
    pub fn decide(&self, page: u32, retries_used: u32, error: &CoreError) -> RetryStrategy {
        if page != 1 || retries_used >= self.config.max_block_retries {
            debug!(
                "No retry: page {}, {} of {} retries used",
                page, retries_used, self.config.max_block_retries
            );
            return RetryStrategy::NoRetry;
        }

        match get_retry_strategy(error) {
            RetryStrategy::RetryWithDelay(_) => {
                RetryStrategy::RetryWithDelay(self.config.block_retry_delay)
            }
            RetryStrategy::NoRetry => RetryStrategy::NoRetry,
        }
    }
}
