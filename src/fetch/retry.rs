//! Retry with exponential backoff for page requests

use crate::error::SiteFetchError;

use std::future::Future;
use std::time::Duration;

/// How often and how patiently a failed page request is repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that gives up on the first failure
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Exponential backoff: `base_delay * 2^attempt` (1s, 2s, 4s, ... by default)
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `attempt_fn` until it succeeds, fails with a non-retryable error,
    /// or `max_retries` retries have been spent.
    ///
    /// Returns the final error on exhaustion.
    pub async fn run<T, F, Fut>(&self, label: &str, mut attempt_fn: F) -> Result<T, SiteFetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SiteFetchError>>,
    {
        let mut attempt = 0u32;
        loop {
            match attempt_fn().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < self.max_retries && e.is_retryable() => {
                    let delay = self.backoff_duration(attempt);
                    attempt += 1;
                    log::warn!(
                        "{label}: attempt {attempt}/{} failed: {e}, retrying in {delay:?}",
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
