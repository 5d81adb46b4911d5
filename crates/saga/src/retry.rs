//! Retry execution for transient downstream faults.

use std::future::Future;

use tokio::time::sleep;

use crate::config::RetryConfig;
use crate::error::TransferError;

/// Re-invokes fallible downstream operations under a transient-fault policy.
///
/// An operation is retried only when it fails with a transport status in
/// the transient set ({429, 502, 503, 504}); any other failure aborts
/// immediately. Between attempts the executor waits
/// `base_delay_ms * attempt_number` (linear backoff, attempts numbered
/// from 1).
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Creates an executor with the given policy.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Returns the configured policy.
    pub fn config(&self) -> RetryConfig {
        self.config
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable
    /// error, or exhausts the attempt budget.
    ///
    /// Both failure outcomes surface as [`TransferError::Integration`]
    /// wrapping `description` and the last observed failure.
    pub async fn run<T, F, Fut>(
        &self,
        description: &str,
        mut operation: F,
    ) -> Result<T, TransferError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransferError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                    let delay = self.config.delay_after(attempt);
                    tracing::warn!(
                        description,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) if err.is_retryable() => {
                    return Err(TransferError::integration(
                        format!("{description}: retry budget exhausted after {attempt} attempts"),
                        err,
                    ));
                }
                Err(err) => return Err(TransferError::integration(description, err)),
            }
        }
    }
}
