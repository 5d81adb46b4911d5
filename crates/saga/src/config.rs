//! Retry policy configuration.

use std::time::Duration;

/// Default attempt budget per downstream operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base backoff delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;

/// Retry policy for downstream inventory operations.
///
/// [`RetryConfig::from_env`] reads from environment variables:
/// - `TRANSFER_MAX_RETRY_ATTEMPTS` — attempt budget (default: `3`)
/// - `TRANSFER_RETRY_BASE_DELAY_MS` — base backoff in milliseconds (default: `500`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl RetryConfig {
    /// Creates a retry policy with explicit values.
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
        }
    }

    /// Loads the policy from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            max_attempts: std::env::var("TRANSFER_MAX_RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            base_delay_ms: std::env::var("TRANSFER_RETRY_BASE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BASE_DELAY_MS),
        }
    }

    /// Backoff to wait after the given failed attempt (1-based): linear in
    /// the attempt number.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms * u64::from(attempt))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
        }
    }
}
