//! Retry with exponential backoff and jitter

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::utils::error::GatewayError;

/// Decides whether an error may be re-attempted as-is
pub type RetryPredicate = Arc<dyn Fn(&GatewayError) -> bool + Send + Sync>;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum retries after the initial attempt
    pub max_retries: u32,
    /// Base delay before the first retry
    pub base_delay: Duration,
    /// Multiplier applied per attempt
    pub exponential_base: f64,
    /// Ceiling for any single delay
    pub max_delay: Duration,
    /// Upper bound of the uniform jitter added to each delay
    pub jitter_max: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            exponential_base: 2.0,
            max_delay: Duration::from_secs(30),
            jitter_max: Duration::from_millis(250),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (zero-based):
    /// `min(max_delay, base * exponential_base^attempt + uniform(0, jitter_max))`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let raw = self.base_delay.as_millis() as f64 * self.exponential_base.powi(attempt as i32);
        let jitter = if self.jitter_max.is_zero() {
            0.0
        } else {
            rand::thread_rng().gen_range(0.0..self.jitter_max.as_millis() as f64)
        };
        let capped = (raw + jitter).min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Default retryability: defer to the error taxonomy
pub fn default_retry_predicate() -> RetryPredicate {
    Arc::new(|error: &GatewayError| error.is_retryable())
}
