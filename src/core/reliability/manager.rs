//! Reliability manager
//!
//! Wraps one logical upstream call with timeout, retry, a per-model
//! circuit breaker, and the model's ordered fallback chain. Retries and
//! the breaker apply independently per model; when a model's retry budget
//! is exhausted the next fallback is tried.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, warn};

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use super::retry::{RetryConfig, RetryPredicate, default_retry_predicate};
use crate::core::registry::{ModelConfig, model_config};
use crate::utils::error::{AttemptRecord, GatewayError, Result};

/// Reliability configuration
#[derive(Debug, Clone)]
pub struct ReliabilityConfig {
    pub retry: RetryConfig,
    pub breaker: CircuitBreakerConfig,
    /// Hard wall-clock deadline per attempt
    pub timeout: Duration,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            breaker: CircuitBreakerConfig::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Successful execution plus how it was achieved
#[derive(Debug, Clone)]
pub struct ReliableOutcome<T> {
    pub value: T,
    /// Model that actually served the request
    pub model_used: String,
    /// Total attempts across all models, retries included
    pub attempts: u32,
    pub used_fallback: bool,
    pub latency: Duration,
}

/// Retry + circuit breaker + fallback around one outbound call
pub struct ReliabilityManager {
    config: ReliabilityConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    predicate: RetryPredicate,
}

impl ReliabilityManager {
    pub fn new(config: ReliabilityConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
            predicate: default_retry_predicate(),
        }
    }

    /// Replace the retryability predicate
    pub fn with_predicate(mut self, predicate: RetryPredicate) -> Self {
        self.predicate = predicate;
        self
    }

    /// Breaker for an execution context, created on first use
    pub fn breaker(&self, context: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(context.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(context, self.config.breaker.clone()))
            })
            .clone()
    }

    /// Execute `op` against the primary model, falling back through its
    /// declared chain. Each model gets its own retry budget and breaker.
    /// Exhaustion surfaces the full attempt history.
    pub async fn execute<T, F, Fut>(
        &self,
        primary: &ModelConfig,
        timeout_override: Option<Duration>,
        op: F,
    ) -> Result<ReliableOutcome<T>>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let timeout = timeout_override.unwrap_or(self.config.timeout);
        let started = Instant::now();

        let mut chain: Vec<&'static ModelConfig> = Vec::with_capacity(1 + primary.fallbacks.len());
        if let Some(config) = model_config(primary.model) {
            chain.push(config);
        }
        for fallback in primary.fallbacks {
            if let Some(config) = model_config(fallback) {
                chain.push(config);
            }
        }

        let mut history: Vec<AttemptRecord> = Vec::new();
        let mut total_attempts = 0u32;

        for (index, model) in chain.iter().enumerate() {
            match self
                .execute_single(model.model, timeout, &op, &mut total_attempts)
                .await
            {
                Ok(value) => {
                    if index > 0 {
                        debug!(
                            primary = primary.model,
                            served_by = model.model,
                            "request served by fallback model"
                        );
                    }
                    return Ok(ReliableOutcome {
                        value,
                        model_used: model.model.to_string(),
                        attempts: total_attempts,
                        used_fallback: index > 0,
                        latency: started.elapsed(),
                    });
                }
                Err((error, retries)) => {
                    warn!(
                        model = model.model,
                        retries,
                        error = %error,
                        "model failed, moving to next fallback"
                    );
                    history.push(AttemptRecord {
                        model: model.model.to_string(),
                        error: error.to_string(),
                        category: error.category(),
                        retries,
                    });
                }
            }
        }

        Err(GatewayError::ModelsExhausted { attempts: history })
    }

    /// Run the retry loop for one model. Returns the final error and the
    /// number of retries spent on failure.
    async fn execute_single<T, F, Fut>(
        &self,
        model: &str,
        timeout: Duration,
        op: &F,
        total_attempts: &mut u32,
    ) -> std::result::Result<T, (GatewayError, u32)>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let breaker = self.breaker(model);
        let mut retries = 0u32;
        loop {
            if let Err(error) = breaker.try_acquire() {
                return Err((error, retries));
            }
            *total_attempts += 1;

            let error = match tokio::time::timeout(timeout, op(model.to_string())).await {
                Ok(Ok(value)) => {
                    breaker.on_success();
                    return Ok(value);
                }
                Ok(Err(error)) => error,
                Err(_) => {
                    GatewayError::timeout(format!("attempt timed out after {}ms", timeout.as_millis()))
                }
            };
            breaker.on_failure();

            if !(self.predicate)(&error) || retries >= self.config.retry.max_retries {
                return Err((error, retries));
            }
            let delay = self.config.retry.backoff_delay(retries);
            debug!(model, retries, ?delay, error = %error, "retrying after backoff");
            retries += 1;
            tokio::time::sleep(delay).await;
        }
    }

    /// Drop all breaker state
    pub fn reset(&self) {
        self.breakers.clear();
    }
}

impl Default for ReliabilityManager {
    fn default() -> Self {
        Self::new(ReliabilityConfig::default())
    }
}
