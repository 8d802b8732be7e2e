//! Error handling for the gateway
//!
//! This module defines the error type used throughout the mediation
//! pipeline. Every stage converts its native failure into a `GatewayError`
//! before it crosses a component boundary.

use std::time::Duration;

use thiserror::Error;

use super::taxonomy::{ErrorCategory, ErrorSeverity, RecoveryAction, recovery_actions};

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// One entry of a fallback chain's attempt history
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Model tried
    pub model: String,
    /// Final error for this model, after its retry budget was exhausted
    pub error: String,
    /// Classified category of that error
    pub category: ErrorCategory,
    /// Retries spent on this model (excluding the initial attempt)
    pub retries: u32,
}

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request shape or field validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid caller identity
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Content failed the safety screen
    #[error("Safety violation: {message}")]
    Safety {
        message: String,
        score: f64,
        reasons: Vec<String>,
    },

    /// Process-wide emergency stop is active
    #[error("Emergency stop activated due to unusual activity")]
    EmergencyStop,

    /// Cooldown or request-quota window exceeded
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after: Duration,
    },

    /// Daily or monthly spend ceiling reached
    #[error("Budget exceeded: {message}")]
    Budget {
        message: String,
        spent: f64,
        limit: f64,
    },

    /// Transport failure reaching the upstream model
    #[error("Network error: {0}")]
    Network(String),

    /// Hard deadline exceeded
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Circuit breaker is open for an execution context
    #[error("Circuit breaker open: {0}")]
    CircuitOpen(String),

    /// Upstream model failure
    #[error("Model error ({model}): {message}")]
    Model { model: String, message: String },

    /// Primary model and every fallback failed
    #[error("All models exhausted after {} attempts", attempts.len())]
    ModelsExhausted { attempts: Vec<AttemptRecord> },

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Classify this error into the taxonomy
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::EmergencyStop => ErrorCategory::Configuration,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::Safety { .. } => ErrorCategory::Safety,
            Self::RateLimit { .. } => ErrorCategory::RateLimit,
            Self::Budget { .. } => ErrorCategory::Budget,
            Self::Network(_) | Self::Http(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::CircuitOpen(_) | Self::Model { .. } | Self::ModelsExhausted { .. } => {
                ErrorCategory::Model
            }
            Self::Serialization(_) => ErrorCategory::Model,
            Self::Internal(_) => ErrorCategory::Unknown,
        }
    }

    /// Severity, used for alerting and log levels
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Budget | ErrorCategory::Configuration => ErrorSeverity::Critical,
            ErrorCategory::Safety => ErrorSeverity::High,
            ErrorCategory::Validation => ErrorSeverity::Low,
            _ => ErrorSeverity::Medium,
        }
    }

    /// Whether the retry machinery may re-attempt this error as-is.
    ///
    /// An open circuit is a model-category error but is never retried
    /// against the same model: the breaker rejects instantly and the
    /// fallback chain moves on. A fully exhausted chain is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::CircuitOpen(_) | Self::ModelsExhausted { .. } => false,
            other => other.category().retryable_by_default(),
        }
    }

    /// Stable machine-readable code, recorded on usage events
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Auth(_) => "AUTH_ERROR",
            Self::Safety { .. } => "SAFETY_VIOLATION",
            Self::EmergencyStop => "EMERGENCY_STOP",
            Self::RateLimit { .. } => "RATE_LIMIT_EXCEEDED",
            Self::Budget { .. } => "BUDGET_EXCEEDED",
            Self::Network(_) | Self::Http(_) => "NETWORK_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::CircuitOpen(_) => "CIRCUIT_OPEN",
            Self::Model { .. } => "MODEL_UNAVAILABLE",
            Self::ModelsExhausted { .. } => "MODELS_EXHAUSTED",
            Self::Serialization(_) => "RESPONSE_PARSE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Non-technical message suitable for end users
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimit { retry_after, .. } => format!(
                "Too many requests. Please wait {} seconds.",
                retry_after.as_secs().max(1)
            ),
            other => other.category().user_message().to_string(),
        }
    }

    /// Prioritized recovery actions for this error
    pub fn recovery_actions(&self) -> Vec<RecoveryAction> {
        recovery_actions(self.category())
    }

    /// Suggested wait before retrying, if the error carries one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Helper constructors
impl GatewayError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth(message.into())
    }

    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    pub fn model<M: Into<String>, S: Into<String>>(model: M, message: S) -> Self {
        Self::Model {
            model: model.into(),
            message: message.into(),
        }
    }

    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Duration) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    pub fn budget<S: Into<String>>(message: S, spent: f64, limit: f64) -> Self {
        Self::Budget {
            message: message.into(),
            spent,
            limit,
        }
    }
}
