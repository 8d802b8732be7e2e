//! Gateway response types
//!
//! `AiResponse` is the single surface callers see: exactly one of the
//! success/error branches is populated, enforced by the constructors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::error::{ErrorCategory, ErrorSeverity, GatewayError, RecoveryAction};

/// Metadata attached to every response, success or failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    /// Model actually used (may differ from the requested model if a
    /// fallback served the request)
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<f64>,
    /// True when the payload came from the response cache
    #[serde(default)]
    pub cached: bool,
}

/// Classified error descriptor on the failure branch
#[derive(Debug, Clone, Serialize)]
pub struct ResponseError {
    pub code: String,
    pub message: String,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    pub recovery_actions: Vec<RecoveryAction>,
    /// Technical detail; attached only outside production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ResponseError {
    /// Build the user-facing descriptor for a classified error.
    ///
    /// `include_details` controls whether the technical message is exposed;
    /// production deployments keep it off.
    pub fn from_error(error: &GatewayError, include_details: bool) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.user_message(),
            category: error.category(),
            severity: error.severity(),
            recoverable: error.is_retryable(),
            retry_after_ms: error.retry_after().map(|d| d.as_millis() as u64),
            recovery_actions: error.recovery_actions(),
            details: include_details.then(|| error.to_string()),
        }
    }
}

/// Response returned from `chat`
#[derive(Debug, Clone, Serialize)]
pub struct AiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
    pub meta: ResponseMeta,
}

impl AiResponse {
    /// Successful response carrying a text payload
    pub fn ok(data: String, meta: ResponseMeta) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta,
        }
    }

    /// Failed response carrying a classified error and no payload
    pub fn err(error: ResponseError, meta: ResponseMeta) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            meta,
        }
    }
}

/// Result payload of a standalone safety check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyCheckData {
    pub safe: bool,
    pub score: f64,
    pub contains_phi: bool,
    pub reasons: Vec<String>,
}

/// Response of the `check_safety` surface
#[derive(Debug, Clone, Serialize)]
pub struct SafetyCheckResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SafetyCheckData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}
