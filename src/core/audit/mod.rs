//! Usage and audit emission
//!
//! The persistence layer is an opaque, append-only collaborator behind
//! `AuditSink`. Audit records carry sha256 hashes of request/response
//! content, never the raw text, so PHI is not persisted in clear form.
//! Sink failures are swallowed by implementations; logging must never
//! break a request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::core::cost::UsageEvent;
use crate::core::types::ApplicationContext;

/// sha256 hex digest of content, for audit trails
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Auditable pipeline actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    SafetyCheck,
    Interaction,
}

/// One audit-trail entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub app: ApplicationContext,
    pub action: AuditAction,
    /// "passed", "blocked", "success", "error"
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains_phi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

/// Append-only sink for usage events and audit records
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record_usage(&self, event: &UsageEvent);
    async fn record_audit(&self, record: &AuditRecord);
}

/// Default sink: structured log lines
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl AuditSink for TracingSink {
    async fn record_usage(&self, event: &UsageEvent) {
        info!(
            request_id = %event.request_id,
            app = %event.app,
            model = %event.model,
            input_tokens = event.input_tokens,
            output_tokens = event.output_tokens,
            cost = event.cost,
            cache_hit = event.cache_hit,
            success = event.success,
            error_code = event.error_code.as_deref().unwrap_or("-"),
            "usage event"
        );
    }

    async fn record_audit(&self, record: &AuditRecord) {
        info!(
            request_id = %record.request_id,
            app = %record.app,
            action = ?record.action,
            outcome = %record.outcome,
            model = record.model.as_deref().unwrap_or("-"),
            "audit record"
        );
    }
}

/// In-memory sink for tests and local inspection
#[derive(Debug, Default)]
pub struct MemorySink {
    usage: Mutex<Vec<UsageEvent>>,
    audit: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn usage_events(&self) -> Vec<UsageEvent> {
        self.usage.lock().clone()
    }

    pub fn audit_records(&self) -> Vec<AuditRecord> {
        self.audit.lock().clone()
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn record_usage(&self, event: &UsageEvent) {
        self.usage.lock().push(event.clone());
    }

    async fn record_audit(&self, record: &AuditRecord) {
        self.audit.lock().push(record.clone());
    }
}
