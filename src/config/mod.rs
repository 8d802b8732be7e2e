//! Gateway configuration
//!
//! A closed, typed configuration record. Unknown keys fail
//! deserialization instead of being silently ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::safety::ComplianceLevel;
use crate::core::types::{ApplicationContext, UseCase};
use crate::utils::error::{GatewayError, Result};

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Configuration for one gateway instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Calling application; required, drives budget/quota isolation
    pub app: ApplicationContext,
    /// Default use-case tag for model selection and system prompts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<UseCase>,
    /// HIPAA mode; forces strict compliance screening
    #[serde(default = "default_true")]
    pub hipaa_compliant: bool,
    /// Default model when a request specifies none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Default per-request deadline, in milliseconds on the wire
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub enable_usage_monitoring: bool,
    #[serde(default = "default_true")]
    pub enable_safety_filtering: bool,
    #[serde(default = "default_true")]
    pub enable_rate_limiting: bool,
    #[serde(default = "default_true")]
    pub enable_audit_logging: bool,
    /// Production mode suppresses technical error detail in responses
    #[serde(default = "default_true")]
    pub production: bool,
    /// Optional caller attribution recorded on usage events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl GatewayConfig {
    /// Configuration with defaults for one application
    pub fn new(app: ApplicationContext) -> Self {
        Self {
            app,
            context: None,
            hipaa_compliant: true,
            default_model: None,
            default_timeout_ms: default_timeout_ms(),
            enable_usage_monitoring: true,
            enable_safety_filtering: true,
            enable_rate_limiting: true,
            enable_audit_logging: true,
            production: true,
            user_id: None,
        }
    }

    /// Reject internally inconsistent configuration
    pub fn validate(&self) -> Result<()> {
        if self.hipaa_compliant && !self.enable_safety_filtering {
            return Err(GatewayError::config(
                "safety filtering is required when HIPAA compliance is enabled",
            ));
        }
        if self.default_timeout_ms == 0 {
            return Err(GatewayError::config("default timeout must be positive"));
        }
        Ok(())
    }

    /// Screening level implied by the HIPAA flag
    pub fn compliance_level(&self) -> ComplianceLevel {
        if !self.enable_safety_filtering {
            ComplianceLevel::None
        } else if self.hipaa_compliant {
            ComplianceLevel::Strict
        } else {
            ComplianceLevel::Standard
        }
    }

    /// Default per-request deadline
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}
