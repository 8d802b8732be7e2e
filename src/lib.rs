//! # Medigate
//!
//! An AI request mediation gateway for healthcare workloads. Sits between
//! application code and a shared pool of hosted language models, enforcing
//! per-application budgets, HIPAA-oriented content safety, reliability
//! (retry, circuit breaking, model fallback), and response caching under
//! concurrent, cost-sensitive load.
//!
//! ## Pipeline
//!
//! Every request runs the same strictly ordered stages: validate, select a
//! model, admission checks (emergency stop, cooldown, budget projection),
//! safety screening, cache lookup, reliability-managed dispatch, then
//! usage/audit emission.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use medigate::{
//!     AiGateway, ApplicationContext, GatewayConfig, WorkersAiConfig, WorkersAiProvider,
//!     user_message,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = WorkersAiProvider::new(WorkersAiConfig::new("account-id", "api-token"))?;
//!     let gateway = AiGateway::new(
//!         GatewayConfig::new(ApplicationContext::CheckinKiosk),
//!         Arc::new(provider),
//!     )?;
//!
//!     let response = gateway
//!         .chat(vec![user_message("What should I bring to my appointment?")], None)
//!         .await;
//!     if response.success {
//!         println!("{}", response.data.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod utils;

// Re-export the main surface
pub use config::GatewayConfig;
pub use core::audit::{AuditAction, AuditRecord, AuditSink, MemorySink, TracingSink, content_hash};
pub use core::cache::{CacheConfig, CacheStats, EvictionPolicy, ResponseCache};
pub use core::cost::{
    BudgetHealth, BudgetStatus, BudgetWindow, CostMonitor, Timeframe, UsageEvent, UsageStats,
};
pub use core::gateway::AiGateway;
pub use core::provider::{ModelProvider, ProviderResponse, WorkersAiConfig, WorkersAiProvider};
pub use core::registry::{AppRateLimits, ModelConfig, ModelTier, app_rate_limits, model_config};
pub use core::reliability::{
    CircuitBreakerConfig, CircuitState, ReliabilityConfig, RetryConfig,
};
pub use core::safety::{ComplianceLevel, SafetyAssessment, SafetyCategory, SafetyFilter};
pub use core::types::{
    AiResponse, ApplicationContext, ChatMessage, MessageRole, RequestConfig, ResponseMeta,
    SafetyCheckResponse, UseCase, assistant_message, system_message, user_message,
};
pub use utils::error::{ErrorCategory, ErrorSeverity, GatewayError, Result};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(NAME, "medigate");
    }
}
