//! Upstream model invocation
//!
//! The inference endpoint is an opaque asynchronous RPC behind the
//! `ModelProvider` trait. The gateway only assumes it can fail
//! (network/5xx/timeout) and that its output length drives cost.

mod workers_ai;

use async_trait::async_trait;

use crate::core::types::{ChatMessage, RequestConfig};
use crate::utils::error::Result;

pub use workers_ai::{WorkersAiConfig, WorkersAiProvider};

/// Raw upstream completion plus token counts when the endpoint reports them
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

/// Seam to the hosted model pool
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Invoke one model with an ordered message sequence
    async fn invoke(
        &self,
        model: &str,
        messages: &[ChatMessage],
        config: &RequestConfig,
    ) -> Result<ProviderResponse>;
}
