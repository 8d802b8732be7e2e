//! Gateway pipeline tests against scripted providers

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::gateway::AiGateway;
use crate::config::GatewayConfig;
use crate::core::audit::MemorySink;
use crate::core::cost::UsageEvent;
use crate::core::provider::{ModelProvider, ProviderResponse};
use crate::core::reliability::{ReliabilityConfig, RetryConfig};
use crate::core::types::{
    ApplicationContext, ChatMessage, MessageRole, RequestConfig, UseCase, user_message,
};
use crate::utils::error::{ErrorCategory, GatewayError, Result};

/// Provider that always answers, counting invocations
struct StaticProvider {
    text: &'static str,
    calls: AtomicU32,
    /// Models that fail instead of answering
    failing: HashSet<&'static str>,
    /// Last message sequence seen
    seen: Mutex<Vec<ChatMessage>>,
}

impl StaticProvider {
    fn new(text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            text,
            calls: AtomicU32::new(0),
            failing: HashSet::new(),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing_for(text: &'static str, failing: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            text,
            calls: AtomicU32::new(0),
            failing: failing.iter().copied().collect(),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProvider for StaticProvider {
    async fn invoke(
        &self,
        model: &str,
        messages: &[ChatMessage],
        _config: &RequestConfig,
    ) -> Result<ProviderResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen.lock() = messages.to_vec();
        if self.failing.contains(model) {
            return Err(GatewayError::model(model, "injected failure"));
        }
        Ok(ProviderResponse {
            text: self.text.to_string(),
            input_tokens: Some(12),
            output_tokens: Some(8),
        })
    }
}

fn fast_reliability() -> ReliabilityConfig {
    ReliabilityConfig {
        retry: RetryConfig {
            max_retries: 0,
            base_delay: Duration::from_millis(1),
            jitter_max: Duration::ZERO,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn gateway_with(
    app: ApplicationContext,
    provider: Arc<dyn ModelProvider>,
    sink: Arc<MemorySink>,
) -> AiGateway {
    AiGateway::new(GatewayConfig::new(app), provider)
        .unwrap()
        .with_sink(sink)
        .with_reliability_config(fast_reliability())
}

#[tokio::test]
async fn test_chat_happy_path() {
    let provider = StaticProvider::new("office opens at eight");
    let sink = Arc::new(MemorySink::new());
    let gateway = gateway_with(ApplicationContext::Staff, provider.clone(), sink.clone());

    let response = gateway
        .chat(vec![user_message("When does the office open?")], None)
        .await;

    assert!(response.success, "{:?}", response.error);
    assert_eq!(response.data.as_deref(), Some("office opens at eight"));
    assert_eq!(response.meta.model, "llama-3.3-70b-instruct-fp8-fast");
    assert_eq!(response.meta.tokens_used, Some(20));
    assert!(response.meta.cost.unwrap() > 0.0);
    assert!(!response.meta.cached);
    assert!(response.meta.safety_score.is_some());

    let events = sink.usage_events();
    assert_eq!(events.len(), 1);
    assert!(events[0].success);
    assert!(!events[0].cache_hit);
    // Safety check plus the interaction itself.
    assert_eq!(sink.audit_records().len(), 2);
    // Audit carries hashes, never raw content.
    let interaction = &sink.audit_records()[1];
    assert_eq!(interaction.outcome, "success");
    assert!(interaction.input_hash.as_ref().unwrap().len() == 64);
}

#[tokio::test]
async fn test_cache_hit_skips_provider_and_cost() {
    let provider = StaticProvider::new("cached answer");
    let sink = Arc::new(MemorySink::new());
    let gateway = gateway_with(ApplicationContext::Staff, provider.clone(), sink.clone());
    let config = RequestConfig {
        model: Some("llama-3.2-1b-instruct".into()),
        ..Default::default()
    };

    let first = gateway
        .chat(vec![user_message("repeat after me")], Some(config.clone()))
        .await;
    assert!(first.success);
    assert!(!first.meta.cached);

    // Clear the model cooldown window before the identical request.
    tokio::time::sleep(Duration::from_millis(60)).await;

    let second = gateway
        .chat(vec![user_message("repeat after me")], Some(config))
        .await;
    assert!(second.success);
    assert!(second.meta.cached);
    assert_eq!(second.meta.cost, Some(0.0));
    assert_eq!(provider.calls(), 1);

    let events = sink.usage_events();
    assert_eq!(events.len(), 2);
    assert!(events[1].cache_hit);
    assert_eq!(events[1].cost, 0.0);
}

#[tokio::test]
async fn test_safety_block_is_terminal_and_audited() {
    let provider = StaticProvider::new("never returned");
    let sink = Arc::new(MemorySink::new());
    let gateway = gateway_with(ApplicationContext::Staff, provider.clone(), sink.clone());

    let response = gateway
        .chat(
            vec![user_message("Patient John Smith SSN 123-45-6789")],
            None,
        )
        .await;

    assert!(!response.success);
    let error = response.error.unwrap();
    assert_eq!(error.code, "SAFETY_VIOLATION");
    assert_eq!(error.category, ErrorCategory::Safety);
    assert!(!error.recoverable);
    assert_eq!(provider.calls(), 0);

    let audits = sink.audit_records();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].outcome, "blocked");
    assert_eq!(audits[0].contains_phi, Some(true));
    // The blocked request still produced a zero-cost usage event.
    let events = sink.usage_events();
    assert_eq!(events.len(), 1);
    assert!(!events[0].success);
    assert_eq!(events[0].cost, 0.0);
    assert_eq!(events[0].error_code.as_deref(), Some("SAFETY_VIOLATION"));
}

#[tokio::test]
async fn test_validation_failure() {
    let provider = StaticProvider::new("unused");
    let sink = Arc::new(MemorySink::new());
    let gateway = gateway_with(ApplicationContext::Staff, provider.clone(), sink);

    let response = gateway.chat(vec![], None).await;
    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, "VALIDATION_ERROR");
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_emergency_stop_rejects_all() {
    let provider = StaticProvider::new("unused");
    let sink = Arc::new(MemorySink::new());
    let gateway = gateway_with(ApplicationContext::Staff, provider.clone(), sink);

    gateway.set_emergency_stop(true);
    let response = gateway.chat(vec![user_message("hello")], None).await;
    assert!(!response.success);
    let error = response.error.unwrap();
    assert_eq!(error.code, "EMERGENCY_STOP");
    assert!(!error.recoverable);
    assert_eq!(provider.calls(), 0);

    gateway.set_emergency_stop(false);
    let response = gateway.chat(vec![user_message("hello")], None).await;
    assert!(response.success);
}

#[tokio::test]
async fn test_budget_rejection_after_recorded_spend() {
    let provider = StaticProvider::new("unused");
    let sink = Arc::new(MemorySink::new());
    let gateway = gateway_with(ApplicationContext::BatchCloseout, provider.clone(), sink);

    // batch-closeout's daily budget is $5.00; preload $4.90 of spend.
    let mut spent = UsageEvent::for_completion(
        ApplicationContext::BatchCloseout,
        "qwq-32b",
        "seed",
        None,
        0,
        0,
        100,
        0,
    );
    spent.cost = 4.90;
    gateway.cost_monitor().record(spent);

    let response = gateway.chat(vec![user_message("close out the day")], None).await;
    assert!(!response.success);
    let error = response.error.unwrap();
    assert_eq!(error.code, "BUDGET_EXCEEDED");
    assert_eq!(error.category, ErrorCategory::Budget);
    assert!(!error.recoverable);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_fallback_serves_and_is_reported() {
    let provider =
        StaticProvider::failing_for("fallback answer", &["llama-3.2-3b-instruct"]);
    let sink = Arc::new(MemorySink::new());
    let gateway = gateway_with(ApplicationContext::Staff, provider.clone(), sink.clone());

    let config = RequestConfig {
        model: Some("llama-3.2-3b-instruct".into()),
        ..Default::default()
    };
    let response = gateway.chat(vec![user_message("hello")], Some(config)).await;

    assert!(response.success);
    // The fallback model actually served the request.
    assert_eq!(response.meta.model, "llama-3.2-1b-instruct");
    assert_eq!(provider.calls(), 2);
    assert_eq!(sink.usage_events()[0].model, "llama-3.2-1b-instruct");
}

#[tokio::test]
async fn test_exhaustion_produces_failed_usage_event() {
    let provider = StaticProvider::failing_for("unused", &["llama-3.2-1b-instruct"]);
    let sink = Arc::new(MemorySink::new());
    let gateway = gateway_with(ApplicationContext::Staff, provider.clone(), sink.clone());

    let config = RequestConfig {
        model: Some("llama-3.2-1b-instruct".into()),
        ..Default::default()
    };
    let response = gateway.chat(vec![user_message("hello")], Some(config)).await;

    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, "MODELS_EXHAUSTED");
    let events = sink.usage_events();
    assert_eq!(events.len(), 1);
    assert!(!events[0].success);
    assert_eq!(events[0].error_code.as_deref(), Some("MODELS_EXHAUSTED"));
}

#[tokio::test]
async fn test_system_prompt_injected_for_context() {
    let provider = StaticProvider::new("answer");
    let sink = Arc::new(MemorySink::new());
    let config = GatewayConfig {
        context: Some(UseCase::PatientCommunication),
        ..GatewayConfig::new(ApplicationContext::AiReceptionist)
    };
    let gateway = AiGateway::new(config, provider.clone())
        .unwrap()
        .with_sink(sink)
        .with_reliability_config(fast_reliability());

    let response = gateway.chat(vec![user_message("hi")], None).await;
    assert!(response.success);

    let seen = provider.seen.lock().clone();
    assert_eq!(seen[0].role, MessageRole::System);
    assert!(seen[0].content.contains("medical assistant"));
    assert_eq!(seen[1].role, MessageRole::User);
}

#[tokio::test]
async fn test_caller_system_prompt_not_overridden() {
    let provider = StaticProvider::new("answer");
    let config = GatewayConfig {
        context: Some(UseCase::PatientCommunication),
        ..GatewayConfig::new(ApplicationContext::AiReceptionist)
    };
    let gateway = AiGateway::new(config, provider.clone())
        .unwrap()
        .with_reliability_config(fast_reliability());

    let messages = vec![
        ChatMessage::new(MessageRole::System, "You speak only in haiku."),
        user_message("hi"),
    ];
    let response = gateway.chat(messages, None).await;
    assert!(response.success);

    let seen = provider.seen.lock().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].content, "You speak only in haiku.");
}

#[tokio::test]
async fn test_usage_stats_reflect_traffic() {
    let provider = StaticProvider::new("answer");
    let sink = Arc::new(MemorySink::new());
    let gateway = gateway_with(ApplicationContext::CallCenterOps, provider, sink);

    let response = gateway.chat(vec![user_message("triage queue status")], None).await;
    assert!(response.success);

    let stats = gateway.get_usage_stats(crate::core::cost::Timeframe::Day);
    assert_eq!(stats.requests, 1);
    assert!(stats.cost > 0.0);
    assert!(stats.remaining_budget < 22.0);
    assert_eq!(stats.top_models[0].model, "llama-3.3-70b-instruct-fp8-fast");
}

#[tokio::test]
async fn test_check_safety_surface() {
    let provider = StaticProvider::new("unused");
    let gateway = gateway_with(
        ApplicationContext::Staff,
        provider,
        Arc::new(MemorySink::new()),
    );

    let clean = gateway.check_safety("When is my next shift?", None, None);
    assert!(clean.data.unwrap().safe);

    let phi = gateway.check_safety("Patient John Smith SSN 123-45-6789", None, None);
    let data = phi.data.unwrap();
    assert!(!data.safe);
    assert!(data.contains_phi);
    assert!(data.reasons.iter().any(|r| r.contains("Social Security")));
}
