//! End-to-end pipeline behavior under concurrency

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use medigate::{
    AiGateway, ApplicationContext, ChatMessage, GatewayConfig, MemorySink, ModelProvider,
    ProviderResponse, ReliabilityConfig, RequestConfig, Result, RetryConfig, Timeframe,
    user_message,
};

/// Provider that answers after a short delay, counting invocations
struct SlowProvider {
    calls: AtomicU32,
    delay: Duration,
}

#[async_trait]
impl ModelProvider for SlowProvider {
    async fn invoke(
        &self,
        _model: &str,
        _messages: &[ChatMessage],
        _config: &RequestConfig,
    ) -> Result<ProviderResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(ProviderResponse {
            text: "pong".to_string(),
            input_tokens: Some(4),
            output_tokens: Some(2),
        })
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
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

#[tokio::test]
async fn test_concurrent_requests_share_one_ledger() {
    init_tracing();
    let provider = Arc::new(SlowProvider {
        calls: AtomicU32::new(0),
        delay: Duration::from_millis(5),
    });
    let sink = Arc::new(MemorySink::new());
    let config = GatewayConfig {
        // Rate limiting off so distinct prompts can dispatch back-to-back
        // against the same model.
        enable_rate_limiting: false,
        ..GatewayConfig::new(ApplicationContext::CallCenterOps)
    };
    let gateway = Arc::new(
        AiGateway::new(config, provider.clone())
            .unwrap()
            .with_sink(sink.clone())
            .with_reliability_config(fast_reliability()),
    );

    let mut handles = Vec::new();
    for index in 0..5 {
        let gateway = Arc::clone(&gateway);
        handles.push(tokio::spawn(async move {
            gateway
                .chat(vec![user_message(format!("queue status {index}"))], None)
                .await
        }));
    }
    for handle in handles {
        let response = handle.await.unwrap();
        assert!(response.success, "{:?}", response.error);
    }

    assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
    assert_eq!(sink.usage_events().len(), 5);
    let stats = gateway.get_usage_stats(Timeframe::Day);
    assert_eq!(stats.requests, 5);
    assert!(stats.cost > 0.0);
}

#[tokio::test]
async fn test_concurrent_identical_misses_both_dispatch() {
    // There is no single-flight de-duplication: two identical requests that
    // both miss the cache both reach the provider.
    let provider = Arc::new(SlowProvider {
        calls: AtomicU32::new(0),
        delay: Duration::from_millis(50),
    });
    let config = GatewayConfig {
        enable_rate_limiting: false,
        ..GatewayConfig::new(ApplicationContext::Handouts)
    };
    let gateway = Arc::new(
        AiGateway::new(config, provider.clone())
            .unwrap()
            .with_reliability_config(fast_reliability()),
    );

    let a = {
        let gateway = Arc::clone(&gateway);
        tokio::spawn(
            async move { gateway.chat(vec![user_message("eczema handout")], None).await },
        )
    };
    let b = {
        let gateway = Arc::clone(&gateway);
        tokio::spawn(
            async move { gateway.chat(vec![user_message("eczema handout")], None).await },
        )
    };
    assert!(a.await.unwrap().success);
    assert!(b.await.unwrap().success);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

    // A third, later request hits the cache.
    let third = gateway.chat(vec![user_message("eczema handout")], None).await;
    assert!(third.success);
    assert!(third.meta.cached);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_gateways_isolate_application_budgets() {
    let provider = Arc::new(SlowProvider {
        calls: AtomicU32::new(0),
        delay: Duration::from_millis(1),
    });
    let staffing = AiGateway::new(
        GatewayConfig::new(ApplicationContext::ClinicalStaffing),
        provider.clone(),
    )
    .unwrap()
    .with_reliability_config(fast_reliability());
    let inventory = AiGateway::new(
        GatewayConfig::new(ApplicationContext::Inventory),
        provider.clone(),
    )
    .unwrap()
    .with_reliability_config(fast_reliability());

    let response = staffing.chat(vec![user_message("coverage for friday")], None).await;
    assert!(response.success);

    // Spend on one app does not appear in the other's ledger.
    assert_eq!(staffing.get_usage_stats(Timeframe::Day).requests, 1);
    assert_eq!(inventory.get_usage_stats(Timeframe::Day).requests, 0);
}
