//! The mediation core
//!
//! Per request, stages run strictly in order: validate, select model,
//! admission checks, safety screen, cache lookup, reliability-managed
//! dispatch, then cache store and usage/audit emission. Every failure is
//! classified through the taxonomy before a caller sees it; `chat` never
//! surfaces a raw transport error.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::validation::validate_request;
use crate::config::GatewayConfig;
use crate::core::audit::{AuditAction, AuditRecord, AuditSink, TracingSink, content_hash};
use crate::core::cache::{CacheConfig, ResponseCache, chat_key, default_ttl_for, EntryMetadata};
use crate::core::cost::{
    BudgetStatus, BudgetWindow, CostMonitor, Timeframe, UsageEvent, UsageStats, estimate_tokens,
};
use crate::core::provider::ModelProvider;
use crate::core::registry::{ModelConfig, select_model, system_prompt};
use crate::core::reliability::{ReliabilityConfig, ReliabilityManager};
use crate::core::safety::{ComplianceLevel, SafetyFilter};
use crate::core::types::{
    AiResponse, ChatMessage, MessageRole, RequestConfig, ResponseError, ResponseMeta,
    SafetyCheckData, SafetyCheckResponse, UseCase, system_message,
};
use crate::utils::error::{GatewayError, Result};

/// AI request mediation gateway. One instance owns all shared mutable
/// state (ledger, breakers, cache, emergency stop); construct isolated
/// instances in tests.
pub struct AiGateway {
    config: GatewayConfig,
    provider: Arc<dyn ModelProvider>,
    sink: Arc<dyn AuditSink>,
    safety: SafetyFilter,
    cache: ResponseCache,
    cost: CostMonitor,
    reliability: ReliabilityManager,
}

impl AiGateway {
    /// Create a gateway over an upstream provider
    pub fn new(config: GatewayConfig, provider: Arc<dyn ModelProvider>) -> Result<Self> {
        config.validate()?;
        let safety = SafetyFilter::new(config.compliance_level());
        Ok(Self {
            config,
            provider,
            sink: Arc::new(TracingSink),
            safety,
            cache: ResponseCache::new(CacheConfig::default()),
            cost: CostMonitor::new(),
            reliability: ReliabilityManager::default(),
        })
    }

    /// Replace the usage/audit sink
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the response cache configuration
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = ResponseCache::new(config);
        self
    }

    /// Replace the reliability configuration
    pub fn with_reliability_config(mut self, config: ReliabilityConfig) -> Self {
        self.reliability = ReliabilityManager::new(config);
        self
    }

    /// Main chat surface. Always returns an `AiResponse`; terminal
    /// failures are synthesized into the error branch and still produce a
    /// zero-cost usage event so budget accounting stays accurate.
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        config: Option<RequestConfig>,
    ) -> AiResponse {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        match self
            .chat_inner(&messages, config.as_ref(), &request_id, started)
            .await
        {
            Ok(response) => response,
            Err(error) => {
                self.failure_response(config.as_ref(), error, &request_id, started)
                    .await
            }
        }
    }

    async fn chat_inner(
        &self,
        messages: &[ChatMessage],
        config: Option<&RequestConfig>,
        request_id: &str,
        started: Instant,
    ) -> Result<AiResponse> {
        validate_request(messages, config)?;

        let use_case = config.and_then(|c| c.use_case).or(self.config.context);
        let model = select_model(
            config.and_then(|c| c.model.as_deref()),
            self.config.default_model.as_deref(),
            use_case,
        );

        let input_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
        let estimated_tokens = estimate_tokens(input_chars);
        self.cost.admit(
            self.config.app,
            model,
            estimated_tokens,
            self.config.enable_rate_limiting,
        )?;

        let safety_score = self.screen_user_content(messages, use_case, model, request_id).await?;

        let effective = self.with_system_prompt(messages, use_case);

        // Cache lookup on the selected model's key. A hit never reaches the
        // provider and never incurs cost beyond a zero-cost usage event.
        let key = chat_key(&effective, model.model, config);
        if let Some(cached) = self.cache.get(&key) {
            let response_time_ms = started.elapsed().as_millis() as u64;
            if self.config.enable_usage_monitoring {
                let event = UsageEvent::for_cache_hit(
                    self.config.app,
                    model.model,
                    request_id,
                    self.config.user_id.clone(),
                    response_time_ms,
                );
                self.cost.record(event.clone());
                self.sink.record_usage(&event).await;
            }
            let meta = ResponseMeta {
                request_id: request_id.to_string(),
                timestamp: Utc::now(),
                model: model.model.to_string(),
                tokens_used: None,
                cost: Some(0.0),
                response_time_ms,
                safety_score,
                cached: true,
            };
            return Ok(AiResponse::ok(cached, meta));
        }

        let dispatch_config = self.dispatch_config(config, model);
        let timeout = config
            .and_then(|c| c.timeout)
            .unwrap_or_else(|| self.config.default_timeout());
        let provider = Arc::clone(&self.provider);
        let effective_ref = &effective;
        let dispatch_ref = &dispatch_config;
        let outcome = self
            .reliability
            .execute(model, Some(timeout), move |model_id| {
                let provider = Arc::clone(&provider);
                async move { provider.invoke(&model_id, effective_ref, dispatch_ref).await }
            })
            .await?;

        let response_time_ms = started.elapsed().as_millis() as u64;
        let upstream = outcome.value;
        // Recorded usage prefers upstream-reported token counts; the
        // estimator only fills gaps.
        let input_tokens = upstream.input_tokens.unwrap_or(estimated_tokens);
        let output_tokens = upstream
            .output_tokens
            .unwrap_or_else(|| estimate_tokens(upstream.text.chars().count()));
        let event = UsageEvent::for_completion(
            self.config.app,
            &outcome.model_used,
            request_id,
            self.config.user_id.clone(),
            input_tokens,
            output_tokens,
            response_time_ms,
            outcome.attempts.saturating_sub(1),
        );

        let ttl = config
            .and_then(|c| c.cache_ttl)
            .unwrap_or_else(|| default_ttl_for(self.config.app));
        self.cache.set(
            key,
            upstream.text.clone(),
            Some(ttl),
            EntryMetadata {
                model: outcome.model_used.clone(),
                app: self.config.app,
                cost: Some(event.cost),
                response_time_ms: Some(response_time_ms),
            },
        );

        if self.config.enable_usage_monitoring {
            self.cost.record(event.clone());
            self.sink.record_usage(&event).await;
        }
        if self.config.enable_audit_logging {
            let input_text: String = effective
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            self.sink
                .record_audit(&AuditRecord {
                    request_id: request_id.to_string(),
                    timestamp: Utc::now(),
                    app: self.config.app,
                    action: AuditAction::Interaction,
                    outcome: "success".to_string(),
                    model: Some(outcome.model_used.clone()),
                    input_hash: Some(content_hash(&input_text)),
                    output_hash: Some(content_hash(&upstream.text)),
                    safety_score,
                    contains_phi: None,
                    cost: Some(event.cost),
                })
                .await;
        }

        debug!(request_id, model = %outcome.model_used, response_time_ms, "request completed");
        let meta = ResponseMeta {
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
            model: outcome.model_used,
            tokens_used: Some(input_tokens + output_tokens),
            cost: Some(event.cost),
            response_time_ms,
            safety_score,
            cached: false,
        };
        Ok(AiResponse::ok(upstream.text, meta))
    }

    /// Safety screen over concatenated user-role content. An unsafe
    /// verdict is terminal and is audit-logged by hash only; the raw
    /// content is never persisted.
    async fn screen_user_content(
        &self,
        messages: &[ChatMessage],
        use_case: Option<UseCase>,
        model: &ModelConfig,
        request_id: &str,
    ) -> Result<Option<f64>> {
        if !self.config.enable_safety_filtering {
            return Ok(None);
        }
        let user_content: String = messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let assessment = self.safety.assess(&user_content, use_case, None);

        if self.config.enable_audit_logging {
            self.sink
                .record_audit(&AuditRecord {
                    request_id: request_id.to_string(),
                    timestamp: Utc::now(),
                    app: self.config.app,
                    action: AuditAction::SafetyCheck,
                    outcome: if assessment.safe { "passed" } else { "blocked" }.to_string(),
                    model: Some(model.model.to_string()),
                    input_hash: Some(content_hash(&user_content)),
                    output_hash: None,
                    safety_score: Some(assessment.score),
                    contains_phi: Some(assessment.contains_phi),
                    cost: None,
                })
                .await;
        }

        if !assessment.safe {
            return Err(GatewayError::Safety {
                message: "content failed safety screening".to_string(),
                score: assessment.score,
                reasons: assessment.reasons(),
            });
        }
        Ok(Some(assessment.score))
    }

    /// Inject the use-case system prompt when the caller supplied none
    fn with_system_prompt(
        &self,
        messages: &[ChatMessage],
        use_case: Option<UseCase>,
    ) -> Vec<ChatMessage> {
        let has_system = messages.iter().any(|m| m.role == MessageRole::System);
        match use_case {
            Some(use_case) if !has_system => {
                let mut effective = Vec::with_capacity(messages.len() + 1);
                effective.push(system_message(system_prompt(use_case)));
                effective.extend_from_slice(messages);
                effective
            }
            _ => messages.to_vec(),
        }
    }

    /// Options forwarded upstream, with the output cap clamped to the model
    fn dispatch_config(&self, config: Option<&RequestConfig>, model: &ModelConfig) -> RequestConfig {
        let requested = config.and_then(|c| c.max_tokens).unwrap_or(model.max_tokens);
        RequestConfig {
            model: None,
            use_case: None,
            max_tokens: Some(requested.min(model.max_tokens)),
            temperature: config.and_then(|c| c.temperature),
            timeout: None,
            cache_ttl: None,
        }
    }

    /// Synthesize the failure branch and keep accounting accurate
    async fn failure_response(
        &self,
        config: Option<&RequestConfig>,
        error: GatewayError,
        request_id: &str,
        started: Instant,
    ) -> AiResponse {
        let response_time_ms = started.elapsed().as_millis() as u64;
        // Deterministic re-selection; the failure may have happened before
        // a model was chosen.
        let model = select_model(
            config.and_then(|c| c.model.as_deref()),
            self.config.default_model.as_deref(),
            config.and_then(|c| c.use_case).or(self.config.context),
        );
        if self.config.enable_usage_monitoring {
            let event = UsageEvent::for_failure(
                self.config.app,
                model.model,
                request_id,
                self.config.user_id.clone(),
                response_time_ms,
                error.code(),
            );
            self.cost.record(event.clone());
            self.sink.record_usage(&event).await;
        }
        let meta = ResponseMeta {
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
            model: model.model.to_string(),
            tokens_used: None,
            cost: Some(0.0),
            response_time_ms,
            safety_score: None,
            cached: false,
        };
        AiResponse::err(
            ResponseError::from_error(&error, !self.config.production),
            meta,
        )
    }

    /// Standalone safety check over arbitrary content
    pub fn check_safety(
        &self,
        content: &str,
        use_case: Option<UseCase>,
        level: Option<ComplianceLevel>,
    ) -> SafetyCheckResponse {
        let assessment = self
            .safety
            .assess(content, use_case.or(self.config.context), level);
        SafetyCheckResponse {
            success: true,
            data: Some(SafetyCheckData {
                safe: assessment.safe,
                score: assessment.score,
                contains_phi: assessment.contains_phi,
                reasons: assessment.reasons(),
            }),
            error: None,
        }
    }

    /// Aggregated usage for this gateway's application
    pub fn get_usage_stats(&self, timeframe: Timeframe) -> UsageStats {
        self.cost.usage_stats(self.config.app, timeframe)
    }

    /// Budget view for this gateway's application
    pub fn budget_status(&self, window: BudgetWindow) -> BudgetStatus {
        self.cost.budget_status(self.config.app, window)
    }

    /// Activate or clear the process-wide emergency stop
    pub fn set_emergency_stop(&self, active: bool) {
        self.cost.set_emergency_stop(active);
    }

    /// Gateway configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Response cache, for maintenance (invalidation, stats)
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Cost monitor, for budget inspection and test control
    pub fn cost_monitor(&self) -> &CostMonitor {
        &self.cost
    }

    /// Reliability manager, for breaker inspection and test control
    pub fn reliability(&self) -> &ReliabilityManager {
        &self.reliability
    }
}
