//! Static model catalog and per-application limits
//!
//! The catalog is loaded once at startup and never mutated at runtime.
//! Costs are per token with distinct input/output rates; all budget and
//! usage accounting recomputes cost from this table rather than trusting
//! upstream figures.

use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::core::types::{ApplicationContext, UseCase};

/// Production readiness of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Production-ready
    Production,
    /// Experimental; allowed but not preferred
    Experimental,
}

/// Per-model rate limiting descriptor
#[derive(Debug, Clone, Copy)]
pub struct ModelRateLimits {
    pub requests_per_minute: u32,
    pub requests_per_hour: u32,
    pub daily_budget_usd: f64,
    /// Minimum interval between consecutive dispatches to this model
    pub cooldown: Duration,
    pub daily_request_limit: u32,
}

/// One upstream model: identity, capability, cost, and limits
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model: &'static str,
    pub max_tokens: u32,
    pub input_cost_per_token: f64,
    pub output_cost_per_token: f64,
    pub capabilities: &'static [UseCase],
    pub tier: ModelTier,
    pub hipaa_compliant: bool,
    pub rate_limits: ModelRateLimits,
    /// Ordered fallback chain tried after this model's retry budget is spent
    pub fallbacks: &'static [&'static str],
}

impl ModelConfig {
    /// Cost of a completed call from recorded token counts
    pub fn cost_for(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        input_tokens as f64 * self.input_cost_per_token
            + output_tokens as f64 * self.output_cost_per_token
    }

    /// Worst-case per-token rate, used for pre-flight projections where the
    /// input/output split is not yet known
    pub fn max_cost_per_token(&self) -> f64 {
        self.input_cost_per_token.max(self.output_cost_per_token)
    }
}

/// Hardcoded last-resort model when no selection rule matches
pub const FAST_CHAT_MODEL: &str = "llama-3.3-70b-instruct-fp8-fast";

macro_rules! model {
    ($id:literal, $max:expr, $input_cost:expr, $output_cost:expr, $caps:expr, $tier:expr,
     $rpm:expr, $rph:expr, $budget:expr, $cooldown_ms:expr, $daily:expr, $fallbacks:expr) => {
        ModelConfig {
            model: $id,
            max_tokens: $max,
            input_cost_per_token: $input_cost,
            output_cost_per_token: $output_cost,
            capabilities: $caps,
            tier: $tier,
            hipaa_compliant: true,
            rate_limits: ModelRateLimits {
                requests_per_minute: $rpm,
                requests_per_hour: $rph,
                daily_budget_usd: $budget,
                cooldown: Duration::from_millis($cooldown_ms),
                daily_request_limit: $daily,
            },
            fallbacks: $fallbacks,
        }
    };
}

static MODELS: Lazy<HashMap<&'static str, ModelConfig>> = Lazy::new(|| {
    use ModelTier::*;
    use UseCase::*;
    let configs = [
        model!(
            "llama-4-scout-17b-16e-instruct",
            2048,
            0.0001,
            0.0002,
            &[PatientCommunication, ClinicalDocumentation, ComplexReasoning],
            Production,
            20,
            1000,
            50.00,
            1000,
            1000,
            &["llama-3.3-70b-instruct-fp8-fast", "llama-3.2-3b-instruct"]
        ),
        model!(
            "llama-3.3-70b-instruct-fp8-fast",
            1024,
            0.00008,
            0.00015,
            &[RealTimeChat, PatientCommunication],
            Production,
            50,
            2000,
            25.00,
            500,
            2000,
            &["llama-3.2-3b-instruct", "llama-3.2-1b-instruct"]
        ),
        model!(
            "llama-guard-3-8b",
            512,
            0.00007,
            0.00014,
            &[SafetyFiltering],
            Production,
            100,
            5000,
            10.00,
            100,
            10000,
            &[]
        ),
        model!(
            "qwq-32b",
            4096,
            0.00012,
            0.00025,
            &[ComplexReasoning, BusinessIntelligence],
            Experimental,
            10,
            500,
            20.00,
            2000,
            200,
            &["llama-4-scout-17b-16e-instruct"]
        ),
        model!(
            "llama-3.2-11b-vision-instruct",
            2048,
            0.00015,
            0.0003,
            &[DocumentProcessing],
            Experimental,
            15,
            400,
            15.00,
            1500,
            400,
            &[]
        ),
        model!(
            "whisper-large-v3-turbo",
            1024,
            0.00006,
            0.00006,
            &[VoiceProcessing],
            Experimental,
            30,
            1000,
            10.00,
            500,
            1000,
            &[]
        ),
        model!(
            "melotts",
            2048,
            0.00005,
            0.00005,
            &[VoiceProcessing],
            Experimental,
            20,
            800,
            8.00,
            800,
            800,
            &[]
        ),
        model!(
            "llama-3.2-3b-instruct",
            4096,
            0.00006,
            0.00012,
            &[PatientCommunication, DocumentGeneration, RealTimeChat],
            Production,
            120,
            3600,
            20.00,
            100,
            10000,
            &["llama-3.2-1b-instruct"]
        ),
        model!(
            "llama-3.2-1b-instruct",
            2048,
            0.00005,
            0.0001,
            &[PatientCommunication, RealTimeChat],
            Production,
            150,
            4000,
            15.00,
            50,
            12000,
            &[]
        ),
        model!(
            "bge-m3",
            512,
            0.00002,
            0.00002,
            &[Embeddings],
            Experimental,
            100,
            3000,
            5.00,
            200,
            5000,
            &[]
        ),
        model!(
            "bge-reranker-base",
            512,
            0.00003,
            0.00003,
            &[Reranking],
            Experimental,
            100,
            3000,
            5.00,
            200,
            5000,
            &[]
        ),
    ];
    configs.into_iter().map(|c| (c.model, c)).collect()
});

/// Look up a model by catalog id
pub fn model_config(model: &str) -> Option<&'static ModelConfig> {
    MODELS.get(model)
}

/// All catalog ids
pub fn model_ids() -> impl Iterator<Item = &'static str> {
    MODELS.keys().copied()
}

/// Per-application quota and budget limits
#[derive(Debug, Clone, Copy)]
pub struct AppRateLimits {
    pub requests_per_minute: u32,
    pub requests_per_hour: u32,
    pub daily_budget_usd: f64,
    pub burst_limit: Option<u32>,
    pub daily_request_limit: u32,
}

impl AppRateLimits {
    /// Monthly ceiling derived from the daily budget
    pub fn monthly_budget_usd(&self) -> f64 {
        self.daily_budget_usd * 30.0
    }
}

const fn app_limits(
    requests_per_minute: u32,
    requests_per_hour: u32,
    daily_budget_usd: f64,
    burst_limit: Option<u32>,
    daily_request_limit: u32,
) -> AppRateLimits {
    AppRateLimits {
        requests_per_minute,
        requests_per_hour,
        daily_budget_usd,
        burst_limit,
        daily_request_limit,
    }
}

/// Every `ApplicationContext` resolves to exactly one limit set; this is a
/// total function by construction.
pub fn app_rate_limits(app: ApplicationContext) -> AppRateLimits {
    use ApplicationContext::*;
    match app {
        AiReceptionist => app_limits(100, 2000, 50.00, Some(150), 2000),
        ClinicalStaffing => app_limits(20, 500, 20.00, None, 500),
        CheckinKiosk => app_limits(50, 1000, 25.00, None, 1000),
        EosL10 => app_limits(15, 300, 15.00, None, 300),
        Inventory => app_limits(10, 200, 8.00, None, 200),
        Handouts => app_limits(15, 300, 10.00, None, 300),
        MedicationAuth => app_limits(25, 600, 18.00, None, 600),
        PharmaScheduling => app_limits(10, 200, 8.00, None, 200),
        CallCenterOps => app_limits(30, 800, 22.00, None, 800),
        BatchCloseout => app_limits(5, 100, 5.00, None, 100),
        SocialsReviews => app_limits(8, 150, 6.00, None, 150),
        ComplianceTraining => app_limits(12, 250, 10.00, None, 250),
        PlatformDashboard => app_limits(20, 400, 12.00, None, 400),
        ConfigDashboard => app_limits(5, 100, 4.00, None, 100),
        ComponentShowcase => app_limits(3, 50, 2.00, None, 50),
        Staff => app_limits(25, 600, 15.00, None, 600),
        IntegrationStatus => app_limits(8, 150, 5.00, None, 150),
    }
}

/// Ordered model candidates per use case. The first candidate present in
/// the catalog wins.
pub fn use_case_candidates(use_case: UseCase) -> &'static [&'static str] {
    use UseCase::*;
    match use_case {
        PatientCommunication => &[
            "llama-4-scout-17b-16e-instruct",
            "llama-3.3-70b-instruct-fp8-fast",
        ],
        ClinicalDocumentation => &["llama-4-scout-17b-16e-instruct"],
        BusinessIntelligence => &["qwq-32b", "llama-4-scout-17b-16e-instruct"],
        DocumentProcessing => &["llama-3.2-11b-vision-instruct", "bge-m3", "bge-reranker-base"],
        DocumentGeneration => &["llama-4-scout-17b-16e-instruct", "llama-3.2-3b-instruct"],
        VoiceProcessing => &["whisper-large-v3-turbo", "melotts"],
        SafetyFiltering => &["llama-guard-3-8b"],
        RealTimeChat => &[
            "llama-3.3-70b-instruct-fp8-fast",
            "llama-4-scout-17b-16e-instruct",
        ],
        ComplexReasoning => &["qwq-32b", "llama-4-scout-17b-16e-instruct"],
        Embeddings => &["bge-m3"],
        Reranking => &["bge-reranker-base"],
    }
}

/// System prompt injected when a request carries no system message
pub fn system_prompt(use_case: UseCase) -> &'static str {
    use UseCase::*;
    match use_case {
        PatientCommunication => {
            "You are a professional medical assistant for a dermatology practice. Provide \
             helpful, accurate, and empathetic responses to patient inquiries. Always maintain \
             HIPAA compliance and patient privacy."
        }
        ClinicalDocumentation => {
            "You are a clinical documentation assistant. Help create accurate, comprehensive \
             medical documentation while maintaining professional standards and HIPAA compliance."
        }
        BusinessIntelligence => {
            "You are a business intelligence assistant for healthcare operations. Analyze data, \
             provide insights, and help optimize clinical and business processes."
        }
        DocumentProcessing => {
            "You are a document processing assistant. Extract, analyze, and process medical \
             documents accurately while maintaining data integrity and compliance."
        }
        DocumentGeneration => {
            "You are a document generation assistant. Create professional medical documents, \
             patient handouts, and educational materials while ensuring accuracy and compliance."
        }
        VoiceProcessing => {
            "You are a voice processing assistant. Convert speech to text and text to speech \
             accurately for medical communications."
        }
        SafetyFiltering => {
            "You are a safety and compliance assistant. Ensure all content meets HIPAA \
             requirements and contains no PHI exposure risks."
        }
        RealTimeChat => {
            "You are a real-time assistant for clinic staff. Provide quick, accurate responses \
             to help with daily operations."
        }
        ComplexReasoning => {
            "You are an advanced reasoning assistant. Analyze complex problems, provide \
             detailed solutions, and help with strategic decision-making."
        }
        Embeddings => "You are an embedding generation assistant for semantic search and retrieval.",
        Reranking => "You are a reranking assistant for optimizing search result relevance.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_complete() {
        assert_eq!(model_ids().count(), 11);
        assert!(model_config(FAST_CHAT_MODEL).is_some());
    }

    #[test]
    fn test_fallback_chains_resolve() {
        for id in model_ids() {
            let config = model_config(id).unwrap();
            for fallback in config.fallbacks {
                assert!(
                    model_config(fallback).is_some(),
                    "{} declares unknown fallback {}",
                    id,
                    fallback
                );
            }
        }
    }

    #[test]
    fn test_candidates_resolve() {
        use crate::core::types::UseCase;
        for use_case in [
            UseCase::PatientCommunication,
            UseCase::RealTimeChat,
            UseCase::ComplexReasoning,
            UseCase::SafetyFiltering,
        ] {
            for candidate in use_case_candidates(use_case) {
                assert!(model_config(candidate).is_some());
            }
        }
    }

    #[test]
    fn test_cost_uses_split_rates() {
        let config = model_config("llama-4-scout-17b-16e-instruct").unwrap();
        let cost = config.cost_for(1000, 500);
        assert!((cost - (1000.0 * 0.0001 + 500.0 * 0.0002)).abs() < 1e-12);
    }

    #[test]
    fn test_every_app_has_limits() {
        for app in crate::core::types::ApplicationContext::ALL {
            let limits = app_rate_limits(app);
            assert!(limits.daily_budget_usd > 0.0);
            assert!(limits.monthly_budget_usd() > limits.daily_budget_usd);
        }
    }

    #[test]
    fn test_cooldown_values() {
        let fast = model_config("llama-3.3-70b-instruct-fp8-fast").unwrap();
        assert_eq!(fast.rate_limits.cooldown, Duration::from_millis(500));
    }
}
