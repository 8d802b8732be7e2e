//! Model selection
//!
//! A fixed priority chain with no randomness and no load awareness:
//! explicit override, then the configured default, then the use-case
//! candidate list, then the hardcoded fast-chat model. Capability
//! mismatches are not validated here.

use tracing::debug;

use super::catalog::{FAST_CHAT_MODEL, ModelConfig, model_config, use_case_candidates};
use crate::core::types::UseCase;

/// Resolve exactly one model for a request.
pub fn select_model(
    explicit: Option<&str>,
    default_model: Option<&str>,
    use_case: Option<UseCase>,
) -> &'static ModelConfig {
    if let Some(model) = explicit {
        if let Some(config) = model_config(model) {
            debug!(model, "using explicitly requested model");
            return config;
        }
        debug!(model, "requested model not in catalog, continuing selection");
    }

    if let Some(model) = default_model {
        if let Some(config) = model_config(model) {
            debug!(model, "using configured default model");
            return config;
        }
    }

    let use_case = use_case.unwrap_or(UseCase::RealTimeChat);
    for candidate in use_case_candidates(use_case) {
        if let Some(config) = model_config(candidate) {
            debug!(model = candidate, %use_case, "selected model for use case");
            return config;
        }
    }

    // The catalog always contains the fast chat model.
    model_config(FAST_CHAT_MODEL).expect("fast chat model missing from catalog")
}
