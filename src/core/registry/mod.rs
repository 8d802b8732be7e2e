//! Model registry: static catalog, per-app limits, and selection

mod catalog;
mod selection;

pub use catalog::{
    AppRateLimits, FAST_CHAT_MODEL, ModelConfig, ModelRateLimits, ModelTier, app_rate_limits,
    model_config, model_ids, system_prompt, use_case_candidates,
};
pub use selection::select_model;
