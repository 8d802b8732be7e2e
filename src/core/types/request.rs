//! Per-request configuration
//!
//! A closed struct with named, typed fields. Unknown keys are rejected at
//! deserialization rather than silently ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::context::UseCase;

/// Options recognized on an individual chat call. Anything not set here
/// falls back to the gateway-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestConfig {
    /// Explicit model override; must exist in the registry to take effect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Use-case tag for this call, overriding the gateway's context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_case: Option<UseCase>,
    /// Output token cap passed to the upstream model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature, 0.0..=2.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Per-request hard deadline
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_duration_ms")]
    pub timeout: Option<Duration>,
    /// Cache TTL override for this call
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_duration_ms")]
    pub cache_ttl: Option<Duration>,
}

/// Serialize optional durations as integer milliseconds
mod opt_duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let ms = Option::<u64>::deserialize(d)?;
        Ok(ms.map(Duration::from_millis))
    }
}
