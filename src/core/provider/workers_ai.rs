//! Workers AI HTTP provider
//!
//! Maps catalog model ids to the hosted endpoint's identifiers and
//! extracts text from the endpoint's response envelope variants.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ModelProvider, ProviderResponse};
use crate::core::types::{ChatMessage, RequestConfig};
use crate::utils::error::{GatewayError, Result};

/// Provider configuration
#[derive(Debug, Clone)]
pub struct WorkersAiConfig {
    pub account_id: String,
    pub api_token: String,
    /// Endpoint root; overridable for tests
    pub base_url: String,
}

impl WorkersAiConfig {
    pub fn new(account_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            api_token: api_token.into(),
            base_url: "https://api.cloudflare.com/client/v4".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Catalog id -> hosted endpoint id
fn upstream_model_id(model: &str) -> Option<&'static str> {
    match model {
        "llama-4-scout-17b-16e-instruct" => Some("@cf/meta/llama-4-scout-17b-16e-instruct"),
        "llama-3.3-70b-instruct-fp8-fast" => Some("@cf/meta/llama-3.3-70b-instruct-fp8-fast"),
        "llama-guard-3-8b" => Some("@cf/meta/llama-guard-3-8b"),
        "qwq-32b" => Some("@cf/qwen/qwq-32b"),
        "llama-3.2-11b-vision-instruct" => Some("@cf/meta/llama-3.2-11b-vision-instruct"),
        "llama-3.2-3b-instruct" => Some("@cf/meta/llama-3.2-3b-instruct"),
        "llama-3.2-1b-instruct" => Some("@cf/meta/llama-3.2-1b-instruct"),
        "whisper-large-v3-turbo" => Some("@cf/openai/whisper-large-v3-turbo"),
        "melotts" => Some("@cf/myshell-ai/melotts"),
        "bge-m3" => Some("@cf/baai/bge-m3"),
        "bge-reranker-base" => Some("@cf/baai/bge-reranker-base"),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

/// HTTP provider against the hosted Workers AI pool
pub struct WorkersAiProvider {
    config: WorkersAiConfig,
    client: reqwest::Client,
}

impl WorkersAiProvider {
    pub fn new(config: WorkersAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn run_url(&self, upstream_model: &str) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.config.base_url, self.config.account_id, upstream_model
        )
    }

    /// Pull the completion text out of the endpoint's envelope, which
    /// varies by model family
    fn extract_text(result: &serde_json::Value) -> Option<String> {
        if let Some(text) = result.get("response").and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
        if let Some(text) = result.get("text").and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
        if let Some(text) = result.as_str() {
            return Some(text.to_string());
        }
        if let Some(first) = result.as_array().and_then(|a| a.first()) {
            return first
                .get("response")
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }
        None
    }
}

#[async_trait]
impl ModelProvider for WorkersAiProvider {
    async fn invoke(
        &self,
        model: &str,
        messages: &[ChatMessage],
        config: &RequestConfig,
    ) -> Result<ProviderResponse> {
        let upstream = upstream_model_id(model)
            .ok_or_else(|| GatewayError::model(model, "no upstream mapping for model"))?;

        let mut body = json!({
            "messages": messages
                .iter()
                .map(|m| json!({ "role": m.role.to_string(), "content": m.content }))
                .collect::<Vec<_>>(),
        });
        if let Some(max_tokens) = config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = config.temperature {
            body["temperature"] = json!(temperature);
        }

        debug!(model, upstream, "invoking upstream model");
        let response = self
            .client
            .post(self.run_url(upstream))
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::network(format!("upstream request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => GatewayError::auth(format!("upstream rejected credentials: {detail}")),
                429 => GatewayError::rate_limit(
                    "upstream rate limit".to_string(),
                    std::time::Duration::from_secs(60),
                ),
                500..=599 => GatewayError::model(model, format!("upstream {status}: {detail}")),
                _ => GatewayError::model(model, format!("upstream {status}: {detail}")),
            });
        }

        let envelope: Envelope = response.json().await?;
        if envelope.success == Some(false) {
            let message = envelope
                .errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "unknown upstream error".to_string());
            return Err(GatewayError::model(model, message));
        }

        let result = envelope
            .result
            .ok_or_else(|| GatewayError::model(model, "empty result in upstream envelope"))?;
        let text = Self::extract_text(&result)
            .ok_or_else(|| GatewayError::model(model, "unexpected upstream response format"))?;

        let usage: Option<Usage> = result
            .get("usage")
            .and_then(|u| serde_json::from_value(u.clone()).ok());

        Ok(ProviderResponse {
            text,
            input_tokens: usage.as_ref().and_then(|u| u.prompt_tokens),
            output_tokens: usage.as_ref().and_then(|u| u.completion_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_catalog_model_has_a_mapping() {
        for id in crate::core::registry::model_ids() {
            assert!(upstream_model_id(id).is_some(), "missing mapping for {id}");
        }
        assert!(upstream_model_id("gpt-4").is_none());
    }

    #[test]
    fn test_extract_text_variants() {
        let obj = json!({ "response": "hi" });
        assert_eq!(WorkersAiProvider::extract_text(&obj), Some("hi".into()));

        let text = json!({ "text": "transcript" });
        assert_eq!(
            WorkersAiProvider::extract_text(&text),
            Some("transcript".into())
        );

        let plain = json!("raw");
        assert_eq!(WorkersAiProvider::extract_text(&plain), Some("raw".into()));

        let array = json!([{ "response": "first" }]);
        assert_eq!(
            WorkersAiProvider::extract_text(&array),
            Some("first".into())
        );

        let unknown = json!({ "weird": 1 });
        assert_eq!(WorkersAiProvider::extract_text(&unknown), None);
    }
}
