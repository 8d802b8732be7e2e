//! Cache key derivation
//!
//! Two requests that differ only in whitespace or letter case of message
//! content collapse to the same key. That is intentional cost reduction;
//! it also means a hit can mask minor prompt differences.

use sha2::{Digest, Sha256};

use crate::core::types::{ChatMessage, RequestConfig};

/// Keys are the first 32 hex characters of a sha256 digest
const KEY_LENGTH: usize = 32;

/// Derive the deterministic cache key for a chat request.
///
/// The digest covers each message's role plus trimmed, lowercased content,
/// the selected model id, and the config subset that affects output
/// determinism (temperature, max tokens).
pub fn chat_key(messages: &[ChatMessage], model: &str, config: Option<&RequestConfig>) -> String {
    let mut hasher = Sha256::new();
    for message in messages {
        hasher.update(message.role.to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(message.content.trim().to_lowercase().as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    if let Some(config) = config {
        if let Some(temperature) = config.temperature {
            hasher.update(temperature.to_bits().to_le_bytes());
        }
        if let Some(max_tokens) = config.max_tokens {
            hasher.update(max_tokens.to_le_bytes());
        }
    }
    let digest = hasher.finalize();
    hex::encode(digest)[..KEY_LENGTH].to_string()
}
