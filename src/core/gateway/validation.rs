//! Request shape validation
//!
//! The first pipeline stage; failures here are terminal and never retried.

use crate::core::types::{ChatMessage, RequestConfig};
use crate::utils::error::{GatewayError, Result};

/// Content length bounds per message, in characters
pub const MIN_CONTENT_LENGTH: usize = 1;
pub const MAX_CONTENT_LENGTH: usize = 10_000;

/// Validate message shape and request options
pub fn validate_request(messages: &[ChatMessage], config: Option<&RequestConfig>) -> Result<()> {
    if messages.is_empty() {
        return Err(GatewayError::validation("at least one message is required"));
    }
    for (index, message) in messages.iter().enumerate() {
        let length = message.content.chars().count();
        if length < MIN_CONTENT_LENGTH {
            return Err(GatewayError::validation(format!(
                "message {index} has empty content"
            )));
        }
        if length > MAX_CONTENT_LENGTH {
            return Err(GatewayError::validation(format!(
                "message {index} exceeds {MAX_CONTENT_LENGTH} characters ({length})"
            )));
        }
    }
    if let Some(config) = config {
        if let Some(temperature) = config.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(GatewayError::validation(format!(
                    "temperature {temperature} outside 0.0..=2.0"
                )));
            }
        }
        if config.max_tokens == Some(0) {
            return Err(GatewayError::validation("max_tokens must be positive"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::user_message;

    #[test]
    fn test_empty_message_list_rejected() {
        assert!(validate_request(&[], None).is_err());
    }

    #[test]
    fn test_empty_content_rejected() {
        assert!(validate_request(&[user_message("")], None).is_err());
    }

    #[test]
    fn test_oversized_content_rejected() {
        let long = "a".repeat(MAX_CONTENT_LENGTH + 1);
        assert!(validate_request(&[user_message(long)], None).is_err());
        let exact = "a".repeat(MAX_CONTENT_LENGTH);
        assert!(validate_request(&[user_message(exact)], None).is_ok());
    }

    #[test]
    fn test_temperature_bounds() {
        let config = RequestConfig {
            temperature: Some(2.5),
            ..Default::default()
        };
        assert!(validate_request(&[user_message("hi")], Some(&config)).is_err());

        let config = RequestConfig {
            temperature: Some(0.7),
            ..Default::default()
        };
        assert!(validate_request(&[user_message("hi")], Some(&config)).is_ok());
    }
}
