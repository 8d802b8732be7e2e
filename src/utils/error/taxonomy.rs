//! Error taxonomy: categories, severities, and recovery actions
//!
//! Every failure that crosses a component boundary is classified here before
//! a caller sees it. Callers receive a category, a severity, a non-technical
//! message, and a prioritized list of recovery actions, never a raw
//! transport error.

use serde::{Deserialize, Serialize};

/// Failure category, the primary classification axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing or invalid caller identity
    Authentication,
    /// Malformed request shape or fields
    Validation,
    /// Content failed PHI/safety screening
    Safety,
    /// Transport failure reaching the upstream model
    Network,
    /// Hard deadline exceeded
    Timeout,
    /// Cooldown or quota window exceeded
    RateLimit,
    /// Daily or monthly spend ceiling reached
    Budget,
    /// Upstream model unavailable
    Model,
    /// Internal misconfiguration; fatal until an operator intervenes
    Configuration,
    /// Catch-all
    Unknown,
}

impl ErrorCategory {
    /// Default auto-retry policy per category.
    ///
    /// Authentication, validation, and safety failures are recoverable by
    /// the caller but must never be retried as-is; budget and configuration
    /// failures need a human.
    pub fn retryable_by_default(&self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimit | Self::Model | Self::Unknown
        )
    }

    /// Non-technical message shown to end users for this category
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Authentication => "Please log in to continue using AI features.",
            Self::Validation => "Please check your input and try again.",
            Self::Safety => {
                "Your message contains sensitive information that cannot be processed. \
                 Please remove personal details."
            }
            Self::Network => "Unable to connect to the AI service. Please check your connection.",
            Self::Timeout => "The AI request is taking longer than expected. Please try again.",
            Self::RateLimit => "Too many requests. Please wait a moment before trying again.",
            Self::Budget => "The AI usage budget has been exceeded. Please contact your administrator.",
            Self::Model => "The AI model is temporarily unavailable. Please try again later.",
            Self::Configuration => "The AI service is misconfigured. Please contact technical support.",
            Self::Unknown => "An unexpected error occurred. Please try again.",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Authentication => "authentication",
            Self::Validation => "validation",
            Self::Safety => "safety",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::RateLimit => "rate_limit",
            Self::Budget => "budget",
            Self::Model => "model",
            Self::Configuration => "configuration",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Error severity, used for alerting and log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// What a caller can do about a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryKind {
    Retry,
    Refresh,
    Navigate,
    Contact,
    Wait,
    Modify,
}

/// A single suggested recovery step; lower priority ranks first
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryAction {
    pub label: &'static str,
    pub kind: RecoveryKind,
    pub priority: u8,
}

impl RecoveryAction {
    const fn new(label: &'static str, kind: RecoveryKind, priority: u8) -> Self {
        Self {
            label,
            kind,
            priority,
        }
    }
}

/// Prioritized recovery actions for a category
pub fn recovery_actions(category: ErrorCategory) -> Vec<RecoveryAction> {
    use RecoveryKind::*;
    match category {
        ErrorCategory::Authentication => vec![
            RecoveryAction::new("Log in", Navigate, 1),
            RecoveryAction::new("Refresh the page", Refresh, 2),
        ],
        ErrorCategory::Validation => vec![
            RecoveryAction::new("Check your input", Modify, 1),
            RecoveryAction::new("Try again", Retry, 2),
        ],
        ErrorCategory::Safety => vec![
            RecoveryAction::new("Remove personal information", Modify, 1),
            RecoveryAction::new("Rephrase the message", Modify, 2),
        ],
        ErrorCategory::Network => vec![
            RecoveryAction::new("Check your connection", Wait, 1),
            RecoveryAction::new("Try again", Retry, 2),
            RecoveryAction::new("Refresh the page", Refresh, 3),
        ],
        ErrorCategory::Timeout => vec![
            RecoveryAction::new("Shorten the message", Modify, 1),
            RecoveryAction::new("Try again", Retry, 2),
        ],
        ErrorCategory::RateLimit => vec![RecoveryAction::new("Wait and retry", Wait, 1)],
        ErrorCategory::Budget => vec![RecoveryAction::new("Contact an administrator", Contact, 1)],
        ErrorCategory::Model => vec![
            RecoveryAction::new("Try again", Retry, 1),
            RecoveryAction::new("Wait a minute", Wait, 2),
        ],
        ErrorCategory::Configuration => {
            vec![RecoveryAction::new("Contact support", Contact, 1)]
        }
        ErrorCategory::Unknown => vec![
            RecoveryAction::new("Try again", Retry, 1),
            RecoveryAction::new("Refresh the page", Refresh, 2),
            RecoveryAction::new("Contact support", Contact, 3),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retryability() {
        assert!(ErrorCategory::Network.retryable_by_default());
        assert!(ErrorCategory::Timeout.retryable_by_default());
        assert!(ErrorCategory::RateLimit.retryable_by_default());
        assert!(ErrorCategory::Model.retryable_by_default());
        assert!(!ErrorCategory::Validation.retryable_by_default());
        assert!(!ErrorCategory::Safety.retryable_by_default());
        assert!(!ErrorCategory::Budget.retryable_by_default());
        assert!(!ErrorCategory::Configuration.retryable_by_default());
    }

    #[test]
    fn test_recovery_actions_prioritized() {
        let actions = recovery_actions(ErrorCategory::Network);
        assert_eq!(actions.len(), 3);
        assert!(actions.windows(2).all(|w| w[0].priority <= w[1].priority));
    }
}
