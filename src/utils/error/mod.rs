//! Error types and taxonomy for the gateway

mod error;
mod taxonomy;

pub use error::{AttemptRecord, GatewayError, Result};
pub use taxonomy::{ErrorCategory, ErrorSeverity, RecoveryAction, RecoveryKind, recovery_actions};
