//! HIPAA-oriented content safety filtering
//!
//! Pattern-based screening for Safe-Harbor identifiers, injection attempts,
//! and inappropriate language, with severity-weighted scoring per
//! compliance level.

mod filter;
mod patterns;
mod types;

pub use filter::SafetyFilter;
pub use types::{
    ComplianceLevel, PhiType, SafetyAssessment, SafetyCategory, Violation, ViolationKind,
    ViolationSeverity,
};
