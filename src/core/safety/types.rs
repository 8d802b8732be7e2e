//! Safety assessment types

use serde::{Deserialize, Serialize};

/// HIPAA compliance level applied when screening content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceLevel {
    /// Screening disabled; content passes regardless of findings
    None,
    /// Baseline screening
    #[default]
    Standard,
    /// Stricter scoring and extra PHI penalties
    Strict,
    /// Strictest scoring, for audit-sensitive workloads
    Audit,
}

impl ComplianceLevel {
    /// Minimum score required for content to pass at this level
    pub fn threshold(&self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Standard => 0.70,
            Self::Strict => 0.85,
            Self::Audit => 0.95,
        }
    }

    /// Whether the extra strict-mode penalties apply
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict | Self::Audit)
    }
}

/// Overall classification of a piece of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyCategory {
    Safe,
    PhiDetected,
    Inappropriate,
    PotentialHarm,
    PrivacyViolation,
    SecurityRisk,
}

/// HIPAA Safe-Harbor identifier categories detected by the pattern filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhiType {
    NameWithTitle,
    StreetAddress,
    Date,
    PhoneNumber,
    FaxNumber,
    Email,
    Ssn,
    MedicalRecordNumber,
    HealthPlanNumber,
    AccountNumber,
    CertificateNumber,
    VehicleIdentifier,
    DeviceIdentifier,
    Url,
    IpAddress,
    Biometric,
}

/// Severity of a single violation, with its score penalty
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ViolationSeverity {
    /// Score penalty subtracted per violation of this severity
    pub fn penalty(&self) -> f64 {
        match self {
            Self::Low => 0.1,
            Self::Medium => 0.2,
            Self::High => 0.3,
            Self::Critical => 0.4,
        }
    }
}

/// What kind of finding a violation is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Phi(PhiType),
    SqlInjection,
    ScriptInjection,
    JavascriptUri,
    Profanity,
    Discriminatory,
}

/// One detected violation
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: ViolationSeverity,
    pub description: String,
    /// Matched text snippet. Held in memory only; never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
    pub remediation: Vec<&'static str>,
}

/// Result of screening one piece of content
#[derive(Debug, Clone, Serialize)]
pub struct SafetyAssessment {
    pub category: SafetyCategory,
    /// Safety score in [0, 1]; 1.0 is clean
    pub score: f64,
    /// Aggregate confidence of the findings, in [0, 1]
    pub confidence: f64,
    pub safe: bool,
    pub violations: Vec<Violation>,
    pub contains_phi: bool,
    pub phi_types: Vec<PhiType>,
    /// True when the text independently matches at least two
    /// medical-context keywords
    pub medical_context: bool,
}

impl SafetyAssessment {
    /// Human-readable reasons, one per violation
    pub fn reasons(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.description.clone()).collect()
    }
}
