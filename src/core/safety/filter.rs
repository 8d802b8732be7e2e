//! Content screening and scoring
//!
//! Pattern-based classifier producing an admit/deny decision with a
//! rationale. This is the single gate every outbound user-originated
//! message passes before reaching a model.

use tracing::{debug, warn};

use super::patterns::{
    DISCRIMINATORY, JAVASCRIPT_URI, PHI_PATTERNS, PROFANITY, SCRIPT_TAG, SQL_INJECTION,
    medical_context_matches,
};
use super::types::{
    ComplianceLevel, PhiType, SafetyAssessment, SafetyCategory, Violation, ViolationKind,
    ViolationSeverity,
};
use crate::core::types::UseCase;

/// Extra penalty when PHI appears inside recognizable medical context.
/// This stacks with the per-violation penalty for the same finding; the
/// calibration is inherited and under product review.
const MEDICAL_CONTEXT_PENALTY: f64 = 0.2;
/// Strict/audit-mode penalty applied once when any PHI is present
const STRICT_PHI_PENALTY: f64 = 0.3;
/// Strict/audit-mode flat penalty applied once when any violation exists
const STRICT_VIOLATION_PENALTY: f64 = 0.1;

/// Pattern-based safety filter
#[derive(Debug, Clone)]
pub struct SafetyFilter {
    compliance: ComplianceLevel,
}

impl SafetyFilter {
    pub fn new(compliance: ComplianceLevel) -> Self {
        Self { compliance }
    }

    /// Compliance level this filter was constructed with
    pub fn compliance(&self) -> ComplianceLevel {
        self.compliance
    }

    /// Screen one piece of content. `level` overrides the filter's
    /// configured compliance level for this call only.
    pub fn assess(
        &self,
        content: &str,
        use_case: Option<UseCase>,
        level: Option<ComplianceLevel>,
    ) -> SafetyAssessment {
        let level = level.unwrap_or(self.compliance);
        let mut violations = Vec::new();
        let mut phi_types = Vec::new();

        for family in PHI_PATTERNS.iter() {
            if let Some(m) = family.regex.find(content) {
                if !phi_types.contains(&family.phi_type) {
                    phi_types.push(family.phi_type);
                }
                violations.push(Violation {
                    kind: ViolationKind::Phi(family.phi_type),
                    severity: family.severity,
                    description: family.description.to_string(),
                    matched: Some(m.as_str().to_string()),
                    remediation: family.remediation.to_vec(),
                });
            }
        }

        if SQL_INJECTION.is_match(content) {
            violations.push(Violation {
                kind: ViolationKind::SqlInjection,
                severity: ViolationSeverity::High,
                description: "SQL-like injection pattern detected".to_string(),
                matched: None,
                remediation: vec!["Remove query syntax from the message"],
            });
        }
        if SCRIPT_TAG.is_match(content) {
            violations.push(Violation {
                kind: ViolationKind::ScriptInjection,
                severity: ViolationSeverity::Critical,
                description: "Embedded script tag detected".to_string(),
                matched: None,
                remediation: vec!["Remove markup from the message"],
            });
        }
        if JAVASCRIPT_URI.is_match(content) {
            violations.push(Violation {
                kind: ViolationKind::JavascriptUri,
                severity: ViolationSeverity::High,
                description: "javascript: URI detected".to_string(),
                matched: None,
                remediation: vec!["Remove the javascript: link"],
            });
        }
        if PROFANITY.is_match(content) {
            violations.push(Violation {
                kind: ViolationKind::Profanity,
                severity: ViolationSeverity::Medium,
                description: "Profanity detected".to_string(),
                matched: None,
                remediation: vec!["Rephrase without profanity"],
            });
        }
        if DISCRIMINATORY.is_match(content) {
            violations.push(Violation {
                kind: ViolationKind::Discriminatory,
                severity: ViolationSeverity::High,
                description: "Discriminatory language detected".to_string(),
                matched: None,
                remediation: vec!["Rephrase without discriminatory language"],
            });
        }

        let contains_phi = !phi_types.is_empty();
        let medical_context = medical_context_matches(content) >= 2;

        let mut score = 1.0;
        for violation in &violations {
            score -= violation.severity.penalty();
        }
        if contains_phi && medical_context {
            score -= MEDICAL_CONTEXT_PENALTY;
        }
        if level.is_strict() {
            if contains_phi {
                score -= STRICT_PHI_PENALTY;
            }
            if !violations.is_empty() {
                score -= STRICT_VIOLATION_PENALTY;
            }
        }
        let score = score.clamp(0.0, 1.0);

        let has_critical = violations
            .iter()
            .any(|v| v.severity == ViolationSeverity::Critical);

        // At level `none` the gate is disabled entirely; the assessment is
        // still computed so callers can inspect findings.
        let safe = if level == ComplianceLevel::None {
            true
        } else if contains_phi || has_critical {
            false
        } else {
            score >= level.threshold()
        };

        let confidence = phi_confidence(&phi_types, violations.len());
        let category = categorize(&violations, &phi_types, contains_phi, medical_context);

        if !safe {
            warn!(
                ?category,
                score,
                violations = violations.len(),
                use_case = use_case.map(|u| u.to_string()).as_deref().unwrap_or("-"),
                "content failed safety screen"
            );
        } else {
            debug!(score, violations = violations.len(), "content passed safety screen");
        }

        SafetyAssessment {
            category,
            score,
            confidence,
            safe,
            violations,
            contains_phi,
            phi_types,
            medical_context,
        }
    }
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::new(ComplianceLevel::Standard)
    }
}

fn phi_confidence(phi_types: &[PhiType], violation_count: usize) -> f64 {
    if violation_count == 0 {
        return 1.0;
    }
    let confidences: Vec<f64> = PHI_PATTERNS
        .iter()
        .filter(|p| phi_types.contains(&p.phi_type))
        .map(|p| p.confidence)
        .collect();
    if confidences.is_empty() {
        // Non-PHI findings only (injection/profanity); fixed confidence.
        0.8
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    }
}

fn categorize(
    violations: &[Violation],
    phi_types: &[PhiType],
    contains_phi: bool,
    medical_context: bool,
) -> SafetyCategory {
    let has_injection = violations.iter().any(|v| {
        matches!(
            v.kind,
            ViolationKind::SqlInjection | ViolationKind::ScriptInjection | ViolationKind::JavascriptUri
        )
    });
    if has_injection {
        return SafetyCategory::SecurityRisk;
    }
    if contains_phi {
        let technical_only = phi_types
            .iter()
            .all(|t| matches!(t, PhiType::Url | PhiType::IpAddress));
        return if technical_only && !medical_context {
            SafetyCategory::PrivacyViolation
        } else {
            SafetyCategory::PhiDetected
        };
    }
    if violations.iter().any(|v| v.kind == ViolationKind::Discriminatory) {
        return SafetyCategory::PotentialHarm;
    }
    if violations.iter().any(|v| v.kind == ViolationKind::Profanity) {
        return SafetyCategory::Inappropriate;
    }
    SafetyCategory::Safe
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> SafetyFilter {
        SafetyFilter::new(ComplianceLevel::Standard)
    }

    #[test]
    fn test_ssn_gate_is_absolute() {
        for level in [
            ComplianceLevel::Standard,
            ComplianceLevel::Strict,
            ComplianceLevel::Audit,
        ] {
            let result = filter().assess("123-45-6789", None, Some(level));
            assert!(result.contains_phi, "level {level:?}");
            assert!(!result.safe, "level {level:?}");
        }
        // Level `none` disables the gate.
        let result = filter().assess("123-45-6789", None, Some(ComplianceLevel::None));
        assert!(result.contains_phi);
        assert!(result.safe);
    }

    #[test]
    fn test_patient_ssn_scenario() {
        let result = filter().assess("Patient John Smith SSN 123-45-6789", None, None);
        assert!(!result.safe);
        assert!(result.contains_phi);
        assert!(result.phi_types.contains(&PhiType::Ssn));
        assert!(result.reasons().iter().any(|r| r.contains("Social Security")));
        assert_eq!(result.category, SafetyCategory::PhiDetected);
    }

    #[test]
    fn test_clean_content_is_safe() {
        let result = filter().assess("What are the office hours this week?", None, None);
        assert!(result.safe);
        assert!(!result.contains_phi);
        assert!(result.violations.is_empty());
        assert_eq!(result.score, 1.0);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.category, SafetyCategory::Safe);
    }

    #[test]
    fn test_medical_context_penalty_stacks() {
        // Email (high, -0.3) with medical context (-0.2): score 0.5.
        let with_context = filter().assess(
            "email the clinic at a@b.com about the new prescription",
            None,
            None,
        );
        assert!(with_context.medical_context);
        assert!((with_context.score - 0.5).abs() < 1e-9);

        // Same identifier, no medical context: score 0.7.
        let without_context = filter().assess("email me at a@b.com about lunch", None, None);
        assert!(!without_context.medical_context);
        assert!((without_context.score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_strict_mode_extra_penalties() {
        // Email only: standard 0.7, strict 0.7 - 0.3 - 0.1 = 0.3.
        let strict = filter().assess(
            "email me at a@b.com about lunch",
            None,
            Some(ComplianceLevel::Strict),
        );
        assert!((strict.score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_profanity_below_strict_threshold() {
        // Profanity alone: medium, score 0.8. Passes standard (0.70),
        // fails strict (0.85).
        let standard = filter().assess("this damn printer again", None, None);
        assert!(standard.safe);
        assert_eq!(standard.category, SafetyCategory::Inappropriate);

        let strict = filter().assess(
            "this damn printer again",
            None,
            Some(ComplianceLevel::Strict),
        );
        // Strict adds the flat violation penalty: 0.8 - 0.1 = 0.7 < 0.85.
        assert!(!strict.safe);
    }

    #[test]
    fn test_script_tag_is_critical() {
        let result = filter().assess("<script>document.cookie</script>", None, None);
        assert!(!result.safe);
        assert_eq!(result.category, SafetyCategory::SecurityRisk);
    }

    #[test]
    fn test_url_only_is_privacy_violation() {
        let result = filter().assess("see https://example.com/page", None, None);
        assert_eq!(result.category, SafetyCategory::PrivacyViolation);
    }

    #[test]
    fn test_score_clamped_to_zero() {
        let result = filter().assess(
            "Patient John Smith, SSN 123-45-6789, MRN 1234567, phone 555-123-4567, \
             email j@x.com, lives at 12 Oak Street, seen 01/02/2024 for treatment \
             and prescription",
            None,
            Some(ComplianceLevel::Audit),
        );
        assert_eq!(result.score, 0.0);
        assert!(!result.safe);
    }
}
