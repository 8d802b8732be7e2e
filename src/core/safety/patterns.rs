//! Pre-compiled detection patterns
//!
//! Regex families covering the HIPAA Safe-Harbor identifier categories,
//! plus injection and inappropriate-language screens. The Safe-Harbor list
//! must stay complete; removing a family silently weakens compliance.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{PhiType, ViolationSeverity};

/// Compile a known-good static pattern. A failure here is a code error; the
/// fallback pattern never matches so screening degrades loudly (via the
/// error log) instead of panicking.
fn pattern(re: &str) -> Regex {
    Regex::new(re).unwrap_or_else(|e| {
        tracing::error!("failed to compile safety pattern {re:?}: {e}");
        // [^\s\S] matches neither whitespace nor non-whitespace: empty set
        Regex::new(r"[^\s\S]").unwrap()
    })
}

/// One PHI pattern family
pub struct PhiPattern {
    pub phi_type: PhiType,
    pub regex: Regex,
    pub severity: ViolationSeverity,
    pub confidence: f64,
    pub description: &'static str,
    pub remediation: &'static [&'static str],
}

/// All Safe-Harbor identifier families, in detection order
pub static PHI_PATTERNS: Lazy<Vec<PhiPattern>> = Lazy::new(|| {
    vec![
        PhiPattern {
            phi_type: PhiType::NameWithTitle,
            regex: pattern(r"(?i)\b(?:mr|mrs|ms|dr|doctor|patient)\.?\s+[A-Za-z][a-z]+\b"),
            severity: ViolationSeverity::High,
            confidence: 0.8,
            description: "Name with personal or clinical title detected",
            remediation: &["Refer to the person by role or chart reference instead of name"],
        },
        PhiPattern {
            phi_type: PhiType::StreetAddress,
            regex: pattern(
                r"(?i)\b\d{1,5}\s+(?:[A-Za-z]+\s)+(?:street|st|avenue|ave|road|rd|drive|dr|lane|ln|boulevard|blvd|court|ct|circle|cir|way)\b",
            ),
            severity: ViolationSeverity::High,
            confidence: 0.85,
            description: "Street address detected",
            remediation: &["Remove the street address"],
        },
        PhiPattern {
            phi_type: PhiType::Date,
            regex: pattern(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b"),
            severity: ViolationSeverity::Medium,
            confidence: 0.7,
            description: "Calendar date detected",
            remediation: &["Replace exact dates with a relative timeframe"],
        },
        PhiPattern {
            phi_type: PhiType::PhoneNumber,
            regex: pattern(r"\b\d{3}[-.]\d{3}[-.]\d{4}\b|\(\d{3}\)\s?\d{3}-\d{4}"),
            severity: ViolationSeverity::High,
            confidence: 0.85,
            description: "Phone number detected",
            remediation: &["Remove the phone number"],
        },
        PhiPattern {
            phi_type: PhiType::FaxNumber,
            regex: pattern(r"(?i)\bfax[:#\s]*(?:\(\d{3}\)\s?|\d{3}[-.])\d{3}[-.]?\d{4}\b"),
            severity: ViolationSeverity::High,
            confidence: 0.85,
            description: "Fax number detected",
            remediation: &["Remove the fax number"],
        },
        PhiPattern {
            phi_type: PhiType::Email,
            regex: pattern(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
            severity: ViolationSeverity::High,
            confidence: 0.9,
            description: "Email address detected",
            remediation: &["Remove the email address"],
        },
        PhiPattern {
            phi_type: PhiType::Ssn,
            regex: pattern(r"\b\d{3}-\d{2}-\d{4}\b"),
            severity: ViolationSeverity::Critical,
            confidence: 0.95,
            description: "Social Security number detected",
            remediation: &[
                "Remove the Social Security number",
                "Use an internal identifier instead",
            ],
        },
        PhiPattern {
            phi_type: PhiType::MedicalRecordNumber,
            regex: pattern(r"(?i)\b(?:mrn|medical record(?:\s+number)?)[:#\s]*\d{5,10}\b"),
            severity: ViolationSeverity::Critical,
            confidence: 0.9,
            description: "Medical record number detected",
            remediation: &["Remove the medical record number"],
        },
        PhiPattern {
            phi_type: PhiType::HealthPlanNumber,
            regex: pattern(r"(?i)\b(?:member|policy|plan)\s*(?:id|number|no\.?|#)[:\s]*[A-Z0-9-]{6,}\b"),
            severity: ViolationSeverity::High,
            confidence: 0.8,
            description: "Health plan beneficiary number detected",
            remediation: &["Remove the plan or member number"],
        },
        PhiPattern {
            phi_type: PhiType::AccountNumber,
            regex: pattern(r"(?i)\baccount\s*(?:id|number|no\.?|#)[:\s]*[A-Z0-9-]{6,}\b"),
            severity: ViolationSeverity::High,
            confidence: 0.8,
            description: "Account number detected",
            remediation: &["Remove the account number"],
        },
        PhiPattern {
            phi_type: PhiType::CertificateNumber,
            regex: pattern(r"(?i)\b(?:certificate|license)\s*(?:id|number|no\.?|#)[:\s]*[A-Z0-9-]{5,}\b"),
            severity: ViolationSeverity::High,
            confidence: 0.8,
            description: "Certificate or license number detected",
            remediation: &["Remove the certificate or license number"],
        },
        PhiPattern {
            phi_type: PhiType::VehicleIdentifier,
            regex: pattern(r"\b[A-HJ-NPR-Z0-9]{17}\b"),
            severity: ViolationSeverity::Medium,
            confidence: 0.6,
            description: "Vehicle identification number detected",
            remediation: &["Remove the vehicle identifier"],
        },
        PhiPattern {
            phi_type: PhiType::DeviceIdentifier,
            regex: pattern(r"(?i)\b(?:serial|device)\s*(?:id|number|no\.?|#)[:\s]*[A-Z0-9-]{4,}\b"),
            severity: ViolationSeverity::Medium,
            confidence: 0.7,
            description: "Device identifier or serial number detected",
            remediation: &["Remove the device identifier"],
        },
        PhiPattern {
            phi_type: PhiType::Url,
            regex: pattern(r"\bhttps?://[^\s<>]+"),
            severity: ViolationSeverity::Medium,
            confidence: 0.75,
            description: "Web URL detected",
            remediation: &["Remove the URL"],
        },
        PhiPattern {
            phi_type: PhiType::IpAddress,
            regex: pattern(r"\b(?:\d{1,3}\.){3}\d{1,3}\b"),
            severity: ViolationSeverity::Medium,
            confidence: 0.75,
            description: "IP address detected",
            remediation: &["Remove the IP address"],
        },
        PhiPattern {
            phi_type: PhiType::Biometric,
            regex: pattern(
                r"(?i)\b(?:fingerprint|retina(?:l)?\s+scan|voice\s*print|biometric|photo(?:graph)?\s+of\s+(?:the\s+)?patient)\b",
            ),
            severity: ViolationSeverity::High,
            confidence: 0.7,
            description: "Biometric or full-face photograph reference detected",
            remediation: &["Remove the biometric reference"],
        },
    ]
});

/// SQL keyword pairs that look like query injection
pub static SQL_INJECTION: Lazy<Regex> = Lazy::new(|| {
    pattern(r"(?i)\b(?:select|insert|update|delete|drop|union)\b[\s\S]{0,80}?\b(?:from|into|table|where|values)\b")
});

/// Embedded script tag
pub static SCRIPT_TAG: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)<\s*script\b"));

/// javascript: URI scheme
pub static JAVASCRIPT_URI: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)\bjavascript\s*:"));

/// Profanity screen; mild list, matched on word boundaries
pub static PROFANITY: Lazy<Regex> = Lazy::new(|| {
    pattern(r"(?i)\b(?:damn|hell|crap|bastard|bitch|shit|fuck(?:ing|er)?|asshole)\b")
});

/// Discriminatory language screen
pub static DISCRIMINATORY: Lazy<Regex> = Lazy::new(|| {
    pattern(r"(?i)\b(?:racist|sexist|bigot(?:ed)?|homophobic|transphobic|slur)\b")
});

/// Keywords indicating the text is about clinical care. PHI inside medical
/// context carries an extra score penalty.
const MEDICAL_CONTEXT_KEYWORDS: &[&str] = &[
    "patient",
    "diagnosis",
    "prescription",
    "treatment",
    "symptom",
    "medication",
    "clinic",
    "physician",
    "dosage",
    "medical",
    "appointment",
    "surgery",
    "therapy",
    "lab result",
    "chart",
];

/// Count distinct medical-context keywords present in the text
pub fn medical_context_matches(text: &str) -> usize {
    let lowered = text.to_lowercase();
    MEDICAL_CONTEXT_KEYWORDS
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .count()
}
