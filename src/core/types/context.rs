//! Calling-application and use-case identifiers
//!
//! Every request is attributed to exactly one internal application; budgets
//! and quotas are isolated per application. Unknown application strings are
//! a configuration error and fail deserialization, never a runtime fallback.

use serde::{Deserialize, Serialize};

/// The internal application that issued a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationContext {
    AiReceptionist,
    ClinicalStaffing,
    CheckinKiosk,
    EosL10,
    Inventory,
    Handouts,
    MedicationAuth,
    PharmaScheduling,
    CallCenterOps,
    BatchCloseout,
    SocialsReviews,
    ComplianceTraining,
    PlatformDashboard,
    ConfigDashboard,
    ComponentShowcase,
    Staff,
    IntegrationStatus,
}

impl ApplicationContext {
    /// All known callers, in declaration order
    pub const ALL: [ApplicationContext; 17] = [
        Self::AiReceptionist,
        Self::ClinicalStaffing,
        Self::CheckinKiosk,
        Self::EosL10,
        Self::Inventory,
        Self::Handouts,
        Self::MedicationAuth,
        Self::PharmaScheduling,
        Self::CallCenterOps,
        Self::BatchCloseout,
        Self::SocialsReviews,
        Self::ComplianceTraining,
        Self::PlatformDashboard,
        Self::ConfigDashboard,
        Self::ComponentShowcase,
        Self::Staff,
        Self::IntegrationStatus,
    ];

    /// Kebab-case wire name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiReceptionist => "ai-receptionist",
            Self::ClinicalStaffing => "clinical-staffing",
            Self::CheckinKiosk => "checkin-kiosk",
            Self::EosL10 => "eos-l10",
            Self::Inventory => "inventory",
            Self::Handouts => "handouts",
            Self::MedicationAuth => "medication-auth",
            Self::PharmaScheduling => "pharma-scheduling",
            Self::CallCenterOps => "call-center-ops",
            Self::BatchCloseout => "batch-closeout",
            Self::SocialsReviews => "socials-reviews",
            Self::ComplianceTraining => "compliance-training",
            Self::PlatformDashboard => "platform-dashboard",
            Self::ConfigDashboard => "config-dashboard",
            Self::ComponentShowcase => "component-showcase",
            Self::Staff => "staff",
            Self::IntegrationStatus => "integration-status",
        }
    }
}

impl std::fmt::Display for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workload tag used for model selection and system-prompt choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    PatientCommunication,
    ClinicalDocumentation,
    BusinessIntelligence,
    DocumentProcessing,
    DocumentGeneration,
    VoiceProcessing,
    SafetyFiltering,
    RealTimeChat,
    ComplexReasoning,
    Embeddings,
    Reranking,
}

impl std::fmt::Display for UseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PatientCommunication => "patient_communication",
            Self::ClinicalDocumentation => "clinical_documentation",
            Self::BusinessIntelligence => "business_intelligence",
            Self::DocumentProcessing => "document_processing",
            Self::DocumentGeneration => "document_generation",
            Self::VoiceProcessing => "voice_processing",
            Self::SafetyFiltering => "safety_filtering",
            Self::RealTimeChat => "real_time_chat",
            Self::ComplexReasoning => "complex_reasoning",
            Self::Embeddings => "embeddings",
            Self::Reranking => "reranking",
        };
        write!(f, "{}", s)
    }
}
