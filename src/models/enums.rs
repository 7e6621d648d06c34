//! Closed enumerations shared across the validation pipeline and risk engine.
//!
//! Every enum persists as its snake_case string form and round-trips through
//! `as_str`/`from_str`.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════
// Validation lifecycle
// ═══════════════════════════════════════════

/// Lifecycle status of a validation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// A terminal record may be reset and re-run; an in-flight one may not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position of a run inside the fixed step order.
///
/// Steps only ever advance forward; the orchestrator drives them through
/// [`ValidationStep::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStep {
    NotStarted,
    Readability,
    Relevance,
    Authenticity,
    Extraction,
    RiskAnalysis,
    Completed,
}

impl ValidationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Readability => "readability",
            Self::Relevance => "relevance",
            Self::Authenticity => "authenticity",
            Self::Extraction => "extraction",
            Self::RiskAnalysis => "risk_analysis",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(Self::NotStarted),
            "readability" => Some(Self::Readability),
            "relevance" => Some(Self::Relevance),
            "authenticity" => Some(Self::Authenticity),
            "extraction" => Some(Self::Extraction),
            "risk_analysis" => Some(Self::RiskAnalysis),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// The successor in the fixed step order. `Completed` is a fixpoint.
    pub fn next(&self) -> Self {
        match self {
            Self::NotStarted => Self::Readability,
            Self::Readability => Self::Relevance,
            Self::Relevance => Self::Authenticity,
            Self::Authenticity => Self::Extraction,
            Self::Extraction => Self::RiskAnalysis,
            Self::RiskAnalysis => Self::Completed,
            Self::Completed => Self::Completed,
        }
    }

    /// Ordinal used to assert the non-decreasing walk invariant.
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Readability => 1,
            Self::Relevance => 2,
            Self::Authenticity => 3,
            Self::Extraction => 4,
            Self::RiskAnalysis => 5,
            Self::Completed => 6,
        }
    }

    pub fn all() -> &'static [ValidationStep] {
        &[
            Self::NotStarted,
            Self::Readability,
            Self::Relevance,
            Self::Authenticity,
            Self::Extraction,
            Self::RiskAnalysis,
            Self::Completed,
        ]
    }
}

impl std::fmt::Display for ValidationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// Documents
// ═══════════════════════════════════════════

/// Outcome-facing status of a submitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Valid,
    Flagged,
    Invalid,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Valid => "valid",
            Self::Flagged => "flagged",
            Self::Invalid => "invalid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "valid" => Some(Self::Valid),
            "flagged" => Some(Self::Flagged),
            "invalid" => Some(Self::Invalid),
            _ => None,
        }
    }
}

/// The closed set of compliance document types the relevance step maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateType {
    CarbonCreditCertificate,
    EmissionReport,
    CarbonOffsetCertificate,
    GhgInventoryReport,
    SustainabilityCertificate,
    Iso14064Certificate,
}

impl CertificateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CarbonCreditCertificate => "carbon_credit_certificate",
            Self::EmissionReport => "emission_report",
            Self::CarbonOffsetCertificate => "carbon_offset_certificate",
            Self::GhgInventoryReport => "ghg_inventory_report",
            Self::SustainabilityCertificate => "sustainability_certificate",
            Self::Iso14064Certificate => "iso_14064_certificate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "carbon_credit_certificate" => Some(Self::CarbonCreditCertificate),
            "emission_report" => Some(Self::EmissionReport),
            "carbon_offset_certificate" => Some(Self::CarbonOffsetCertificate),
            "ghg_inventory_report" => Some(Self::GhgInventoryReport),
            "sustainability_certificate" => Some(Self::SustainabilityCertificate),
            "iso_14064_certificate" => Some(Self::Iso14064Certificate),
            _ => None,
        }
    }

    /// Human-readable label as it appears on real certificates (and in the
    /// relevance prompt).
    pub fn label(&self) -> &'static str {
        match self {
            Self::CarbonCreditCertificate => "Carbon Credit Certificate",
            Self::EmissionReport => "Emission Report",
            Self::CarbonOffsetCertificate => "Carbon Offset Certificate",
            Self::GhgInventoryReport => "GHG Inventory Report",
            Self::SustainabilityCertificate => "Sustainability Certificate",
            Self::Iso14064Certificate => "ISO 14064 Certificate",
        }
    }

    pub fn all() -> &'static [CertificateType] {
        &[
            Self::CarbonCreditCertificate,
            Self::EmissionReport,
            Self::CarbonOffsetCertificate,
            Self::GhgInventoryReport,
            Self::SustainabilityCertificate,
            Self::Iso14064Certificate,
        ]
    }
}

impl std::fmt::Display for CertificateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// Emissions
// ═══════════════════════════════════════════

/// Canonical CO2e units after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Co2Unit {
    Tonnes,
    Kg,
}

impl Co2Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tonnes => "tonnes",
            Self::Kg => "kg",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tonnes" => Some(Self::Tonnes),
            "kg" => Some(Self::Kg),
            _ => None,
        }
    }
}

impl std::fmt::Display for Co2Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Vendor risk classification derived from total emissions vs industry
/// thresholds. `Unknown` is the pre-calculation default, never an output of
/// the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// Manual review
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewPriority {
    Low,
    Medium,
    High,
}

impl ReviewPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    InProgress,
    Resolved,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

/// Decision a human reviewer records when resolving a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
    NeedsChanges,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::NeedsChanges => "needs_changes",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "approve" => Some(Self::Approve),
            "reject" => Some(Self::Reject),
            "needs_changes" => Some(Self::NeedsChanges),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_step_walk_is_forward_only() {
        let mut step = ValidationStep::NotStarted;
        let mut last = step.ordinal();
        while step != ValidationStep::Completed {
            step = step.next();
            assert!(step.ordinal() > last, "step order must strictly advance");
            last = step.ordinal();
        }
        assert_eq!(ValidationStep::Completed.next(), ValidationStep::Completed);
    }

    #[test]
    fn validation_step_roundtrip() {
        for step in ValidationStep::all() {
            assert_eq!(ValidationStep::from_str(step.as_str()), Some(*step));
        }
        assert_eq!(ValidationStep::from_str("bogus"), None);
    }

    #[test]
    fn validation_status_terminality() {
        assert!(ValidationStatus::Completed.is_terminal());
        assert!(ValidationStatus::Failed.is_terminal());
        assert!(!ValidationStatus::Processing.is_terminal());
        assert!(!ValidationStatus::Pending.is_terminal());
    }

    #[test]
    fn certificate_type_roundtrip() {
        for ct in CertificateType::all() {
            assert_eq!(CertificateType::from_str(ct.as_str()), Some(*ct));
        }
    }

    #[test]
    fn certificate_type_labels_match_prompt_wording() {
        assert_eq!(CertificateType::EmissionReport.label(), "Emission Report");
        assert_eq!(
            CertificateType::Iso14064Certificate.label(),
            "ISO 14064 Certificate"
        );
    }

    #[test]
    fn co2_unit_closed_set() {
        assert_eq!(Co2Unit::from_str("tonnes"), Some(Co2Unit::Tonnes));
        assert_eq!(Co2Unit::from_str("kg"), Some(Co2Unit::Kg));
        assert_eq!(Co2Unit::from_str("metric_tons"), None);
    }

    #[test]
    fn review_priority_orders_low_to_high() {
        assert!(ReviewPriority::Low < ReviewPriority::Medium);
        assert!(ReviewPriority::Medium < ReviewPriority::High);
    }

    #[test]
    fn enums_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&ValidationStep::RiskAnalysis).unwrap(),
            "\"risk_analysis\""
        );
        assert_eq!(
            serde_json::to_string(&RiskLevel::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(
            serde_json::to_string(&ReviewDecision::NeedsChanges).unwrap(),
            "\"needs_changes\""
        );
    }
}
