//! Industry thresholds and the per-vendor risk snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RiskLevel;

/// Four ascending tonnes-CO2e-per-year breakpoints for one industry.
///
/// Created lazily from industry defaults the first time a vendor in that
/// industry is scored; mutable by configuration afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryThreshold {
    pub id: Uuid,
    pub industry: String,
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
    pub created_at: DateTime<Utc>,
}

impl IndustryThreshold {
    pub fn new(industry: &str, low: f64, medium: f64, high: f64, critical: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            industry: industry.to_string(),
            low,
            medium,
            high,
            critical,
            created_at: Utc::now(),
        }
    }

    /// Breakpoints must strictly ascend for the level classification to be
    /// well defined.
    pub fn is_ascending(&self) -> bool {
        self.low < self.medium && self.medium < self.high && self.high < self.critical
    }
}

/// Derived risk snapshot for one vendor — recomputed in full on every run,
/// never accumulated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorRiskProfile {
    pub id: Uuid,
    pub vendor_id: Uuid,

    pub risk_level: RiskLevel,
    pub risk_score: Option<f64>,

    pub total_documents: i64,
    pub validated_documents: i64,
    pub flagged_documents: i64,

    pub total_co2_tonnes: f64,
    pub exceeds_threshold: bool,
    pub avg_document_confidence: Option<f64>,

    pub updated_at: DateTime<Utc>,
}

impl VendorRiskProfile {
    /// Pre-calculation placeholder for a vendor that has never been scored.
    pub fn unknown(vendor_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            vendor_id,
            risk_level: RiskLevel::Unknown,
            risk_score: None,
            total_documents: 0,
            validated_documents: 0,
            flagged_documents: 0,
            total_co2_tonnes: 0.0,
            exceeds_threshold: false,
            avg_document_confidence: None,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascending_thresholds_accepted() {
        let t = IndustryThreshold::new("Manufacturing", 1000.0, 5000.0, 10000.0, 50000.0);
        assert!(t.is_ascending());
    }

    #[test]
    fn non_ascending_thresholds_rejected() {
        let t = IndustryThreshold::new("Broken", 5000.0, 5000.0, 10000.0, 50000.0);
        assert!(!t.is_ascending());
        let t = IndustryThreshold::new("Inverted", 9000.0, 5000.0, 10000.0, 50000.0);
        assert!(!t.is_ascending());
    }

    #[test]
    fn unscored_vendor_profile_is_unknown() {
        let profile = VendorRiskProfile::unknown(Uuid::new_v4());
        assert_eq!(profile.risk_level, RiskLevel::Unknown);
        assert!(profile.risk_score.is_none());
        assert_eq!(profile.total_documents, 0);
    }
}
