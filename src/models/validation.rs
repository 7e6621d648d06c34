//! Validation record — one per document, the audit-trail spine of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{CertificateType, ValidationStatus, ValidationStep};

/// State of a single document validation run.
///
/// Mutated exclusively by the orchestrator; re-triggering resets the step
/// fields in place instead of creating a second record (the document id is
/// unique across records).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub id: Uuid,
    pub document_id: Uuid,

    pub status: ValidationStatus,
    pub current_step: ValidationStep,

    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_processing_secs: Option<i64>,

    // Readability
    pub readability_passed: Option<bool>,
    pub readability_score: Option<f64>,
    pub readability_issues: Vec<String>,

    // Relevance
    pub is_relevant: Option<bool>,
    pub detected_type: Option<CertificateType>,
    pub relevance_confidence: Option<f64>,

    // Authenticity
    pub authenticity_score: Option<f64>,
    pub authenticity_indicators: Vec<String>,
    pub authenticity_red_flags: Vec<String>,

    pub overall_confidence: Option<f64>,

    pub requires_manual_review: bool,
    pub flagged_reason: Option<String>,

    pub retry_count: i64,
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ValidationRecord {
    /// A fresh in-flight record for a newly triggered run.
    pub fn started(document_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            document_id,
            status: ValidationStatus::Processing,
            current_step: ValidationStep::NotStarted,
            started_at: Some(now),
            completed_at: None,
            total_processing_secs: None,
            readability_passed: None,
            readability_score: None,
            readability_issues: Vec::new(),
            is_relevant: None,
            detected_type: None,
            relevance_confidence: None,
            authenticity_score: None,
            authenticity_indicators: Vec::new(),
            authenticity_red_flags: Vec::new(),
            overall_confidence: None,
            requires_manual_review: false,
            flagged_reason: None,
            retry_count: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Clear all step output for an idempotent re-trigger, keeping identity
    /// and the link to the document.
    pub fn reset_for_retrigger(&mut self) {
        let now = Utc::now();
        self.status = ValidationStatus::Processing;
        self.current_step = ValidationStep::NotStarted;
        self.started_at = Some(now);
        self.completed_at = None;
        self.total_processing_secs = None;
        self.readability_passed = None;
        self.readability_score = None;
        self.readability_issues.clear();
        self.is_relevant = None;
        self.detected_type = None;
        self.relevance_confidence = None;
        self.authenticity_score = None;
        self.authenticity_indicators.clear();
        self.authenticity_red_flags.clear();
        self.overall_confidence = None;
        self.requires_manual_review = false;
        self.flagged_reason = None;
        self.retry_count = 0;
        self.error_message = None;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_record_is_processing_at_not_started() {
        let rec = ValidationRecord::started(Uuid::new_v4());
        assert_eq!(rec.status, ValidationStatus::Processing);
        assert_eq!(rec.current_step, ValidationStep::NotStarted);
        assert!(rec.started_at.is_some());
        assert!(!rec.requires_manual_review);
    }

    #[test]
    fn retrigger_reset_clears_step_fields_but_keeps_identity() {
        let mut rec = ValidationRecord::started(Uuid::new_v4());
        let id = rec.id;
        let doc = rec.document_id;

        rec.status = ValidationStatus::Failed;
        rec.current_step = ValidationStep::Extraction;
        rec.readability_score = Some(88.0);
        rec.authenticity_red_flags.push("missing signature".into());
        rec.overall_confidence = Some(42.0);
        rec.retry_count = 2;
        rec.error_message = Some("gateway unreachable".into());
        rec.requires_manual_review = true;

        rec.reset_for_retrigger();

        assert_eq!(rec.id, id);
        assert_eq!(rec.document_id, doc);
        assert_eq!(rec.status, ValidationStatus::Processing);
        assert_eq!(rec.current_step, ValidationStep::NotStarted);
        assert!(rec.readability_score.is_none());
        assert!(rec.authenticity_red_flags.is_empty());
        assert!(rec.overall_confidence.is_none());
        assert_eq!(rec.retry_count, 0);
        assert!(rec.error_message.is_none());
        assert!(!rec.requires_manual_review);
    }
}
