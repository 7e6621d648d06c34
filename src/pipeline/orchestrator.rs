//! The pipeline orchestrator — drives a claimed validation record through the
//! fixed step order, persisting partial state after every step.

use chrono::Utc;
use rusqlite::Connection;
use tracing::{error, info, warn};

use super::assessors::{
    assess_authenticity, assess_extraction, assess_readability, assess_relevance,
};
use super::escalation::{self, evaluate_escalation};
use super::confidence::compute_overall_confidence;
use super::preprocess::{PreparedImage, Preprocessor};
use super::ValidationError;
use crate::config::ValidationConfig;
use crate::db::{self, DatabaseError};
use crate::gateway::VisionGateway;
use crate::models::enums::{DocumentStatus, ReviewPriority, ValidationStatus};
use crate::models::{Document, ExtractedMetadata, ManualReviewEntry, ValidationRecord};
use crate::risk;

pub struct Orchestrator<'a> {
    gateway: &'a dyn VisionGateway,
    preprocessor: &'a dyn Preprocessor,
    config: ValidationConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        gateway: &'a dyn VisionGateway,
        preprocessor: &'a dyn Preprocessor,
        config: ValidationConfig,
    ) -> Self {
        Self {
            gateway,
            preprocessor,
            config,
        }
    }

    /// Execute a claimed run to its terminal state.
    ///
    /// Business failures (unreadable scan, failed extraction) are persisted as
    /// a `failed` record and returned as `Ok`; only persistence failures
    /// surface as `Err`, so the worker's retry layer reacts to infrastructure
    /// problems and nothing else.
    pub fn execute(
        &self,
        conn: &Connection,
        mut rec: ValidationRecord,
    ) -> Result<ValidationRecord, DatabaseError> {
        let document =
            db::get_document(conn, &rec.document_id)?.ok_or_else(|| DatabaseError::NotFound {
                entity_type: "document".to_string(),
                id: rec.document_id.to_string(),
            })?;

        info!(validation_id = %rec.id, document_id = %document.id, "validation run started");

        match self.run_steps(conn, &mut rec, &document) {
            Ok(metadata) => {
                self.complete(conn, &mut rec, &document, &metadata)?;
                Ok(rec)
            }
            Err(ValidationError::Database(e)) => Err(e),
            Err(e) => {
                self.fail(conn, &mut rec, &document, e)?;
                Ok(rec)
            }
        }
    }

    fn run_steps(
        &self,
        conn: &Connection,
        rec: &mut ValidationRecord,
        document: &Document,
    ) -> Result<ExtractedMetadata, ValidationError> {
        let file_path = document
            .file_path
            .as_deref()
            .ok_or(ValidationError::MissingFile)?;
        let image = self.preprocessor.prepare(std::path::Path::new(file_path))?;

        self.readability_step(conn, rec, &image)?;
        self.relevance_step(conn, rec, &image)?;
        self.authenticity_step(conn, rec, &image)?;
        self.extraction_step(conn, rec, document, &image)
    }

    /// Move the record to the successor step and persist it. The transition
    /// table in [`crate::models::enums::ValidationStep::next`] is the single
    /// source of step order.
    fn advance(&self, conn: &Connection, rec: &mut ValidationRecord) -> Result<(), DatabaseError> {
        rec.current_step = rec.current_step.next();
        rec.updated_at = Utc::now();
        db::update_validation(conn, rec)
    }

    fn readability_step(
        &self,
        conn: &Connection,
        rec: &mut ValidationRecord,
        image: &PreparedImage,
    ) -> Result<(), ValidationError> {
        self.advance(conn, rec)?;

        let a = assess_readability(self.gateway, &self.config, rec.id, &image.base64);
        db::insert_audit_entry(conn, &a.audit)?;

        rec.readability_passed = Some(a.value.passed);
        rec.readability_score = a.value.quality_score;
        rec.readability_issues = a.value.issues;
        rec.updated_at = Utc::now();
        db::update_validation(conn, rec)?;

        // Hard gate only when the model both flagged the scan unreadable and
        // scored it below the strict threshold.
        let hopeless = !a.value.passed
            && a.value
                .quality_score
                .map(|s| s < self.config.unreadable_quality_gate)
                .unwrap_or(false);
        if hopeless {
            let issues = rec.readability_issues.join(", ");
            return Err(ValidationError::Unreadable(if issues.is_empty() {
                "quality below readable threshold".to_string()
            } else {
                issues
            }));
        }
        Ok(())
    }

    fn relevance_step(
        &self,
        conn: &Connection,
        rec: &mut ValidationRecord,
        image: &PreparedImage,
    ) -> Result<(), ValidationError> {
        self.advance(conn, rec)?;

        let a = assess_relevance(self.gateway, &self.config, rec.id, &image.base64);
        db::insert_audit_entry(conn, &a.audit)?;

        rec.is_relevant = Some(a.value.is_relevant);
        rec.detected_type = a.value.detected_type;
        rec.relevance_confidence = a.value.confidence;
        rec.updated_at = Utc::now();
        db::update_validation(conn, rec)?;
        Ok(())
    }

    fn authenticity_step(
        &self,
        conn: &Connection,
        rec: &mut ValidationRecord,
        image: &PreparedImage,
    ) -> Result<(), ValidationError> {
        self.advance(conn, rec)?;

        let a = assess_authenticity(self.gateway, &self.config, rec.id, &image.base64);
        db::insert_audit_entry(conn, &a.audit)?;

        rec.authenticity_score = Some(a.value.score);
        rec.authenticity_indicators = a.value.indicators;
        rec.authenticity_red_flags = a.value.red_flags;
        rec.updated_at = Utc::now();
        db::update_validation(conn, rec)?;
        Ok(())
    }

    fn extraction_step(
        &self,
        conn: &Connection,
        rec: &mut ValidationRecord,
        document: &Document,
        image: &PreparedImage,
    ) -> Result<ExtractedMetadata, ValidationError> {
        self.advance(conn, rec)?;

        match assess_extraction(
            self.gateway,
            &self.config,
            rec.id,
            document.id,
            &image.base64,
            Utc::now().date_naive(),
        ) {
            Ok(a) => {
                db::insert_audit_entry(conn, &a.audit)?;
                db::upsert_metadata(conn, &a.value)?;
                Ok(a.value)
            }
            Err((e, audit)) => {
                db::insert_audit_entry(conn, &audit)?;
                Err(e)
            }
        }
    }

    /// Terminal success path: aggregate confidence, decide escalation, update
    /// the document, recompute vendor risk, stamp completion.
    fn complete(
        &self,
        conn: &Connection,
        rec: &mut ValidationRecord,
        document: &Document,
        metadata: &ExtractedMetadata,
    ) -> Result<(), DatabaseError> {
        self.advance(conn, rec)?;

        let confidence = compute_overall_confidence(rec, Some(metadata), &self.config);
        rec.overall_confidence = Some(confidence);

        let decision = evaluate_escalation(
            confidence,
            rec.authenticity_red_flags.len(),
            rec.is_relevant == Some(false),
            &self.config,
        );
        rec.requires_manual_review = decision.requires_review;
        rec.flagged_reason = decision.reason.clone();

        if decision.requires_review {
            let reason = decision.reason.as_deref().unwrap_or("requires review");
            let entry = ManualReviewEntry::queued(rec.id, decision.priority, reason);
            db::insert_review_if_absent(conn, &entry)?;
            db::update_document_status(conn, &document.id, DocumentStatus::Flagged)?;
        } else {
            db::update_document_status(conn, &document.id, DocumentStatus::Valid)?;
        }

        if metadata.expiry_date.is_some() {
            db::set_document_expiry(conn, &document.id, metadata.expiry_date)?;
        }

        // Risk recompute failure is logged but never fails the validation.
        if let Err(e) = risk::recalculate_vendor(conn, &document.vendor_id) {
            error!(vendor_id = %document.vendor_id, error = %e, "vendor risk recompute failed");
        }

        let now = Utc::now();
        rec.status = ValidationStatus::Completed;
        rec.current_step = rec.current_step.next();
        rec.completed_at = Some(now);
        rec.total_processing_secs = rec.started_at.map(|s| (now - s).num_seconds());
        rec.updated_at = now;
        db::update_validation(conn, rec)?;

        info!(
            validation_id = %rec.id,
            confidence,
            requires_review = rec.requires_manual_review,
            "validation run completed"
        );
        Ok(())
    }

    /// Terminal failure path: failed record, high-priority review, invalid
    /// document.
    fn fail(
        &self,
        conn: &Connection,
        rec: &mut ValidationRecord,
        document: &Document,
        err: ValidationError,
    ) -> Result<(), DatabaseError> {
        warn!(
            validation_id = %rec.id,
            step = %rec.current_step,
            error = %err,
            "validation run failed"
        );

        rec.status = ValidationStatus::Failed;
        rec.error_message = Some(err.to_string());
        rec.requires_manual_review = true;
        let mut reason = format!("Failed at {}: {err}", rec.current_step);
        escalation::bound_reason(&mut reason, self.config.max_flag_reason_len);
        rec.flagged_reason = Some(reason.clone());
        rec.updated_at = Utc::now();
        db::update_validation(conn, rec)?;

        let entry = ManualReviewEntry::queued(rec.id, ReviewPriority::High, &reason);
        db::insert_review_if_absent(conn, &entry)?;
        db::update_document_status(conn, &document.id, DocumentStatus::Invalid)?;
        Ok(())
    }
}
