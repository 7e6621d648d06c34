//! Service layer: the trigger boundary callers go through.
//!
//! Wraps the claim, the worker retry loop around the orchestrator, manual
//! review handling, and reporting queries.

use rusqlite::Connection;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ValidationConfig;
use crate::db::{self, ClaimOutcome, DatabaseError};
use crate::gateway::VisionGateway;
use crate::models::enums::{DocumentStatus, ReviewDecision};
use crate::models::{AuditEntry, ManualReviewEntry, ValidationRecord, VendorRiskProfile};
use crate::pipeline::preprocess::Preprocessor;
use crate::pipeline::Orchestrator;
use crate::risk;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    #[error("Document {0} has no file attached")]
    NoFileAttached(Uuid),

    #[error("A validation is already running for document {0}")]
    AlreadyRunning(Uuid),

    #[error("Manual review not found: {0}")]
    ReviewNotFound(Uuid),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Aggregate counts over all validation runs, for dashboards.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationStats {
    pub total: i64,
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
    pub flagged_for_review: i64,
    pub average_confidence: Option<f64>,
    pub open_reviews: i64,
}

pub struct ValidationService<'a> {
    gateway: &'a dyn VisionGateway,
    preprocessor: &'a dyn Preprocessor,
    config: ValidationConfig,
}

impl<'a> ValidationService<'a> {
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

    /// Trigger a validation run for a document and drive it to a terminal
    /// state. Re-triggering a finished document resets and reruns its record;
    /// triggering while a run is in flight is rejected.
    pub fn start_validation(
        &self,
        conn: &Connection,
        document_id: &Uuid,
    ) -> Result<ValidationRecord, ServiceError> {
        let document = db::get_document(conn, document_id)?
            .ok_or(ServiceError::DocumentNotFound(*document_id))?;
        if document.file_path.is_none() {
            // Reject before claiming so a doomed trigger leaves no record.
            return Err(ServiceError::NoFileAttached(*document_id));
        }

        let rec = match db::claim_validation(conn, document_id)? {
            ClaimOutcome::Fresh(rec) => rec,
            ClaimOutcome::Reset(rec) => {
                info!(validation_id = %rec.id, "re-triggered terminal validation");
                rec
            }
            ClaimOutcome::Busy(_) => return Err(ServiceError::AlreadyRunning(*document_id)),
        };

        self.run_with_retry(conn, rec).map_err(Into::into)
    }

    /// Retry the run when persistence fails mid-flight. Business outcomes,
    /// including failed validations, come back as `Ok` on the first pass.
    fn run_with_retry(
        &self,
        conn: &Connection,
        mut rec: ValidationRecord,
    ) -> Result<ValidationRecord, DatabaseError> {
        let orchestrator = Orchestrator::new(self.gateway, self.preprocessor, self.config.clone());

        let mut last_err = None;
        for attempt in 1..=self.config.worker_attempts {
            rec.retry_count = i64::from(attempt - 1);
            match orchestrator.execute(conn, rec.clone()) {
                Ok(done) => return Ok(done),
                Err(e) => {
                    warn!(
                        validation_id = %rec.id,
                        attempt,
                        error = %e,
                        "validation attempt hit a storage error"
                    );
                    if attempt < self.config.worker_attempts {
                        std::thread::sleep(std::time::Duration::from_millis(
                            self.config.worker_retry_delay_ms * u64::from(attempt),
                        ));
                    }
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            DatabaseError::ConstraintViolation("retry loop ran zero attempts".to_string())
        }))
    }

    pub fn recalculate_vendor_risk(
        &self,
        conn: &Connection,
        vendor_id: &Uuid,
    ) -> Result<VendorRiskProfile, ServiceError> {
        risk::recalculate_vendor(conn, vendor_id).map_err(Into::into)
    }

    pub fn audit_trail(
        &self,
        conn: &Connection,
        validation_id: &Uuid,
    ) -> Result<Vec<AuditEntry>, ServiceError> {
        db::list_audit_entries(conn, validation_id).map_err(Into::into)
    }

    pub fn open_reviews(&self, conn: &Connection) -> Result<Vec<ManualReviewEntry>, ServiceError> {
        db::list_open_reviews(conn).map_err(Into::into)
    }

    pub fn assign_review(
        &self,
        conn: &Connection,
        review_id: &Uuid,
        assignee: &str,
    ) -> Result<(), ServiceError> {
        db::assign_review(conn, review_id, assignee).map_err(Into::into)
    }

    /// Resolve a queued review and write the verdict back to the document:
    /// approve clears it to valid, reject marks it invalid, needs-changes
    /// leaves the document flagged for resubmission.
    pub fn resolve_review(
        &self,
        conn: &Connection,
        review_id: &Uuid,
        decision: ReviewDecision,
        notes: Option<&str>,
    ) -> Result<(), ServiceError> {
        let review = db::get_review(conn, review_id)?
            .ok_or(ServiceError::ReviewNotFound(*review_id))?;
        db::resolve_review(conn, review_id, decision, notes)?;

        let rec = db::get_validation(conn, &review.validation_id)?.ok_or({
            DatabaseError::NotFound {
                entity_type: "document_validation".to_string(),
                id: review.validation_id.to_string(),
            }
        })?;
        match decision {
            ReviewDecision::Approve => {
                db::update_document_status(conn, &rec.document_id, DocumentStatus::Valid)?;
            }
            ReviewDecision::Reject => {
                db::update_document_status(conn, &rec.document_id, DocumentStatus::Invalid)?;
            }
            ReviewDecision::NeedsChanges => {}
        }

        info!(
            review_id = %review_id,
            decision = decision.as_str(),
            "manual review resolved"
        );
        Ok(())
    }

    pub fn validation_stats(&self, conn: &Connection) -> Result<ValidationStats, ServiceError> {
        let (total, pending, processing, completed, failed, flagged, avg) = conn
            .query_row(
                "SELECT COUNT(*),
                        SUM(status = 'pending'),
                        SUM(status = 'processing'),
                        SUM(status = 'completed'),
                        SUM(status = 'failed'),
                        SUM(requires_manual_review),
                        AVG(overall_confidence)
                 FROM document_validations",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                        row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                        row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                        row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                        row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                        row.get::<_, Option<f64>>(6)?,
                    ))
                },
            )
            .map_err(DatabaseError::from)?;

        let open_reviews: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM manual_reviews WHERE status != 'resolved'",
                [],
                |row| row.get(0),
            )
            .map_err(DatabaseError::from)?;

        Ok(ValidationStats {
            total,
            pending,
            processing,
            completed,
            failed,
            flagged_for_review: flagged,
            average_confidence: avg.map(|a| (a * 100.0).round() / 100.0),
            open_reviews,
        })
    }
}
