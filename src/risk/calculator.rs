//! Vendor risk calculation.
//!
//! The profile is a snapshot recomputed in full from the vendor's documents
//! on every run, never an accumulator.

use chrono::{Duration, NaiveDate, Utc};
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use super::defaults::default_threshold;
use crate::db::{self, DatabaseError};
use crate::models::enums::{DocumentStatus, RiskLevel, ValidationStatus};
use crate::models::{IndustryThreshold, VendorRiskProfile};

/// What the calculator needs to know about one document.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub status: DocumentStatus,
    pub completed: bool,
    pub confidence: Option<f64>,
    pub co2_tonnes: Option<f64>,
    pub expiry_date: Option<NaiveDate>,
}

/// Recompute and persist a vendor's risk profile, mirroring the level onto
/// the vendor row. Lazily seeds the industry threshold.
pub fn recalculate_vendor(
    conn: &Connection,
    vendor_id: &Uuid,
) -> Result<VendorRiskProfile, DatabaseError> {
    let vendor = db::get_vendor(conn, vendor_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "vendor".to_string(),
        id: vendor_id.to_string(),
    })?;
    let threshold = db::ensure_threshold(conn, &default_threshold(&vendor.industry))?;

    let mut snapshots = Vec::new();
    for doc in db::list_vendor_documents(conn, vendor_id)? {
        let validation = db::get_validation_for_document(conn, &doc.id)?;
        let completed = validation
            .as_ref()
            .map(|v| v.status == ValidationStatus::Completed)
            .unwrap_or(false);
        let confidence = validation.as_ref().and_then(|v| v.overall_confidence);
        let co2_tonnes = match &validation {
            Some(v) if completed => {
                db::get_metadata_for_validation(conn, &v.id)?.and_then(|m| m.co2_tonnes())
            }
            _ => None,
        };
        snapshots.push(DocumentSnapshot {
            status: doc.status,
            completed,
            confidence,
            co2_tonnes,
            expiry_date: doc.expiry_date,
        });
    }

    let profile = compute_profile(*vendor_id, &snapshots, &threshold, Utc::now().date_naive());

    db::upsert_risk_profile(conn, &profile)?;
    db::update_vendor_risk_level(conn, vendor_id, profile.risk_level)?;

    info!(
        %vendor_id,
        risk_level = %profile.risk_level,
        total_co2_tonnes = profile.total_co2_tonnes,
        "vendor risk profile recomputed"
    );
    Ok(profile)
}

/// Pure scoring core, deterministic given its inputs.
pub fn compute_profile(
    vendor_id: Uuid,
    documents: &[DocumentSnapshot],
    threshold: &IndustryThreshold,
    today: NaiveDate,
) -> VendorRiskProfile {
    let total = documents.len() as i64;
    let validated = documents.iter().filter(|d| d.completed).count() as i64;
    let flagged = documents
        .iter()
        .filter(|d| d.status == DocumentStatus::Flagged)
        .count() as i64;

    let total_co2: f64 = documents.iter().filter_map(|d| d.co2_tonnes).sum();

    let confidences: Vec<f64> = documents.iter().filter_map(|d| d.confidence).collect();
    let avg_confidence = if confidences.is_empty() {
        None
    } else {
        Some(confidences.iter().sum::<f64>() / confidences.len() as f64)
    };

    let risk_level = classify(total_co2, validated, total, threshold);
    let risk_score = score(total_co2, flagged, total, documents, threshold, today);

    VendorRiskProfile {
        id: Uuid::new_v4(),
        vendor_id,
        risk_level,
        risk_score: Some(risk_score),
        total_documents: total,
        validated_documents: validated,
        flagged_documents: flagged,
        total_co2_tonnes: total_co2,
        exceeds_threshold: total_co2 > threshold.high,
        avg_document_confidence: avg_confidence,
        updated_at: Utc::now(),
    }
}

/// Emission level against the ascending thresholds, with explicit no-data
/// handling: no validated documents means unknown, not optimistic.
fn classify(
    total_co2: f64,
    validated: i64,
    total: i64,
    threshold: &IndustryThreshold,
) -> RiskLevel {
    if validated == 0 {
        return RiskLevel::Medium;
    }
    if total_co2 == 0.0 {
        // Data exists but no measured emissions: suspicious in proportion to
        // how little of the portfolio has been validated.
        return if validated * 2 < total {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };
    }

    if total_co2 <= threshold.low {
        RiskLevel::Low
    } else if total_co2 <= threshold.medium {
        RiskLevel::Medium
    } else if total_co2 <= threshold.high {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

/// Advisory 0-100 score: emissions bucket + flagged ratio + expiry proximity.
fn score(
    total_co2: f64,
    flagged: i64,
    total: i64,
    documents: &[DocumentSnapshot],
    threshold: &IndustryThreshold,
    today: NaiveDate,
) -> f64 {
    let emissions_component = if total_co2 > threshold.critical {
        50.0
    } else if total_co2 > threshold.high {
        40.0
    } else if total_co2 > threshold.medium {
        25.0
    } else if total_co2 > threshold.low {
        10.0
    } else {
        0.0
    };

    let flag_component = if total > 0 {
        (flagged as f64 / total as f64) * 25.0
    } else {
        0.0
    };

    let soonest_expiry = documents.iter().filter_map(|d| d.expiry_date).min();
    let expiry_component = match soonest_expiry {
        Some(date) if date < today => 25.0,
        Some(date) if date <= today + Duration::days(30) => 15.0,
        Some(date) if date <= today + Duration::days(90) => 5.0,
        _ => 0.0,
    };

    (emissions_component + flag_component + expiry_component).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, open_memory_database};
    use crate::models::{Document, ExtractedMetadata, ValidationRecord, Vendor};

    fn threshold() -> IndustryThreshold {
        IndustryThreshold::new("Manufacturing", 1_000.0, 5_000.0, 10_000.0, 50_000.0)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 26).unwrap()
    }

    fn snapshot(co2: Option<f64>, status: DocumentStatus, completed: bool) -> DocumentSnapshot {
        DocumentSnapshot {
            status,
            completed,
            confidence: Some(80.0),
            co2_tonnes: co2,
            expiry_date: None,
        }
    }

    #[test]
    fn no_validated_documents_is_medium() {
        let docs = vec![snapshot(None, DocumentStatus::Pending, false)];
        let p = compute_profile(Uuid::new_v4(), &docs, &threshold(), today());
        assert_eq!(p.risk_level, RiskLevel::Medium);
        assert_eq!(p.validated_documents, 0);
    }

    #[test]
    fn empty_portfolio_is_medium() {
        let p = compute_profile(Uuid::new_v4(), &[], &threshold(), today());
        assert_eq!(p.risk_level, RiskLevel::Medium);
        assert_eq!(p.total_documents, 0);
    }

    #[test]
    fn zero_emissions_with_sparse_validation_is_high() {
        // 1 of 3 validated, nothing measured.
        let docs = vec![
            snapshot(None, DocumentStatus::Valid, true),
            snapshot(None, DocumentStatus::Pending, false),
            snapshot(None, DocumentStatus::Pending, false),
        ];
        let p = compute_profile(Uuid::new_v4(), &docs, &threshold(), today());
        assert_eq!(p.risk_level, RiskLevel::High);
    }

    #[test]
    fn zero_emissions_with_mostly_validated_portfolio_is_medium() {
        let docs = vec![
            snapshot(None, DocumentStatus::Valid, true),
            snapshot(None, DocumentStatus::Valid, true),
            snapshot(None, DocumentStatus::Pending, false),
        ];
        let p = compute_profile(Uuid::new_v4(), &docs, &threshold(), today());
        assert_eq!(p.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn level_follows_ascending_thresholds() {
        for (co2, expected) in [
            (500.0, RiskLevel::Low),
            (1_000.0, RiskLevel::Low),
            (4_000.0, RiskLevel::Medium),
            (9_999.0, RiskLevel::High),
            (60_000.0, RiskLevel::Critical),
        ] {
            let docs = vec![snapshot(Some(co2), DocumentStatus::Valid, true)];
            let p = compute_profile(Uuid::new_v4(), &docs, &threshold(), today());
            assert_eq!(p.risk_level, expected, "at {co2} tonnes");
        }
    }

    #[test]
    fn exceeds_threshold_tracks_high_breakpoint() {
        let docs = vec![snapshot(Some(10_001.0), DocumentStatus::Valid, true)];
        let p = compute_profile(Uuid::new_v4(), &docs, &threshold(), today());
        assert!(p.exceeds_threshold);

        let docs = vec![snapshot(Some(10_000.0), DocumentStatus::Valid, true)];
        let p = compute_profile(Uuid::new_v4(), &docs, &threshold(), today());
        assert!(!p.exceeds_threshold);
    }

    #[test]
    fn score_combines_components_and_caps() {
        // Over-critical emissions (50) + all flagged (25) + expired (25) = 100.
        let docs = vec![DocumentSnapshot {
            status: DocumentStatus::Flagged,
            completed: true,
            confidence: Some(40.0),
            co2_tonnes: Some(60_000.0),
            expiry_date: NaiveDate::from_ymd_opt(2026, 1, 1),
        }];
        let p = compute_profile(Uuid::new_v4(), &docs, &threshold(), today());
        assert_eq!(p.risk_score, Some(100.0));
    }

    #[test]
    fn expiry_proximity_tiers() {
        for (date, expected) in [
            (NaiveDate::from_ymd_opt(2026, 9, 10).unwrap(), 15.0),
            (NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(), 5.0),
            (NaiveDate::from_ymd_opt(2027, 6, 1).unwrap(), 0.0),
        ] {
            let docs = vec![DocumentSnapshot {
                status: DocumentStatus::Valid,
                completed: true,
                confidence: None,
                co2_tonnes: Some(100.0),
                expiry_date: Some(date),
            }];
            let p = compute_profile(Uuid::new_v4(), &docs, &threshold(), today());
            assert_eq!(p.risk_score, Some(expected), "expiry {date}");
        }
    }

    #[test]
    fn kilogram_metadata_normalizes_before_summing() {
        let conn = open_memory_database().unwrap();
        let vendor = Vendor::new("Acme Foundry", "Manufacturing");
        db::insert_vendor(&conn, &vendor).unwrap();

        let doc = Document::new(vendor.id, Some("/uploads/cert.png"));
        db::insert_document(&conn, &doc).unwrap();
        let mut rec = ValidationRecord::started(doc.id);
        rec.status = ValidationStatus::Completed;
        rec.overall_confidence = Some(82.0);
        db::insert_validation(&conn, &rec).unwrap();

        let mut meta = ExtractedMetadata::empty(rec.id, doc.id, serde_json::json!({}));
        meta.co2_value = Some(2_500_000.0);
        meta.co2_unit = crate::models::enums::Co2Unit::Kg;
        db::upsert_metadata(&conn, &meta).unwrap();
        db::update_document_status(&conn, &doc.id, DocumentStatus::Valid).unwrap();

        let profile = recalculate_vendor(&conn, &vendor.id).unwrap();
        assert_eq!(profile.total_co2_tonnes, 2_500.0);
        assert_eq!(profile.risk_level, RiskLevel::Medium);

        // The level is mirrored onto the vendor row.
        let vendor = db::get_vendor(&conn, &vendor.id).unwrap().unwrap();
        assert_eq!(vendor.risk_level, RiskLevel::Medium);

        // The threshold row was lazily seeded from the industry defaults.
        let t = db::get_threshold(&conn, "Manufacturing").unwrap().unwrap();
        assert_eq!(t.high, 10_000.0);
    }

    #[test]
    fn snapshot_is_overwritten_not_accumulated() {
        let conn = open_memory_database().unwrap();
        let vendor = Vendor::new("Acme Foundry", "Manufacturing");
        db::insert_vendor(&conn, &vendor).unwrap();

        let first = recalculate_vendor(&conn, &vendor.id).unwrap();
        assert_eq!(first.total_documents, 0);

        let doc = Document::new(vendor.id, Some("/uploads/cert.png"));
        db::insert_document(&conn, &doc).unwrap();

        let second = recalculate_vendor(&conn, &vendor.id).unwrap();
        assert_eq!(second.total_documents, 1);

        let stored = db::get_risk_profile(&conn, &vendor.id).unwrap().unwrap();
        assert_eq!(stored.total_documents, 1);
    }
}
