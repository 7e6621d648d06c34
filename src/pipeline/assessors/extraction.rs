//! Metadata extraction — the business-critical step and a hard gate.

use chrono::NaiveDate;
use serde_json::Value;
use uuid::Uuid;

use super::{clamp_score, step_exchange, Assessment};
use crate::config::ValidationConfig;
use crate::gateway::VisionGateway;
use crate::models::{AuditEntry, ExtractedMetadata, ValidationStep};
use crate::pipeline::fields::{normalize_unit, validate_co2_value, validate_date, DateKind};
use crate::pipeline::interpret::{read_f64, read_string};
use crate::pipeline::prompts;
use crate::pipeline::ValidationError;

/// Extract emissions metadata from the document.
///
/// Unlike the other steps there is no safe default: if the model cannot be
/// reached or returns no JSON at all, the run fails. Individual fields that
/// fail validation are dropped to null with confidence zero, and the row is
/// created regardless.
pub fn assess_extraction(
    gateway: &dyn VisionGateway,
    config: &ValidationConfig,
    validation_id: Uuid,
    document_id: Uuid,
    image_b64: &str,
    today: NaiveDate,
) -> Result<Assessment<ExtractedMetadata>, (ValidationError, AuditEntry)> {
    let (parsed, audit) = step_exchange(
        gateway,
        config,
        validation_id,
        ValidationStep::Extraction,
        prompts::EXTRACTION,
        image_b64,
    )?;

    let metadata = build_metadata(validation_id, document_id, &parsed, today);
    Ok(Assessment {
        value: metadata,
        used_default: false,
        audit,
    })
}

fn build_metadata(
    validation_id: Uuid,
    document_id: Uuid,
    parsed: &Value,
    today: NaiveDate,
) -> ExtractedMetadata {
    let mut meta = ExtractedMetadata::empty(validation_id, document_id, parsed.clone());

    match read_f64(parsed, "co2_value") {
        Some(v) if validate_co2_value(v) => {
            meta.co2_value = Some(v);
            meta.co2_confidence = read_f64(parsed, "co2_confidence").map(clamp_score);
        }
        Some(_) => {
            // Reported but implausible: null the value, keep confidence zero
            // so the extraction bucket reflects the rejection.
            meta.co2_confidence = Some(0.0);
        }
        None => {}
    }
    meta.co2_unit = normalize_unit(read_string(parsed, "co2_unit").as_deref());

    match read_string(parsed, "issue_date") {
        Some(raw) => match validate_date(&raw, DateKind::Issue, today) {
            Some(date) => {
                meta.issue_date = Some(date);
                meta.issue_date_confidence = read_f64(parsed, "issue_date_confidence").map(clamp_score);
            }
            None => meta.issue_date_confidence = Some(0.0),
        },
        None => {}
    }

    match read_string(parsed, "expiry_date") {
        Some(raw) => match validate_date(&raw, DateKind::Expiry, today) {
            Some(date) => {
                meta.expiry_date = Some(date);
                meta.expiry_date_confidence =
                    read_f64(parsed, "expiry_date_confidence").map(clamp_score);
            }
            None => meta.expiry_date_confidence = Some(0.0),
        },
        None => {}
    }

    if let Some(authority) = read_string(parsed, "issuing_authority") {
        meta.issuing_authority = Some(authority);
        meta.issuing_authority_confidence =
            read_f64(parsed, "issuing_authority_confidence").map(clamp_score);
    }

    meta.certificate_number = read_string(parsed, "certificate_number");
    meta.verification_standard = read_string(parsed, "verification_standard");

    meta
}
