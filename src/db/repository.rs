use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

fn parse_enum<T>(field: &str, value: &str, from_str: fn(&str) -> Option<T>) -> Result<T, DatabaseError> {
    from_str(value).ok_or_else(|| DatabaseError::InvalidEnum {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn json_list(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

// ═══════════════════════════════════════════
// Vendor Repository
// ═══════════════════════════════════════════

pub fn insert_vendor(conn: &Connection, vendor: &Vendor) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO vendors (id, name, industry, risk_level) VALUES (?1, ?2, ?3, ?4)",
        params![
            vendor.id.to_string(),
            vendor.name,
            vendor.industry,
            vendor.risk_level.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_vendor(conn: &Connection, id: &Uuid) -> Result<Option<Vendor>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, name, industry, risk_level FROM vendors WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );

    match result {
        Ok((id, name, industry, risk_level)) => Ok(Some(Vendor {
            id: parse_uuid(&id)?,
            name,
            industry,
            risk_level: parse_enum("risk_level", &risk_level, RiskLevel::from_str)?,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_vendor_risk_level(
    conn: &Connection,
    vendor_id: &Uuid,
    level: RiskLevel,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE vendors SET risk_level = ?1 WHERE id = ?2",
        params![level.as_str(), vendor_id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "vendor".to_string(),
            id: vendor_id.to_string(),
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════
// Document Repository
// ═══════════════════════════════════════════

pub fn insert_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (id, vendor_id, file_path, status, expiry_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            doc.id.to_string(),
            doc.vendor_id.to_string(),
            doc.file_path,
            doc.status.as_str(),
            doc.expiry_date.map(|d| d.to_string()),
        ],
    )?;
    Ok(())
}

struct DocumentRow {
    id: String,
    vendor_id: String,
    file_path: Option<String>,
    status: String,
    expiry_date: Option<String>,
}

fn document_from_row(row: DocumentRow) -> Result<Document, DatabaseError> {
    Ok(Document {
        id: parse_uuid(&row.id)?,
        vendor_id: parse_uuid(&row.vendor_id)?,
        file_path: row.file_path,
        status: parse_enum("status", &row.status, DocumentStatus::from_str)?,
        expiry_date: row.expiry_date.as_deref().and_then(parse_date),
    })
}

fn map_document_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        vendor_id: row.get(1)?,
        file_path: row.get(2)?,
        status: row.get(3)?,
        expiry_date: row.get(4)?,
    })
}

pub fn get_document(conn: &Connection, id: &Uuid) -> Result<Option<Document>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, vendor_id, file_path, status, expiry_date FROM documents WHERE id = ?1",
        params![id.to_string()],
        map_document_row,
    );

    match result {
        Ok(row) => Ok(Some(document_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_vendor_documents(
    conn: &Connection,
    vendor_id: &Uuid,
) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, vendor_id, file_path, status, expiry_date
         FROM documents WHERE vendor_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![vendor_id.to_string()], map_document_row)?;

    let mut documents = Vec::new();
    for row in rows {
        documents.push(document_from_row(row?)?);
    }
    Ok(documents)
}

pub fn update_document_status(
    conn: &Connection,
    document_id: &Uuid,
    status: DocumentStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE documents SET status = ?1 WHERE id = ?2",
        params![status.as_str(), document_id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "document".to_string(),
            id: document_id.to_string(),
        });
    }
    Ok(())
}

pub fn set_document_expiry(
    conn: &Connection,
    document_id: &Uuid,
    expiry: Option<NaiveDate>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE documents SET expiry_date = ?1 WHERE id = ?2",
        params![expiry.map(|d| d.to_string()), document_id.to_string()],
    )?;
    Ok(())
}

// ═══════════════════════════════════════════
// Validation Repository
// ═══════════════════════════════════════════

pub fn insert_validation(conn: &Connection, rec: &ValidationRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO document_validations (id, document_id, status, current_step,
         started_at, completed_at, total_processing_secs,
         readability_passed, readability_score, readability_issues,
         is_relevant, detected_type, relevance_confidence,
         authenticity_score, authenticity_indicators, authenticity_red_flags,
         overall_confidence, requires_manual_review, flagged_reason,
         retry_count, error_message, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                 ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
        params![
            rec.id.to_string(),
            rec.document_id.to_string(),
            rec.status.as_str(),
            rec.current_step.as_str(),
            rec.started_at.map(|t| t.to_rfc3339()),
            rec.completed_at.map(|t| t.to_rfc3339()),
            rec.total_processing_secs,
            rec.readability_passed.map(|b| b as i32),
            rec.readability_score,
            serde_json::to_string(&rec.readability_issues).unwrap_or_else(|_| "[]".into()),
            rec.is_relevant.map(|b| b as i32),
            rec.detected_type.map(|t| t.as_str()),
            rec.relevance_confidence,
            rec.authenticity_score,
            serde_json::to_string(&rec.authenticity_indicators).unwrap_or_else(|_| "[]".into()),
            serde_json::to_string(&rec.authenticity_red_flags).unwrap_or_else(|_| "[]".into()),
            rec.overall_confidence,
            rec.requires_manual_review as i32,
            rec.flagged_reason,
            rec.retry_count,
            rec.error_message,
            rec.created_at.to_rfc3339(),
            rec.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn update_validation(conn: &Connection, rec: &ValidationRecord) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE document_validations SET document_id = ?2, status = ?3, current_step = ?4,
         started_at = ?5, completed_at = ?6, total_processing_secs = ?7,
         readability_passed = ?8, readability_score = ?9, readability_issues = ?10,
         is_relevant = ?11, detected_type = ?12, relevance_confidence = ?13,
         authenticity_score = ?14, authenticity_indicators = ?15, authenticity_red_flags = ?16,
         overall_confidence = ?17, requires_manual_review = ?18, flagged_reason = ?19,
         retry_count = ?20, error_message = ?21, created_at = ?22, updated_at = ?23
         WHERE id = ?1",
        params![
            rec.id.to_string(),
            rec.document_id.to_string(),
            rec.status.as_str(),
            rec.current_step.as_str(),
            rec.started_at.map(|t| t.to_rfc3339()),
            rec.completed_at.map(|t| t.to_rfc3339()),
            rec.total_processing_secs,
            rec.readability_passed.map(|b| b as i32),
            rec.readability_score,
            serde_json::to_string(&rec.readability_issues).unwrap_or_else(|_| "[]".into()),
            rec.is_relevant.map(|b| b as i32),
            rec.detected_type.map(|t| t.as_str()),
            rec.relevance_confidence,
            rec.authenticity_score,
            serde_json::to_string(&rec.authenticity_indicators).unwrap_or_else(|_| "[]".into()),
            serde_json::to_string(&rec.authenticity_red_flags).unwrap_or_else(|_| "[]".into()),
            rec.overall_confidence,
            rec.requires_manual_review as i32,
            rec.flagged_reason,
            rec.retry_count,
            rec.error_message,
            rec.created_at.to_rfc3339(),
            rec.updated_at.to_rfc3339(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "validation".to_string(),
            id: rec.id.to_string(),
        });
    }
    Ok(())
}

struct ValidationRow {
    id: String,
    document_id: String,
    status: String,
    current_step: String,
    started_at: Option<String>,
    completed_at: Option<String>,
    total_processing_secs: Option<i64>,
    readability_passed: Option<i32>,
    readability_score: Option<f64>,
    readability_issues: String,
    is_relevant: Option<i32>,
    detected_type: Option<String>,
    relevance_confidence: Option<f64>,
    authenticity_score: Option<f64>,
    authenticity_indicators: String,
    authenticity_red_flags: String,
    overall_confidence: Option<f64>,
    requires_manual_review: i32,
    flagged_reason: Option<String>,
    retry_count: i64,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

const VALIDATION_COLUMNS: &str = "id, document_id, status, current_step,
     started_at, completed_at, total_processing_secs,
     readability_passed, readability_score, readability_issues,
     is_relevant, detected_type, relevance_confidence,
     authenticity_score, authenticity_indicators, authenticity_red_flags,
     overall_confidence, requires_manual_review, flagged_reason,
     retry_count, error_message, created_at, updated_at";

fn map_validation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ValidationRow> {
    Ok(ValidationRow {
        id: row.get(0)?,
        document_id: row.get(1)?,
        status: row.get(2)?,
        current_step: row.get(3)?,
        started_at: row.get(4)?,
        completed_at: row.get(5)?,
        total_processing_secs: row.get(6)?,
        readability_passed: row.get(7)?,
        readability_score: row.get(8)?,
        readability_issues: row.get(9)?,
        is_relevant: row.get(10)?,
        detected_type: row.get(11)?,
        relevance_confidence: row.get(12)?,
        authenticity_score: row.get(13)?,
        authenticity_indicators: row.get(14)?,
        authenticity_red_flags: row.get(15)?,
        overall_confidence: row.get(16)?,
        requires_manual_review: row.get(17)?,
        flagged_reason: row.get(18)?,
        retry_count: row.get(19)?,
        error_message: row.get(20)?,
        created_at: row.get(21)?,
        updated_at: row.get(22)?,
    })
}

fn validation_from_row(row: ValidationRow) -> Result<ValidationRecord, DatabaseError> {
    let detected_type = match row.detected_type {
        Some(ref s) => Some(parse_enum("detected_type", s, CertificateType::from_str)?),
        None => None,
    };
    Ok(ValidationRecord {
        id: parse_uuid(&row.id)?,
        document_id: parse_uuid(&row.document_id)?,
        status: parse_enum("status", &row.status, ValidationStatus::from_str)?,
        current_step: parse_enum("current_step", &row.current_step, ValidationStep::from_str)?,
        started_at: row.started_at.as_deref().map(parse_datetime),
        completed_at: row.completed_at.as_deref().map(parse_datetime),
        total_processing_secs: row.total_processing_secs,
        readability_passed: row.readability_passed.map(|v| v != 0),
        readability_score: row.readability_score,
        readability_issues: json_list(&row.readability_issues),
        is_relevant: row.is_relevant.map(|v| v != 0),
        detected_type,
        relevance_confidence: row.relevance_confidence,
        authenticity_score: row.authenticity_score,
        authenticity_indicators: json_list(&row.authenticity_indicators),
        authenticity_red_flags: json_list(&row.authenticity_red_flags),
        overall_confidence: row.overall_confidence,
        requires_manual_review: row.requires_manual_review != 0,
        flagged_reason: row.flagged_reason,
        retry_count: row.retry_count,
        error_message: row.error_message,
        created_at: parse_datetime(&row.created_at),
        updated_at: parse_datetime(&row.updated_at),
    })
}

pub fn get_validation(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<ValidationRecord>, DatabaseError> {
    let sql = format!("SELECT {VALIDATION_COLUMNS} FROM document_validations WHERE id = ?1");
    let result = conn.query_row(&sql, params![id.to_string()], map_validation_row);

    match result {
        Ok(row) => Ok(Some(validation_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_validation_for_document(
    conn: &Connection,
    document_id: &Uuid,
) -> Result<Option<ValidationRecord>, DatabaseError> {
    let sql =
        format!("SELECT {VALIDATION_COLUMNS} FROM document_validations WHERE document_id = ?1");
    let result = conn.query_row(&sql, params![document_id.to_string()], map_validation_row);

    match result {
        Ok(row) => Ok(Some(validation_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Outcome of trying to claim a document for validation.
#[derive(Debug)]
pub enum ClaimOutcome {
    /// First run for this document; a fresh record was created.
    Fresh(ValidationRecord),
    /// A terminal record existed and was reset in place.
    Reset(ValidationRecord),
    /// A run is already in flight; nothing was changed.
    Busy(ValidationRecord),
}

/// Atomically claim a document for validation.
///
/// One record per document, forever: re-triggering a terminal run resets the
/// existing row instead of inserting a second one, and an in-flight run is
/// never disturbed. The transaction makes concurrent triggers resolve to one
/// winner.
pub fn claim_validation(
    conn: &Connection,
    document_id: &Uuid,
) -> Result<ClaimOutcome, DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    let outcome = match get_validation_for_document(&tx, document_id)? {
        None => {
            let rec = ValidationRecord::started(*document_id);
            insert_validation(&tx, &rec)?;
            ClaimOutcome::Fresh(rec)
        }
        Some(existing) if existing.status.is_terminal() => {
            let mut rec = existing;
            rec.reset_for_retrigger();
            update_validation(&tx, &rec)?;
            ClaimOutcome::Reset(rec)
        }
        Some(existing) => ClaimOutcome::Busy(existing),
    };

    tx.commit()?;
    Ok(outcome)
}

// ═══════════════════════════════════════════
// Extracted Metadata Repository
// ═══════════════════════════════════════════

pub fn upsert_metadata(conn: &Connection, meta: &ExtractedMetadata) -> Result<(), DatabaseError> {
    // A re-triggered run replaces the previous row for the validation.
    conn.execute(
        "INSERT OR REPLACE INTO extracted_metadata (id, validation_id, document_id,
         co2_value, co2_unit, co2_confidence,
         issue_date, issue_date_confidence, expiry_date, expiry_date_confidence,
         issuing_authority, issuing_authority_confidence,
         certificate_number, verification_standard, raw_payload, extracted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            meta.id.to_string(),
            meta.validation_id.to_string(),
            meta.document_id.to_string(),
            meta.co2_value,
            meta.co2_unit.as_str(),
            meta.co2_confidence,
            meta.issue_date.map(|d| d.to_string()),
            meta.issue_date_confidence,
            meta.expiry_date.map(|d| d.to_string()),
            meta.expiry_date_confidence,
            meta.issuing_authority,
            meta.issuing_authority_confidence,
            meta.certificate_number,
            meta.verification_standard,
            meta.raw_payload.to_string(),
            meta.extracted_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_metadata_for_validation(
    conn: &Connection,
    validation_id: &Uuid,
) -> Result<Option<ExtractedMetadata>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, validation_id, document_id, co2_value, co2_unit, co2_confidence,
         issue_date, issue_date_confidence, expiry_date, expiry_date_confidence,
         issuing_authority, issuing_authority_confidence,
         certificate_number, verification_standard, raw_payload, extracted_at
         FROM extracted_metadata WHERE validation_id = ?1",
        params![validation_id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<f64>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, Option<f64>>(7)?,
                row.get::<_, Option<String>>(8)?,
                row.get::<_, Option<f64>>(9)?,
                row.get::<_, Option<String>>(10)?,
                row.get::<_, Option<f64>>(11)?,
                row.get::<_, Option<String>>(12)?,
                row.get::<_, Option<String>>(13)?,
                row.get::<_, String>(14)?,
                row.get::<_, String>(15)?,
            ))
        },
    );

    let row = match result {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(Some(ExtractedMetadata {
        id: parse_uuid(&row.0)?,
        validation_id: parse_uuid(&row.1)?,
        document_id: parse_uuid(&row.2)?,
        co2_value: row.3,
        co2_unit: parse_enum("co2_unit", &row.4, Co2Unit::from_str)?,
        co2_confidence: row.5,
        issue_date: row.6.as_deref().and_then(parse_date),
        issue_date_confidence: row.7,
        expiry_date: row.8.as_deref().and_then(parse_date),
        expiry_date_confidence: row.9,
        issuing_authority: row.10,
        issuing_authority_confidence: row.11,
        certificate_number: row.12,
        verification_standard: row.13,
        raw_payload: serde_json::from_str(&row.14).unwrap_or(serde_json::Value::Null),
        extracted_at: parse_datetime(&row.15),
    }))
}

// ═══════════════════════════════════════════
// Audit Repository
// ═══════════════════════════════════════════

pub fn insert_audit_entry(conn: &Connection, entry: &AuditEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO audit_entries (id, validation_id, step, prompt_sent, raw_response,
         parsed_response, model_used, success, error_message, latency_ms, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            entry.id.to_string(),
            entry.validation_id.to_string(),
            entry.step.as_str(),
            entry.prompt_sent,
            entry.raw_response,
            entry.parsed_response.as_ref().map(|v| v.to_string()),
            entry.model_used,
            entry.success as i32,
            entry.error_message,
            entry.latency_ms.map(|v| v as i64),
            entry.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_audit_entries(
    conn: &Connection,
    validation_id: &Uuid,
) -> Result<Vec<AuditEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, validation_id, step, prompt_sent, raw_response, parsed_response,
         model_used, success, error_message, latency_ms, created_at
         FROM audit_entries WHERE validation_id = ?1 ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![validation_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, i32>(7)?,
            row.get::<_, Option<String>>(8)?,
            row.get::<_, Option<i64>>(9)?,
            row.get::<_, String>(10)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let row = row?;
        entries.push(AuditEntry {
            id: parse_uuid(&row.0)?,
            validation_id: parse_uuid(&row.1)?,
            step: parse_enum("step", &row.2, ValidationStep::from_str)?,
            prompt_sent: row.3,
            raw_response: row.4,
            parsed_response: row.5.as_deref().and_then(|s| serde_json::from_str(s).ok()),
            model_used: row.6,
            success: row.7 != 0,
            error_message: row.8,
            latency_ms: row.9.map(|v| v as u64),
            created_at: parse_datetime(&row.10),
        });
    }
    Ok(entries)
}

// ═══════════════════════════════════════════
// Industry Threshold Repository
// ═══════════════════════════════════════════

pub fn get_threshold(
    conn: &Connection,
    industry: &str,
) -> Result<Option<IndustryThreshold>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, industry, low, medium, high, critical, created_at
         FROM industry_thresholds WHERE industry = ?1",
        params![industry],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, String>(6)?,
            ))
        },
    );

    match result {
        Ok(row) => Ok(Some(IndustryThreshold {
            id: parse_uuid(&row.0)?,
            industry: row.1,
            low: row.2,
            medium: row.3,
            high: row.4,
            critical: row.5,
            created_at: parse_datetime(&row.6),
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Insert the threshold if the industry has none yet, then return whichever
/// row is current. Racing callers both end up reading the same row.
pub fn ensure_threshold(
    conn: &Connection,
    threshold: &IndustryThreshold,
) -> Result<IndustryThreshold, DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO industry_thresholds (id, industry, low, medium, high, critical, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            threshold.id.to_string(),
            threshold.industry,
            threshold.low,
            threshold.medium,
            threshold.high,
            threshold.critical,
            threshold.created_at.to_rfc3339(),
        ],
    )?;

    get_threshold(conn, &threshold.industry)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "industry_threshold".to_string(),
        id: threshold.industry.clone(),
    })
}

pub fn update_threshold(
    conn: &Connection,
    threshold: &IndustryThreshold,
) -> Result<(), DatabaseError> {
    if !threshold.is_ascending() {
        return Err(DatabaseError::ConstraintViolation(format!(
            "thresholds for {} must strictly ascend",
            threshold.industry
        )));
    }
    let changed = conn.execute(
        "UPDATE industry_thresholds SET low = ?1, medium = ?2, high = ?3, critical = ?4
         WHERE industry = ?5",
        params![
            threshold.low,
            threshold.medium,
            threshold.high,
            threshold.critical,
            threshold.industry,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "industry_threshold".to_string(),
            id: threshold.industry.clone(),
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════
// Vendor Risk Profile Repository
// ═══════════════════════════════════════════

pub fn upsert_risk_profile(
    conn: &Connection,
    profile: &VendorRiskProfile,
) -> Result<(), DatabaseError> {
    // Recomputed from scratch on every run; the previous snapshot is replaced.
    conn.execute(
        "INSERT OR REPLACE INTO vendor_risk_profiles (id, vendor_id, risk_level, risk_score,
         total_documents, validated_documents, flagged_documents,
         total_co2_tonnes, exceeds_threshold, avg_document_confidence, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            profile.id.to_string(),
            profile.vendor_id.to_string(),
            profile.risk_level.as_str(),
            profile.risk_score,
            profile.total_documents,
            profile.validated_documents,
            profile.flagged_documents,
            profile.total_co2_tonnes,
            profile.exceeds_threshold as i32,
            profile.avg_document_confidence,
            profile.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_risk_profile(
    conn: &Connection,
    vendor_id: &Uuid,
) -> Result<Option<VendorRiskProfile>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, vendor_id, risk_level, risk_score, total_documents, validated_documents,
         flagged_documents, total_co2_tonnes, exceeds_threshold, avg_document_confidence, updated_at
         FROM vendor_risk_profiles WHERE vendor_id = ?1",
        params![vendor_id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, f64>(7)?,
                row.get::<_, i32>(8)?,
                row.get::<_, Option<f64>>(9)?,
                row.get::<_, String>(10)?,
            ))
        },
    );

    match result {
        Ok(row) => Ok(Some(VendorRiskProfile {
            id: parse_uuid(&row.0)?,
            vendor_id: parse_uuid(&row.1)?,
            risk_level: parse_enum("risk_level", &row.2, RiskLevel::from_str)?,
            risk_score: row.3,
            total_documents: row.4,
            validated_documents: row.5,
            flagged_documents: row.6,
            total_co2_tonnes: row.7,
            exceeds_threshold: row.8 != 0,
            avg_document_confidence: row.9,
            updated_at: parse_datetime(&row.10),
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ═══════════════════════════════════════════
// Manual Review Repository
// ═══════════════════════════════════════════

/// Queue a review unless the validation already has an unresolved one.
/// Returns whether a new entry was inserted.
pub fn insert_review_if_absent(
    conn: &Connection,
    entry: &ManualReviewEntry,
) -> Result<bool, DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    let open: i64 = tx.query_row(
        "SELECT COUNT(*) FROM manual_reviews WHERE validation_id = ?1 AND status != 'resolved'",
        params![entry.validation_id.to_string()],
        |row| row.get(0),
    )?;
    if open > 0 {
        tx.commit()?;
        return Ok(false);
    }

    tx.execute(
        "INSERT INTO manual_reviews (id, validation_id, priority, reason, status,
         assigned_to, reviewer_notes, resolution, created_at, resolved_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            entry.id.to_string(),
            entry.validation_id.to_string(),
            entry.priority.as_str(),
            entry.reason,
            entry.status.as_str(),
            entry.assigned_to,
            entry.reviewer_notes,
            entry.resolution.map(|r| r.as_str()),
            entry.created_at.to_rfc3339(),
            entry.resolved_at.map(|t| t.to_rfc3339()),
        ],
    )?;

    tx.commit()?;
    Ok(true)
}

struct ReviewRow {
    id: String,
    validation_id: String,
    priority: String,
    reason: String,
    status: String,
    assigned_to: Option<String>,
    reviewer_notes: Option<String>,
    resolution: Option<String>,
    created_at: String,
    resolved_at: Option<String>,
}

fn map_review_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReviewRow> {
    Ok(ReviewRow {
        id: row.get(0)?,
        validation_id: row.get(1)?,
        priority: row.get(2)?,
        reason: row.get(3)?,
        status: row.get(4)?,
        assigned_to: row.get(5)?,
        reviewer_notes: row.get(6)?,
        resolution: row.get(7)?,
        created_at: row.get(8)?,
        resolved_at: row.get(9)?,
    })
}

fn review_from_row(row: ReviewRow) -> Result<ManualReviewEntry, DatabaseError> {
    let resolution = match row.resolution {
        Some(ref s) => Some(parse_enum("resolution", s, ReviewDecision::from_str)?),
        None => None,
    };
    Ok(ManualReviewEntry {
        id: parse_uuid(&row.id)?,
        validation_id: parse_uuid(&row.validation_id)?,
        priority: parse_enum("priority", &row.priority, ReviewPriority::from_str)?,
        reason: row.reason,
        status: parse_enum("status", &row.status, ReviewStatus::from_str)?,
        assigned_to: row.assigned_to,
        reviewer_notes: row.reviewer_notes,
        resolution,
        created_at: parse_datetime(&row.created_at),
        resolved_at: row.resolved_at.as_deref().map(parse_datetime),
    })
}

const REVIEW_COLUMNS: &str = "id, validation_id, priority, reason, status,
     assigned_to, reviewer_notes, resolution, created_at, resolved_at";

pub fn get_review(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<ManualReviewEntry>, DatabaseError> {
    let sql = format!("SELECT {REVIEW_COLUMNS} FROM manual_reviews WHERE id = ?1");
    let result = conn.query_row(&sql, params![id.to_string()], map_review_row);

    match result {
        Ok(row) => Ok(Some(review_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_review_for_validation(
    conn: &Connection,
    validation_id: &Uuid,
) -> Result<Option<ManualReviewEntry>, DatabaseError> {
    let sql = format!(
        "SELECT {REVIEW_COLUMNS} FROM manual_reviews
         WHERE validation_id = ?1 ORDER BY created_at DESC LIMIT 1"
    );
    let result = conn.query_row(&sql, params![validation_id.to_string()], map_review_row);

    match result {
        Ok(row) => Ok(Some(review_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Pending and in-progress reviews, highest priority first, oldest first
/// within a priority.
pub fn list_open_reviews(conn: &Connection) -> Result<Vec<ManualReviewEntry>, DatabaseError> {
    let sql = format!(
        "SELECT {REVIEW_COLUMNS} FROM manual_reviews WHERE status != 'resolved'
         ORDER BY CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
                  created_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_review_row)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(review_from_row(row?)?);
    }
    Ok(entries)
}

pub fn assign_review(
    conn: &Connection,
    id: &Uuid,
    assignee: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE manual_reviews SET assigned_to = ?1, status = 'in_progress'
         WHERE id = ?2 AND status != 'resolved'",
        params![assignee, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "manual_review".to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn resolve_review(
    conn: &Connection,
    id: &Uuid,
    decision: ReviewDecision,
    notes: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE manual_reviews SET status = 'resolved', resolution = ?1,
         reviewer_notes = ?2, resolved_at = ?3
         WHERE id = ?4 AND status != 'resolved'",
        params![
            decision.as_str(),
            notes,
            Utc::now().to_rfc3339(),
            id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "manual_review".to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}
