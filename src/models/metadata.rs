//! Extracted metadata — the structured emissions data behind a validation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Co2Unit;

/// Structured fields pulled from a compliance document at the extraction step.
///
/// Exactly one row per validation record, created even when every field is
/// null so downstream code has one stable join target. The raw model payload
/// is retained verbatim for forensic replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    pub id: Uuid,
    pub validation_id: Uuid,
    pub document_id: Uuid,

    pub co2_value: Option<f64>,
    pub co2_unit: Co2Unit,
    pub co2_confidence: Option<f64>,

    pub issue_date: Option<NaiveDate>,
    pub issue_date_confidence: Option<f64>,

    pub expiry_date: Option<NaiveDate>,
    pub expiry_date_confidence: Option<f64>,

    pub issuing_authority: Option<String>,
    pub issuing_authority_confidence: Option<f64>,

    pub certificate_number: Option<String>,
    pub verification_standard: Option<String>,

    pub raw_payload: serde_json::Value,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractedMetadata {
    /// An all-null row for a validation whose extraction produced nothing
    /// usable. The raw payload still records what the model returned.
    pub fn empty(validation_id: Uuid, document_id: Uuid, raw_payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            validation_id,
            document_id,
            co2_value: None,
            co2_unit: Co2Unit::Tonnes,
            co2_confidence: None,
            issue_date: None,
            issue_date_confidence: None,
            expiry_date: None,
            expiry_date_confidence: None,
            issuing_authority: None,
            issuing_authority_confidence: None,
            certificate_number: None,
            verification_standard: None,
            raw_payload,
            extracted_at: Utc::now(),
        }
    }

    /// The extracted CO2 quantity in tonnes, normalizing kilogram values.
    pub fn co2_tonnes(&self) -> Option<f64> {
        self.co2_value.map(|v| match self.co2_unit {
            Co2Unit::Tonnes => v,
            Co2Unit::Kg => v / 1000.0,
        })
    }

    /// Per-field confidences that feed the extraction bucket of the overall
    /// confidence score.
    pub fn field_confidences(&self) -> Vec<f64> {
        [
            self.co2_confidence,
            self.issue_date_confidence,
            self.expiry_date_confidence,
            self.issuing_authority_confidence,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_row_defaults_to_tonnes_with_null_fields() {
        let meta = ExtractedMetadata::empty(
            Uuid::new_v4(),
            Uuid::new_v4(),
            serde_json::json!({"note": "nothing parsed"}),
        );
        assert!(meta.co2_value.is_none());
        assert_eq!(meta.co2_unit, Co2Unit::Tonnes);
        assert!(meta.field_confidences().is_empty());
        assert!(meta.co2_tonnes().is_none());
    }

    #[test]
    fn kg_values_normalize_to_tonnes() {
        let mut meta =
            ExtractedMetadata::empty(Uuid::new_v4(), Uuid::new_v4(), serde_json::json!({}));
        meta.co2_value = Some(2500.0);
        meta.co2_unit = Co2Unit::Kg;
        assert_eq!(meta.co2_tonnes(), Some(2.5));

        meta.co2_unit = Co2Unit::Tonnes;
        assert_eq!(meta.co2_tonnes(), Some(2500.0));
    }

    #[test]
    fn field_confidences_skip_missing_entries() {
        let mut meta =
            ExtractedMetadata::empty(Uuid::new_v4(), Uuid::new_v4(), serde_json::json!({}));
        meta.co2_confidence = Some(90.0);
        meta.expiry_date_confidence = Some(70.0);
        assert_eq!(meta.field_confidences(), vec![90.0, 70.0]);
    }
}
