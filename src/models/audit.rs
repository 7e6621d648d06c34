//! Append-only audit entries for every model interaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ValidationStep;

/// One terminal model interaction during a validation step.
///
/// Written once per step outcome (success or final failure after retries) and
/// never mutated — this is the forensic trail for disputing an automated
/// decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub validation_id: Uuid,
    pub step: ValidationStep,

    pub prompt_sent: String,
    pub raw_response: String,
    pub parsed_response: Option<serde_json::Value>,

    pub model_used: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub latency_ms: Option<u64>,

    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn success(
        validation_id: Uuid,
        step: ValidationStep,
        prompt: &str,
        raw_response: &str,
        parsed: Option<serde_json::Value>,
        model: &str,
        latency_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            validation_id,
            step,
            prompt_sent: prompt.to_string(),
            raw_response: raw_response.to_string(),
            parsed_response: parsed,
            model_used: model.to_string(),
            success: true,
            error_message: None,
            latency_ms: Some(latency_ms),
            created_at: Utc::now(),
        }
    }

    pub fn failure(
        validation_id: Uuid,
        step: ValidationStep,
        prompt: &str,
        raw_response: &str,
        model: &str,
        error: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            validation_id,
            step,
            prompt_sent: prompt.to_string(),
            raw_response: raw_response.to_string(),
            parsed_response: None,
            model_used: model.to_string(),
            success: false,
            error_message: Some(error.to_string()),
            latency_ms: None,
            created_at: Utc::now(),
        }
    }
}
