//! The four assessment steps.
//!
//! Every assessor shares one contract: build the step instruction, ask the
//! gateway with bounded retries, record one audit entry for the terminal
//! attempt, and return a normalized outcome. The soft steps (readability,
//! relevance, authenticity) fall back to a safe default instead of failing;
//! extraction is a hard gate and surfaces its error to the orchestrator.

pub mod authenticity;
pub mod extraction;
pub mod readability;
pub mod relevance;

pub use authenticity::assess_authenticity;
pub use extraction::assess_extraction;
pub use readability::assess_readability;
pub use relevance::assess_relevance;

use serde_json::Value;
use uuid::Uuid;

use super::interpret::interpret_reply;
use super::ValidationError;
use crate::config::ValidationConfig;
use crate::gateway::{ask_with_retry, VisionGateway};
use crate::models::{AuditEntry, ValidationStep};

/// A step outcome plus whether it came from the fallback path.
#[derive(Debug)]
pub struct Assessment<T> {
    pub value: T,
    pub used_default: bool,
    pub audit: AuditEntry,
}

/// One full model exchange for a step: retried ask, then JSON interpretation.
///
/// The returned audit entry reflects the terminal attempt — success with the
/// parsed payload and latency, or failure with whatever raw text exists.
fn step_exchange(
    gateway: &dyn VisionGateway,
    config: &ValidationConfig,
    validation_id: Uuid,
    step: ValidationStep,
    instruction: &str,
    image_b64: &str,
) -> Result<(Value, AuditEntry), (ValidationError, AuditEntry)> {
    let model = gateway.model_name().to_string();

    let reply = match ask_with_retry(
        gateway,
        instruction,
        Some(image_b64),
        config.gateway_attempts,
        config.gateway_backoff_ms,
    ) {
        Ok(reply) => reply,
        Err(e) => {
            let audit =
                AuditEntry::failure(validation_id, step, instruction, "", &model, &e.to_string());
            return Err((e.into(), audit));
        }
    };

    match interpret_reply(&reply.text) {
        Ok(parsed) => {
            let audit = AuditEntry::success(
                validation_id,
                step,
                instruction,
                &reply.text,
                Some(parsed.clone()),
                &model,
                reply.latency_ms,
            );
            Ok((parsed, audit))
        }
        Err(e) => {
            let audit = AuditEntry::failure(
                validation_id,
                step,
                instruction,
                &reply.text,
                &model,
                &e.to_string(),
            );
            Err((e, audit))
        }
    }
}

/// Clamp a model-reported score into [0, 100].
fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}
