//! Confidence aggregation across the four assessment buckets.

use crate::config::ValidationConfig;
use crate::models::{ExtractedMetadata, ValidationRecord};

/// Weighted overall confidence for a completed run.
///
/// Missing step scores substitute the neutral default rather than zero, so a
/// single silent step cannot crater the aggregate. The extraction bucket is
/// the mean of the per-field confidences; with no confident field at all it
/// takes a deliberately low default reflecting genuine uncertainty.
/// Deterministic: same record and metadata always yield the same score.
pub fn compute_overall_confidence(
    rec: &ValidationRecord,
    metadata: Option<&ExtractedMetadata>,
    config: &ValidationConfig,
) -> f64 {
    let neutral = config.neutral_step_score;

    let readability = rec.readability_score.unwrap_or(neutral);
    let relevance = rec.relevance_confidence.unwrap_or(neutral);
    let authenticity = rec.authenticity_score.unwrap_or(neutral);
    let extraction = extraction_bucket(metadata, config);

    let w = &config.weights;
    let raw = w.readability * readability
        + w.relevance * relevance
        + w.authenticity * authenticity
        + w.extraction * extraction;

    (raw.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

fn extraction_bucket(metadata: Option<&ExtractedMetadata>, config: &ValidationConfig) -> f64 {
    let confidences = metadata.map(|m| m.field_confidences()).unwrap_or_default();
    if confidences.is_empty() {
        config.empty_extraction_score
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    }
}
