//! Relevance assessment — is this a carbon compliance document at all?

use tracing::warn;
use uuid::Uuid;

use super::{clamp_score, step_exchange, Assessment};
use crate::config::ValidationConfig;
use crate::gateway::VisionGateway;
use crate::models::enums::CertificateType;
use crate::models::ValidationStep;
use crate::pipeline::interpret::{read_bool, read_f64, read_string};
use crate::pipeline::prompts;

#[derive(Debug, Clone)]
pub struct RelevanceOutcome {
    pub is_relevant: bool,
    pub detected_type: Option<CertificateType>,
    pub confidence: Option<f64>,
}

/// Assess relevance. On model failure the document is treated as relevant so
/// a flaky gateway can never hard-reject a legitimate submission.
pub fn assess_relevance(
    gateway: &dyn VisionGateway,
    config: &ValidationConfig,
    validation_id: Uuid,
    image_b64: &str,
) -> Assessment<RelevanceOutcome> {
    match step_exchange(
        gateway,
        config,
        validation_id,
        ValidationStep::Relevance,
        &prompts::relevance(),
        image_b64,
    ) {
        Ok((parsed, audit)) => {
            let is_relevant = read_bool(&parsed, "is_relevant").unwrap_or(true);
            let detected_type = if is_relevant {
                Some(map_document_type(
                    read_string(&parsed, "document_type").as_deref(),
                ))
            } else {
                None
            };
            Assessment {
                value: RelevanceOutcome {
                    is_relevant,
                    detected_type,
                    confidence: read_f64(&parsed, "confidence").map(clamp_score),
                },
                used_default: false,
                audit,
            }
        }
        Err((e, audit)) => {
            warn!(%validation_id, error = %e, "relevance step degraded to default");
            Assessment {
                value: RelevanceOutcome {
                    is_relevant: true,
                    detected_type: None,
                    confidence: None,
                },
                used_default: true,
                audit,
            }
        }
    }
}

/// Map the model's free-text document type onto the closed enum.
///
/// Exact label or snake_case matches win; otherwise the type sharing the most
/// keywords is chosen; with no overlap at all, fall back to the generic
/// emission report.
pub fn map_document_type(raw: Option<&str>) -> CertificateType {
    let Some(raw) = raw else {
        return CertificateType::EmissionReport;
    };
    if let Some(exact) = prompts::match_certificate_type(raw) {
        return exact;
    }

    let words: Vec<String> = raw
        .to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let mut best = CertificateType::EmissionReport;
    let mut best_overlap = 0usize;
    for candidate in CertificateType::all() {
        let overlap = candidate
            .label()
            .to_lowercase()
            .split_whitespace()
            .filter(|w| words.iter().any(|word| word == w))
            .count();
        if overlap > best_overlap {
            best = *candidate;
            best_overlap = overlap;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;

    fn config() -> ValidationConfig {
        ValidationConfig::fast()
    }

    #[test]
    fn parses_explicit_irrelevance() {
        let gateway = MockGateway::new(
            r#"{"is_relevant": false, "document_type": null, "confidence": 95}"#,
        );
        let a = assess_relevance(&gateway, &config(), Uuid::new_v4(), "img");
        assert!(!a.value.is_relevant);
        assert!(a.value.detected_type.is_none());
        assert_eq!(a.value.confidence, Some(95.0));
        assert!(!a.used_default);
    }

    #[test]
    fn relevant_document_gets_mapped_type() {
        let gateway = MockGateway::new(
            r#"{"is_relevant": true, "document_type": "Carbon Offset Certificate", "confidence": 88}"#,
        );
        let a = assess_relevance(&gateway, &config(), Uuid::new_v4(), "img");
        assert_eq!(
            a.value.detected_type,
            Some(CertificateType::CarbonOffsetCertificate)
        );
    }

    #[test]
    fn gateway_failure_defaults_to_relevant() {
        let gateway = MockGateway::new("no json here at all");
        let a = assess_relevance(&gateway, &config(), Uuid::new_v4(), "img");
        assert!(a.value.is_relevant);
        assert!(a.used_default);
        assert!(!a.audit.success);
    }

    #[test]
    fn keyword_overlap_maps_free_text_types() {
        assert_eq!(
            map_document_type(Some("annual ghg inventory")),
            CertificateType::GhgInventoryReport
        );
        assert_eq!(
            map_document_type(Some("certificate of sustainability compliance")),
            CertificateType::SustainabilityCertificate
        );
        // No shared keyword at all falls back to the generic report type.
        assert_eq!(
            map_document_type(Some("mystery paper")),
            CertificateType::EmissionReport
        );
        assert_eq!(map_document_type(None), CertificateType::EmissionReport);
    }
}
