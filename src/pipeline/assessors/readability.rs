//! Readability assessment — can a human read this scan at all?

use tracing::warn;
use uuid::Uuid;

use super::{clamp_score, step_exchange, Assessment};
use crate::config::ValidationConfig;
use crate::gateway::VisionGateway;
use crate::models::ValidationStep;
use crate::pipeline::interpret::{read_bool, read_f64, read_string_list};
use crate::pipeline::prompts;

#[derive(Debug, Clone)]
pub struct ReadabilityOutcome {
    pub passed: bool,
    pub quality_score: Option<f64>,
    pub issues: Vec<String>,
}

/// Assess legibility. On model failure the document gets the benefit of the
/// doubt: readable, no score.
pub fn assess_readability(
    gateway: &dyn VisionGateway,
    config: &ValidationConfig,
    validation_id: Uuid,
    image_b64: &str,
) -> Assessment<ReadabilityOutcome> {
    match step_exchange(
        gateway,
        config,
        validation_id,
        ValidationStep::Readability,
        prompts::READABILITY,
        image_b64,
    ) {
        Ok((parsed, audit)) => Assessment {
            value: ReadabilityOutcome {
                passed: read_bool(&parsed, "is_readable").unwrap_or(true),
                quality_score: read_f64(&parsed, "quality_score").map(clamp_score),
                issues: read_string_list(&parsed, "issues"),
            },
            used_default: false,
            audit,
        },
        Err((e, audit)) => {
            warn!(%validation_id, error = %e, "readability step degraded to default");
            Assessment {
                value: ReadabilityOutcome {
                    passed: true,
                    quality_score: None,
                    issues: Vec::new(),
                },
                used_default: true,
                audit,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;

    fn config() -> ValidationConfig {
        ValidationConfig::fast()
    }

    #[test]
    fn parses_model_verdict() {
        let gateway = MockGateway::new(
            r#"{"is_readable": false, "quality_score": 15, "issues": ["severe blur"]}"#,
        );
        let a = assess_readability(&gateway, &config(), Uuid::new_v4(), "img");
        assert!(!a.value.passed);
        assert_eq!(a.value.quality_score, Some(15.0));
        assert_eq!(a.value.issues, vec!["severe blur".to_string()]);
        assert!(!a.used_default);
        assert!(a.audit.success);
    }

    #[test]
    fn clamps_out_of_range_score() {
        let gateway = MockGateway::new(r#"{"is_readable": true, "quality_score": 250}"#);
        let a = assess_readability(&gateway, &config(), Uuid::new_v4(), "img");
        assert_eq!(a.value.quality_score, Some(100.0));
    }

    #[test]
    fn defaults_to_readable_on_garbage_reply() {
        let gateway = MockGateway::new("I cannot look at images, sorry.");
        let a = assess_readability(&gateway, &config(), Uuid::new_v4(), "img");
        assert!(a.value.passed);
        assert!(a.value.quality_score.is_none());
        assert!(a.used_default);
        assert!(!a.audit.success);
        // The raw reply survives in the audit trail.
        assert!(a.audit.raw_response.contains("cannot look"));
    }

    #[test]
    fn missing_flag_defaults_readable_without_fallback() {
        let gateway = MockGateway::new(r#"{"quality_score": 80}"#);
        let a = assess_readability(&gateway, &config(), Uuid::new_v4(), "img");
        assert!(a.value.passed);
        assert!(!a.used_default);
    }
}
