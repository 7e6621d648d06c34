//! Authenticity assessment — signs of tampering or forgery.

use tracing::warn;
use uuid::Uuid;

use super::{clamp_score, step_exchange, Assessment};
use crate::config::ValidationConfig;
use crate::gateway::VisionGateway;
use crate::models::ValidationStep;
use crate::pipeline::interpret::{read_f64, read_string_list};
use crate::pipeline::prompts;

#[derive(Debug, Clone)]
pub struct AuthenticityOutcome {
    pub score: f64,
    pub indicators: Vec<String>,
    pub red_flags: Vec<String>,
}

/// Assess authenticity. The score is floor-clamped so a plain born-digital
/// document is never scored as a forgery; the red flags carry the real
/// signal. On model failure: a neutral score with no flags.
pub fn assess_authenticity(
    gateway: &dyn VisionGateway,
    config: &ValidationConfig,
    validation_id: Uuid,
    image_b64: &str,
) -> Assessment<AuthenticityOutcome> {
    match step_exchange(
        gateway,
        config,
        validation_id,
        ValidationStep::Authenticity,
        prompts::AUTHENTICITY,
        image_b64,
    ) {
        Ok((parsed, audit)) => {
            let score = read_f64(&parsed, "authenticity_score")
                .map(clamp_score)
                .unwrap_or(config.authenticity_default_score)
                .max(config.authenticity_floor);
            Assessment {
                value: AuthenticityOutcome {
                    score,
                    indicators: read_string_list(&parsed, "indicators"),
                    red_flags: read_string_list(&parsed, "red_flags"),
                },
                used_default: false,
                audit,
            }
        }
        Err((e, audit)) => {
            warn!(%validation_id, error = %e, "authenticity step degraded to default");
            Assessment {
                value: AuthenticityOutcome {
                    score: config.authenticity_default_score,
                    indicators: Vec::new(),
                    red_flags: Vec::new(),
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
    fn parses_score_and_flags() {
        let gateway = MockGateway::new(
            r#"{"authenticity_score": 72, "indicators": ["consistent fonts"],
                "red_flags": ["seal looks pasted", "totals do not add up"]}"#,
        );
        let a = assess_authenticity(&gateway, &config(), Uuid::new_v4(), "img");
        assert_eq!(a.value.score, 72.0);
        assert_eq!(a.value.red_flags.len(), 2);
        assert!(!a.used_default);
    }

    #[test]
    fn score_is_floor_clamped() {
        let gateway = MockGateway::new(r#"{"authenticity_score": 10, "red_flags": []}"#);
        let a = assess_authenticity(&gateway, &config(), Uuid::new_v4(), "img");
        assert_eq!(a.value.score, 50.0);
    }

    #[test]
    fn empty_reply_on_every_retry_returns_neutral_default() {
        let gateway = MockGateway::new("");
        let a = assess_authenticity(&gateway, &config(), Uuid::new_v4(), "img");
        assert_eq!(a.value.score, 65.0);
        assert!(a.value.indicators.is_empty());
        assert!(a.value.red_flags.is_empty());
        assert!(a.used_default);
        assert!(!a.audit.success);
    }

    #[test]
    fn missing_score_uses_default_then_floor() {
        let gateway = MockGateway::new(r#"{"red_flags": ["odd issuer"]}"#);
        let a = assess_authenticity(&gateway, &config(), Uuid::new_v4(), "img");
        assert_eq!(a.value.score, 65.0);
        assert_eq!(a.value.red_flags, vec!["odd issuer".to_string()]);
        assert!(!a.used_default);
    }
}
