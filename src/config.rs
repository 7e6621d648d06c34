//! Crate-wide configuration.
//!
//! Every weight and threshold in the pipeline is a field here rather than a
//! hard constant: the numbers below are a reference set tuned empirically, and
//! only the structural invariants (weights sum to 1, thresholds ascend) are
//! load-bearing.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Confidence weights for the four assessment buckets. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub readability: f64,
    pub relevance: f64,
    pub authenticity: f64,
    pub extraction: f64,
}

impl ConfidenceWeights {
    pub fn sum(&self) -> f64 {
        self.readability + self.relevance + self.authenticity + self.extraction
    }
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        // Extraction dominates: it is the business-critical output.
        Self {
            readability: 0.10,
            relevance: 0.25,
            authenticity: 0.25,
            extraction: 0.40,
        }
    }
}

/// Tunable knobs for the validation pipeline and risk engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub weights: ConfidenceWeights,

    /// Substitute for a missing per-step score (0-100). Neutral, not zero, so
    /// one unavailable signal does not crater the aggregate.
    pub neutral_step_score: f64,
    /// Extraction-bucket substitute when no field carries a confidence.
    pub empty_extraction_score: f64,

    /// Overall confidence below this queues manual review.
    pub auto_approve_threshold: f64,
    /// Overall confidence below this escalates review priority to high.
    pub high_priority_confidence: f64,
    /// This many authenticity red flags force review (and high priority).
    pub red_flag_review_count: usize,
    /// Longest stored flag reason, in characters.
    pub max_flag_reason_len: usize,

    /// Authenticity scores are floor-clamped here: a plain digital document
    /// must never be penalized as inauthentic.
    pub authenticity_floor: f64,
    /// Authenticity score substituted when the step falls back to its default.
    pub authenticity_default_score: f64,

    /// Hard readability gate: fail the run only when the quality score is
    /// below this AND the model flagged the document unreadable.
    pub unreadable_quality_gate: f64,

    /// Total gateway attempts per step (first try included).
    pub gateway_attempts: u32,
    /// Base backoff before the second gateway attempt; doubles per retry.
    pub gateway_backoff_ms: u64,
    /// HTTP timeout for one gateway call.
    pub gateway_timeout_secs: u64,

    /// Worker attempts for a whole run that dies on an infrastructure error.
    pub worker_attempts: u32,
    /// Delay between worker attempts, multiplied by the attempt number.
    pub worker_retry_delay_ms: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            weights: ConfidenceWeights::default(),
            neutral_step_score: 65.0,
            empty_extraction_score: 30.0,
            auto_approve_threshold: 55.0,
            high_priority_confidence: 40.0,
            red_flag_review_count: 3,
            max_flag_reason_len: 255,
            authenticity_floor: 50.0,
            authenticity_default_score: 65.0,
            unreadable_quality_gate: 20.0,
            gateway_attempts: 3,
            gateway_backoff_ms: 1_000,
            gateway_timeout_secs: 120,
            worker_attempts: 3,
            worker_retry_delay_ms: 60_000,
        }
    }
}

impl ValidationConfig {
    /// Check the structural invariants the rest of the pipeline assumes.
    pub fn validate(&self) -> Result<(), String> {
        if (self.weights.sum() - 1.0).abs() > 1e-9 {
            return Err(format!(
                "confidence weights must sum to 1.0, got {}",
                self.weights.sum()
            ));
        }
        if self.gateway_attempts == 0 {
            return Err("gateway_attempts must be at least 1".into());
        }
        if self.worker_attempts == 0 {
            return Err("worker_attempts must be at least 1".into());
        }
        if !(0.0..=100.0).contains(&self.auto_approve_threshold) {
            return Err("auto_approve_threshold must lie in [0, 100]".into());
        }
        Ok(())
    }

    /// A config with zeroed delays for fast tests.
    #[cfg(test)]
    pub fn fast() -> Self {
        Self {
            gateway_backoff_ms: 0,
            worker_retry_delay_ms: 0,
            ..Self::default()
        }
    }
}

/// Default log filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "emissary=info".to_string()
}

/// Initialize tracing for binaries and integration harnesses embedding this
/// crate. Call once.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_log_filter())),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let config = ValidationConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn skewed_weights_rejected() {
        let mut config = ValidationConfig::default();
        config.weights.extraction = 0.90;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_attempts_rejected() {
        let mut config = ValidationConfig::default();
        config.gateway_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn reference_thresholds_in_range() {
        let config = ValidationConfig::default();
        assert_eq!(config.auto_approve_threshold, 55.0);
        assert_eq!(config.red_flag_review_count, 3);
        assert_eq!(config.authenticity_floor, 50.0);
        assert!(config.high_priority_confidence < config.auto_approve_threshold);
    }
}
