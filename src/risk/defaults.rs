//! Per-industry default emission thresholds, in tonnes CO2e per year.
//!
//! Seeded lazily the first time a vendor in an industry is scored; a
//! configuration surface may edit the row afterwards.

use crate::models::IndustryThreshold;

/// (low, medium, high, critical) breakpoints per known industry.
const INDUSTRY_DEFAULTS: &[(&str, [f64; 4])] = &[
    ("manufacturing", [1_000.0, 5_000.0, 10_000.0, 50_000.0]),
    ("technology", [500.0, 2_000.0, 5_000.0, 10_000.0]),
    ("retail", [300.0, 1_500.0, 3_000.0, 8_000.0]),
    ("logistics", [2_000.0, 10_000.0, 20_000.0, 100_000.0]),
    ("energy", [5_000.0, 20_000.0, 50_000.0, 200_000.0]),
];

/// Generic fallback for industries without a tuned set.
const GENERIC_DEFAULT: [f64; 4] = [1_000.0, 5_000.0, 10_000.0, 50_000.0];

/// The default threshold row for an industry, matched case-insensitively.
pub fn default_threshold(industry: &str) -> IndustryThreshold {
    let lowered = industry.trim().to_lowercase();
    let [low, medium, high, critical] = INDUSTRY_DEFAULTS
        .iter()
        .find(|(name, _)| *name == lowered)
        .map(|(_, values)| *values)
        .unwrap_or(GENERIC_DEFAULT);

    IndustryThreshold::new(industry, low, medium, high, critical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_industries_have_tuned_sets() {
        let energy = default_threshold("Energy");
        assert_eq!(energy.low, 5_000.0);
        assert_eq!(energy.critical, 200_000.0);

        let retail = default_threshold("retail");
        assert_eq!(retail.medium, 1_500.0);
    }

    #[test]
    fn unknown_industry_gets_generic_set() {
        let t = default_threshold("Interpretive Dance");
        assert_eq!(t.low, 1_000.0);
        assert_eq!(t.critical, 50_000.0);
        assert_eq!(t.industry, "Interpretive Dance");
    }

    #[test]
    fn every_default_set_ascends() {
        for (name, _) in INDUSTRY_DEFAULTS {
            assert!(default_threshold(name).is_ascending(), "{name}");
        }
        assert!(default_threshold("other").is_ascending());
    }
}
