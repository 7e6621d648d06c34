//! Validation of individual extracted fields.
//!
//! An untrusted model fills these fields; anything that fails validation is
//! stored as null rather than failing the run.

use chrono::{Duration, NaiveDate};

use crate::models::enums::Co2Unit;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];

/// Issue dates up to 30 days ahead are accepted to absorb timezone skew and
/// certificates issued against a future effective date.
const ISSUE_SLACK_DAYS: i64 = 30;

const MAX_CO2_VALUE: f64 = 10_000_000_000.0;

fn date_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

fn date_ceiling() -> NaiveDate {
    NaiveDate::from_ymd_opt(2100, 12, 31).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    /// When the certificate was issued; must not sit meaningfully in the
    /// future.
    Issue,
    /// When it lapses; expected in the future, bounded by the ceiling.
    Expiry,
}

/// Parse and bound-check a model-reported date. Returns `None` for anything
/// unparseable or implausible.
pub fn validate_date(raw: &str, kind: DateKind, today: NaiveDate) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let parsed = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())?;

    if parsed < date_floor() || parsed > date_ceiling() {
        return None;
    }

    match kind {
        DateKind::Issue if parsed > today + Duration::days(ISSUE_SLACK_DAYS) => None,
        _ => Some(parsed),
    }
}

/// A CO2 quantity is plausible when it is a finite non-negative number below
/// ten billion (in whatever unit the model reported).
pub fn validate_co2_value(value: f64) -> bool {
    value.is_finite() && value >= 0.0 && value <= MAX_CO2_VALUE
}

/// Map a free-text unit onto the canonical set. Unrecognized or missing units
/// default to tonnes, the dominant unit on real certificates.
pub fn normalize_unit(raw: Option<&str>) -> Co2Unit {
    let Some(raw) = raw else {
        return Co2Unit::Tonnes;
    };
    let lowered = raw.trim().to_lowercase();
    if lowered.contains("kg") || lowered.contains("kilogram") {
        Co2Unit::Kg
    } else {
        Co2Unit::Tonnes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 26).unwrap()
    }

    #[test]
    fn all_formats_parse() {
        for raw in ["2025-03-14", "14/03/2025", "03/14/2025", "14-03-2025"] {
            assert!(
                validate_date(raw, DateKind::Issue, today()).is_some(),
                "{raw} should parse"
            );
        }
        assert!(validate_date("March 14, 2025", DateKind::Issue, today()).is_none());
    }

    #[test]
    fn dates_outside_plausible_range_rejected() {
        assert!(validate_date("1999-12-31", DateKind::Issue, today()).is_none());
        assert!(validate_date("1999-12-31", DateKind::Expiry, today()).is_none());
        assert!(validate_date("2101-01-01", DateKind::Expiry, today()).is_none());
        assert!(validate_date("2000-01-01", DateKind::Issue, today()).is_some());
        assert!(validate_date("2100-12-31", DateKind::Expiry, today()).is_some());
    }

    #[test]
    fn future_issue_dates_rejected_beyond_slack() {
        // 30 days out is tolerated, a year out is not.
        assert!(validate_date("2026-09-20", DateKind::Issue, today()).is_some());
        assert!(validate_date("2027-08-26", DateKind::Issue, today()).is_none());
    }

    #[test]
    fn future_expiry_dates_accepted() {
        assert!(validate_date("2031-01-01", DateKind::Expiry, today()).is_some());
    }

    #[test]
    fn co2_bounds() {
        assert!(validate_co2_value(0.0));
        assert!(validate_co2_value(1250.5));
        assert!(validate_co2_value(10_000_000_000.0));
        assert!(!validate_co2_value(-1.0));
        assert!(!validate_co2_value(10_000_000_001.0));
        assert!(!validate_co2_value(f64::NAN));
        assert!(!validate_co2_value(f64::INFINITY));
    }

    #[test]
    fn unit_normalization_is_infallible() {
        assert_eq!(normalize_unit(Some("kg")), Co2Unit::Kg);
        assert_eq!(normalize_unit(Some("Kilograms CO2e")), Co2Unit::Kg);
        assert_eq!(normalize_unit(Some("tonnes")), Co2Unit::Tonnes);
        assert_eq!(normalize_unit(Some("metric tons CO2e")), Co2Unit::Tonnes);
        assert_eq!(normalize_unit(Some("bananas")), Co2Unit::Tonnes);
        assert_eq!(normalize_unit(None), Co2Unit::Tonnes);
    }
}
