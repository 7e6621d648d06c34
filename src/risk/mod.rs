//! Vendor risk engine: per-industry thresholds and the risk calculator.

pub mod calculator;
pub mod defaults;

pub use calculator::recalculate_vendor;
pub use defaults::default_threshold;
