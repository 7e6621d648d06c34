//! Emissary: vendor compliance document validation and risk scoring.
//!
//! Documents uploaded for a vendor run through a fixed pipeline of
//! vision-model assessments (readability, relevance, authenticity, metadata
//! extraction), get an aggregated confidence, and feed the per-vendor
//! emissions risk profile. Model output is never trusted: every reply is
//! parsed defensively, every step is audited, and anything doubtful lands in
//! the manual review queue.

pub mod config;
pub mod db;
pub mod gateway;
pub mod models;
pub mod pipeline;
pub mod risk;
pub mod service;

pub use config::ValidationConfig;
pub use service::{ServiceError, ValidationService, ValidationStats};
