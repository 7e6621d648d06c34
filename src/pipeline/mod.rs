//! The validation pipeline: preprocessing, the four assessment steps,
//! confidence aggregation and escalation, driven by the orchestrator.

pub mod assessors;
pub mod confidence;
pub mod escalation;
pub mod fields;
pub mod interpret;
pub mod orchestrator;
pub mod preprocess;
pub mod prompts;

pub use confidence::compute_overall_confidence;
pub use escalation::{evaluate_escalation, EscalationDecision};
pub use orchestrator::Orchestrator;
pub use preprocess::{ImagePreprocessor, PreparedImage, Preprocessor};

use thiserror::Error;

use crate::db::DatabaseError;
use crate::gateway::GatewayError;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Document has no file attached")]
    MissingFile,

    #[error("Cannot prepare document image: {0}")]
    Preprocess(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("No valid JSON found in model reply: {0}")]
    NoJson(String),

    #[error("Document is unreadable: {0}")]
    Unreadable(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
