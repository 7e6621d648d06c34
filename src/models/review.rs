//! Manual review queue entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ReviewDecision, ReviewPriority, ReviewStatus};

/// A queued human task created when automated confidence is insufficient to
/// decide alone. Created at most once per validation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualReviewEntry {
    pub id: Uuid,
    pub validation_id: Uuid,

    pub priority: ReviewPriority,
    pub reason: String,

    pub status: ReviewStatus,
    pub assigned_to: Option<String>,
    pub reviewer_notes: Option<String>,
    pub resolution: Option<ReviewDecision>,

    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ManualReviewEntry {
    pub fn queued(validation_id: Uuid, priority: ReviewPriority, reason: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            validation_id,
            priority,
            reason: reason.to_string(),
            status: ReviewStatus::Pending,
            assigned_to: None,
            reviewer_notes: None,
            resolution: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}
