//! Escalation policy — when automated confidence is not allowed to decide
//! alone.

use crate::config::ValidationConfig;
use crate::models::enums::ReviewPriority;

#[derive(Debug, Clone, PartialEq)]
pub struct EscalationDecision {
    pub requires_review: bool,
    pub priority: ReviewPriority,
    pub reason: Option<String>,
}

/// Decide whether a completed run needs a human.
///
/// `explicitly_irrelevant` must be true only when the model actually said the
/// document is not relevant — a defaulted relevance step never escalates.
pub fn evaluate_escalation(
    overall_confidence: f64,
    red_flag_count: usize,
    explicitly_irrelevant: bool,
    config: &ValidationConfig,
) -> EscalationDecision {
    let mut reasons = Vec::new();

    if overall_confidence < config.auto_approve_threshold {
        reasons.push(format!("Low confidence score: {overall_confidence:.2}"));
    }
    if red_flag_count >= config.red_flag_review_count {
        reasons.push(format!(
            "Multiple authenticity concerns: {red_flag_count} red flags"
        ));
    }
    if explicitly_irrelevant {
        reasons.push("Document assessed as not relevant".to_string());
    }

    if reasons.is_empty() {
        return EscalationDecision {
            requires_review: false,
            priority: ReviewPriority::Low,
            reason: None,
        };
    }

    let priority = if red_flag_count >= config.red_flag_review_count
        || overall_confidence < config.high_priority_confidence
    {
        ReviewPriority::High
    } else if overall_confidence < config.auto_approve_threshold {
        ReviewPriority::Medium
    } else {
        ReviewPriority::Low
    };

    let mut reason = reasons.join("; ");
    bound_reason(&mut reason, config.max_flag_reason_len);

    EscalationDecision {
        requires_review: true,
        priority,
        reason: Some(reason),
    }
}

/// Bound a flag reason to `max` characters. Reason text can embed raw model
/// output, so the cut must land on a char boundary, never a byte index.
pub(crate) fn bound_reason(reason: &mut String, max: usize) {
    if let Some((idx, _)) = reason.char_indices().nth(max) {
        reason.truncate(idx);
    }
}
