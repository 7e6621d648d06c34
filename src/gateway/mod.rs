//! Vision model gateway.
//!
//! The pipeline talks to the vision model through [`VisionGateway`] only, so
//! assessors stay testable against mocks and the transport can be swapped
//! without touching step logic.

pub mod ollama;

pub use ollama::{MockGateway, OllamaVisionClient};

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Cannot connect to model gateway at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Gateway returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Rate limited by model gateway")]
    RateLimited,

    #[error("Model quota exhausted")]
    QuotaExceeded,

    #[error("Credential rejected by model gateway")]
    InvalidCredential,

    #[error("Malformed gateway reply: {0}")]
    MalformedReply(String),
}

impl GatewayError {
    /// Whether a retry has any chance of succeeding. Quota and credential
    /// failures never resolve by waiting, and a malformed reply is handled
    /// downstream as degraded step output rather than retried transport.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) | Self::RateLimited => true,
            Self::Http { status, .. } => *status >= 500,
            Self::QuotaExceeded | Self::InvalidCredential | Self::MalformedReply(_) => false,
        }
    }
}

/// One successful model exchange.
#[derive(Debug, Clone)]
pub struct GatewayReply {
    pub text: String,
    pub latency_ms: u64,
}

/// Blocking interface to a vision-capable model.
pub trait VisionGateway: Send + Sync {
    /// Send an instruction, optionally with one base64-encoded image.
    fn ask(&self, instruction: &str, image_b64: Option<&str>) -> Result<GatewayReply, GatewayError>;

    /// Model identifier recorded in audit entries.
    fn model_name(&self) -> &str;
}

/// Ask with bounded retries and doubling backoff between transient failures.
///
/// `attempts` counts the first try; non-retryable errors surface immediately.
pub fn ask_with_retry(
    gateway: &dyn VisionGateway,
    instruction: &str,
    image_b64: Option<&str>,
    attempts: u32,
    backoff_ms: u64,
) -> Result<GatewayReply, GatewayError> {
    let mut delay = backoff_ms;
    let mut last_err = GatewayError::MalformedReply("no attempts made".to_string());

    for attempt in 1..=attempts.max(1) {
        match gateway.ask(instruction, image_b64) {
            Ok(reply) => return Ok(reply),
            Err(e) if e.is_retryable() && attempt < attempts => {
                warn!(attempt, error = %e, "gateway request failed, retrying");
                std::thread::sleep(Duration::from_millis(delay));
                delay *= 2;
                last_err = e;
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::ollama::FlakyGateway;
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(GatewayError::Connection("http://localhost".into()).is_retryable());
        assert!(GatewayError::Timeout(120).is_retryable());
        assert!(GatewayError::RateLimited.is_retryable());
        assert!(GatewayError::Http { status: 503, body: String::new() }.is_retryable());
        assert!(!GatewayError::Http { status: 400, body: String::new() }.is_retryable());
        assert!(!GatewayError::QuotaExceeded.is_retryable());
        assert!(!GatewayError::InvalidCredential.is_retryable());
        assert!(!GatewayError::MalformedReply("junk".into()).is_retryable());
    }

    #[test]
    fn retry_recovers_from_transient_failures() {
        let gateway = FlakyGateway::new(2, r#"{"ok": true}"#);
        let reply = ask_with_retry(&gateway, "instruction", None, 3, 1).unwrap();
        assert_eq!(reply.text, r#"{"ok": true}"#);
        assert_eq!(gateway.calls(), 3);
    }

    #[test]
    fn retry_gives_up_after_attempts_exhausted() {
        let gateway = FlakyGateway::new(5, "unused");
        let result = ask_with_retry(&gateway, "instruction", None, 3, 1);
        assert!(result.is_err());
        assert_eq!(gateway.calls(), 3);
    }

    #[test]
    fn non_retryable_error_fails_fast() {
        let gateway = FlakyGateway::non_retryable();
        let result = ask_with_retry(&gateway, "instruction", None, 3, 1);
        assert!(matches!(result, Err(GatewayError::InvalidCredential)));
        assert_eq!(gateway.calls(), 1);
    }
}
