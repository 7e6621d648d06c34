use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::{GatewayError, GatewayReply, VisionGateway};

/// Ollama HTTP client for local vision model inference.
pub struct OllamaVisionClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaVisionClient {
    /// Create a client pointing at an Ollama instance.
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, GatewayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    /// Default Ollama instance at localhost:11434 with llava:13b.
    pub fn default_local() -> Result<Self, GatewayError> {
        Self::new("http://localhost:11434", "llava:13b", 120)
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<&'a str>>,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl VisionGateway for OllamaVisionClient {
    fn ask(&self, instruction: &str, image_b64: Option<&str>) -> Result<GatewayReply, GatewayError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt: instruction,
            images: image_b64.map(|img| vec![img]),
            stream: false,
        };

        let started = Instant::now();
        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                GatewayError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                GatewayError::Timeout(self.timeout_secs)
            } else {
                GatewayError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => GatewayError::InvalidCredential,
                429 if body.to_lowercase().contains("quota") => GatewayError::QuotaExceeded,
                429 => GatewayError::RateLimited,
                code => GatewayError::Http { status: code, body },
            });
        }

        let latency_ms = started.elapsed().as_millis() as u64;
        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| GatewayError::MalformedReply(e.to_string()))?;

        Ok(GatewayReply {
            text: parsed.response,
            latency_ms,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ═══════════════════════════════════════════
// Test doubles
// ═══════════════════════════════════════════

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Mock gateway for testing — replays a script of replies in order, then
/// repeats the last one.
pub struct MockGateway {
    script: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    model: String,
    calls: AtomicU32,
}

impl MockGateway {
    pub fn new(reply: &str) -> Self {
        Self::scripted(vec![reply])
    }

    pub fn scripted(replies: Vec<&str>) -> Self {
        let script: VecDeque<String> = replies.into_iter().map(str::to_string).collect();
        let last = script.back().cloned().unwrap_or_default();
        Self {
            script: Mutex::new(script),
            last: Mutex::new(last),
            model: "mock-vision".to_string(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VisionGateway for MockGateway {
    fn ask(&self, _instruction: &str, _image_b64: Option<&str>) -> Result<GatewayReply, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().map_err(|_| {
            GatewayError::MalformedReply("mock script lock poisoned".to_string())
        })?;
        let text = match script.pop_front() {
            Some(reply) => {
                *self.last.lock().map_err(|_| {
                    GatewayError::MalformedReply("mock script lock poisoned".to_string())
                })? = reply.clone();
                reply
            }
            None => self
                .last
                .lock()
                .map_err(|_| GatewayError::MalformedReply("mock script lock poisoned".to_string()))?
                .clone(),
        };
        Ok(GatewayReply { text, latency_ms: 5 })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Gateway that fails a fixed number of times before succeeding, or always
/// fails with a non-retryable error. Used to exercise retry behavior.
pub struct FlakyGateway {
    failures: AtomicU32,
    reply: String,
    non_retryable: bool,
    calls: AtomicU32,
}

impl FlakyGateway {
    pub fn new(failures_before_success: u32, reply: &str) -> Self {
        Self {
            failures: AtomicU32::new(failures_before_success),
            reply: reply.to_string(),
            non_retryable: false,
            calls: AtomicU32::new(0),
        }
    }

    pub fn non_retryable() -> Self {
        Self {
            failures: AtomicU32::new(u32::MAX),
            reply: String::new(),
            non_retryable: true,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VisionGateway for FlakyGateway {
    fn ask(&self, _instruction: &str, _image_b64: Option<&str>) -> Result<GatewayReply, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.non_retryable {
            return Err(GatewayError::InvalidCredential);
        }
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(GatewayError::Connection("http://localhost:11434".to_string()));
        }
        Ok(GatewayReply {
            text: self.reply.clone(),
            latency_ms: 5,
        })
    }

    fn model_name(&self) -> &str {
        "flaky-vision"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_gateway_replays_script_then_repeats_last() {
        let gateway = MockGateway::scripted(vec![r#"{"a": 1}"#, r#"{"b": 2}"#]);
        assert_eq!(gateway.ask("x", None).unwrap().text, r#"{"a": 1}"#);
        assert_eq!(gateway.ask("x", None).unwrap().text, r#"{"b": 2}"#);
        assert_eq!(gateway.ask("x", None).unwrap().text, r#"{"b": 2}"#);
        assert_eq!(gateway.calls(), 3);
    }

    #[test]
    fn ollama_client_trims_trailing_slash() {
        let client = OllamaVisionClient::new("http://localhost:11434/", "llava:13b", 60).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.model_name(), "llava:13b");
    }

    #[test]
    fn default_local_uses_standard_port() {
        let client = OllamaVisionClient::default_local().unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.timeout_secs, 120);
    }

    #[test]
    fn flaky_gateway_counts_down_failures() {
        let gateway = FlakyGateway::new(1, "ok");
        assert!(gateway.ask("x", None).is_err());
        assert_eq!(gateway.ask("x", None).unwrap().text, "ok");
    }
}
