//! Lenient interpretation of model replies.
//!
//! Vision models wrap JSON in prose, markdown fences or reasoning text. The
//! interpreter tries progressively looser strategies before giving up.

use regex::Regex;
use serde_json::Value;

use super::ValidationError;

const PREVIEW_LEN: usize = 200;

/// Pull a JSON object out of a model reply.
///
/// Strategies, in order:
/// 1. the whole reply is JSON;
/// 2. a ```json fenced block;
/// 3. any ``` fenced block;
/// 4. the first brace-balanced object anywhere in the text.
///
/// Only objects count — a bare array or scalar is not a step verdict.
pub fn interpret_reply(reply: &str) -> Result<Value, ValidationError> {
    let trimmed = reply.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Ok(value);
        }
    }

    if let Some(block) = fenced_block(trimmed, "```json") {
        if let Ok(value) = serde_json::from_str::<Value>(&block) {
            if value.is_object() {
                return Ok(value);
            }
        }
    }

    if let Some(block) = fenced_block(trimmed, "```") {
        if let Ok(value) = serde_json::from_str::<Value>(&block) {
            if value.is_object() {
                return Ok(value);
            }
        }
    }

    // Handles one level of nesting, which covers every step payload.
    let object_re = Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}")
        .map_err(|e| ValidationError::NoJson(e.to_string()))?;
    for candidate in object_re.find_iter(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(candidate.as_str()) {
            if value.is_object() {
                return Ok(value);
            }
        }
    }

    let preview: String = trimmed.chars().take(PREVIEW_LEN).collect();
    Err(ValidationError::NoJson(preview))
}

fn fenced_block(text: &str, fence: &str) -> Option<String> {
    let start = text.find(fence)? + fence.len();
    let end = text[start..].find("```")?;
    Some(text[start..start + end].trim().to_string())
}

// ═══════════════════════════════════════════
// Field readers
// ═══════════════════════════════════════════

/// Read a boolean, tolerating "true"/"false" strings.
pub fn read_bool(value: &Value, key: &str) -> Option<bool> {
    match value.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read a number, tolerating numeric strings with thousands separators.
pub fn read_f64(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// Read a non-empty string, treating "null"/"none"/"n/a" as absent.
pub fn read_string(value: &Value, key: &str) -> Option<String> {
    let s = value.get(key)?.as_str()?.trim();
    if s.is_empty() || matches!(s.to_lowercase().as_str(), "null" | "none" | "n/a" | "unknown") {
        return None;
    }
    Some(s.to_string())
}

/// Read an array of strings, skipping non-string items.
pub fn read_string_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_object_parses() {
        let value = interpret_reply(r#"{"is_readable": true, "quality_score": 85}"#).unwrap();
        assert_eq!(read_bool(&value, "is_readable"), Some(true));
        assert_eq!(read_f64(&value, "quality_score"), Some(85.0));
    }

    #[test]
    fn fenced_json_block_parses() {
        let reply = "Here is my analysis:\n```json\n{\"is_relevant\": true}\n```\nDone.";
        let value = interpret_reply(reply).unwrap();
        assert_eq!(read_bool(&value, "is_relevant"), Some(true));
    }

    #[test]
    fn bare_fence_parses() {
        let reply = "```\n{\"authenticity_score\": 70}\n```";
        let value = interpret_reply(reply).unwrap();
        assert_eq!(read_f64(&value, "authenticity_score"), Some(70.0));
    }

    #[test]
    fn object_embedded_in_prose_parses() {
        let reply = "The document appears genuine. {\"score\": 80, \"flags\": []} Let me know.";
        let value = interpret_reply(reply).unwrap();
        assert_eq!(read_f64(&value, "score"), Some(80.0));
    }

    #[test]
    fn nested_object_in_prose_parses() {
        let reply = r#"Result: {"fields": {"co2_value": 1200}, "ok": true} end"#;
        let value = interpret_reply(reply).unwrap();
        assert!(value.get("fields").is_some());
    }

    #[test]
    fn bare_array_is_rejected() {
        let err = interpret_reply(r#"[1, 2, 3]"#).unwrap_err();
        assert!(matches!(err, ValidationError::NoJson(_)));
    }

    #[test]
    fn prose_without_json_errors_with_preview() {
        let long_reply = "a".repeat(500);
        match interpret_reply(&long_reply) {
            Err(ValidationError::NoJson(preview)) => assert_eq!(preview.len(), 200),
            other => panic!("expected NoJson, got {other:?}"),
        }
    }

    #[test]
    fn bool_reader_tolerates_strings() {
        let value = serde_json::json!({"a": "Yes", "b": "false", "c": "maybe"});
        assert_eq!(read_bool(&value, "a"), Some(true));
        assert_eq!(read_bool(&value, "b"), Some(false));
        assert_eq!(read_bool(&value, "c"), None);
    }

    #[test]
    fn number_reader_tolerates_separators() {
        let value = serde_json::json!({"co2": "12,500.5", "n": 7});
        assert_eq!(read_f64(&value, "co2"), Some(12500.5));
        assert_eq!(read_f64(&value, "n"), Some(7.0));
    }

    #[test]
    fn string_reader_filters_placeholders() {
        let value = serde_json::json!({"a": "Bureau Veritas", "b": "null", "c": "  ", "d": "N/A"});
        assert_eq!(read_string(&value, "a").as_deref(), Some("Bureau Veritas"));
        assert_eq!(read_string(&value, "b"), None);
        assert_eq!(read_string(&value, "c"), None);
        assert_eq!(read_string(&value, "d"), None);
    }

    #[test]
    fn string_list_skips_non_strings() {
        let value = serde_json::json!({"flags": ["blurry seal", 42, "no signature"]});
        assert_eq!(
            read_string_list(&value, "flags"),
            vec!["blurry seal".to_string(), "no signature".to_string()]
        );
    }
}
